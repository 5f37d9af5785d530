//! Core data models shared by the control surface, the projection surface,
//! the book store, and the importer.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Which half of the library a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Testament {
    /// Old testament (`taloha`).
    Taloha,
    /// New testament (`vaovao`).
    Vaovao,
}

impl Testament {
    pub fn as_str(&self) -> &'static str {
        match self {
            Testament::Taloha => "taloha",
            Testament::Vaovao => "vaovao",
        }
    }

    /// Label stored in the `books.testament` column.
    pub fn db_label(&self) -> &'static str {
        match self {
            Testament::Taloha => "old",
            Testament::Vaovao => "new",
        }
    }
}

impl fmt::Display for Testament {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An entry in the book picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookOption {
    /// Path of the book file relative to the library root.
    pub id: String,
    pub label: String,
    pub testament: Testament,
}

/// Chapter identifier → (verse identifier → verse text).
///
/// Keys are kept as the strings found on disk; use [`numeric_order`] when
/// presenting them.
pub type BookData = BTreeMap<String, BTreeMap<String, String>>;

/// Optional `meta` block found at the top of book files.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BookMeta {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub order: Option<i64>,
    #[serde(default)]
    pub chapter_number: Option<i64>,
}

/// An operator-selected book, chapter, and set of verses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub book: String,
    pub chapter: String,
    pub verses: Vec<String>,
}

/// The verse last shown by the control surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersePos {
    pub chapter: String,
    pub verse: String,
}

/// Payload of a `verse-update` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersePayload {
    pub verse: String,
    pub version: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub verse_number: String,
}

/// Orders chapter/verse identifiers numerically; non-numeric identifiers
/// sort after numeric ones, lexically among themselves.
pub fn numeric_order(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<u64>(), b.trim().parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Returns the identifiers sorted with [`numeric_order`].
pub fn sorted_numeric<'a, I>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut out: Vec<String> = ids.into_iter().cloned().collect();
    out.sort_by(|a, b| numeric_order(a, b));
    out
}
