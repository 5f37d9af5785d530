//! File-backed book store.
//!
//! Books live on disk as one JSON file per book, grouped into two testament
//! directories under the library root:
//!
//! ```text
//! <root>/
//! ├── Testameta taloha/
//! │   ├── genesisy.json
//! │   └── eksodosy.json
//! └── Testameta vaovao/
//!     └── matio.json
//! ```
//!
//! Each file maps chapter → verse → text, with an optional `meta` object:
//!
//! ```json
//! { "meta": { "name": "Genesisy", "order": 1, "chapter_number": 50 },
//!   "1": { "1": "Tamin'ny voalohany ...", "2": "..." } }
//! ```
//!
//! The store answers the `list-books` and `read-book` requests. Missing or
//! malformed files are logged and reported as absent.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::models::{BookData, BookMeta, BookOption, Testament};

/// Data-access seam used by the control surface.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// All books, old testament first.
    async fn list_books(&self) -> Result<Vec<BookOption>>;

    /// Chapter/verse text for a book, or `None` when it cannot be loaded.
    async fn read_book(&self, id: &str) -> Result<Option<BookData>>;
}

/// Book store reading JSON files from the library root.
pub struct FsLibrary {
    root: PathBuf,
    testaments: Vec<(String, Testament)>,
    include: GlobSet,
}

impl FsLibrary {
    pub fn new(config: &LibraryConfig) -> Result<Self> {
        Ok(Self {
            root: config.root.clone(),
            testaments: vec![
                (config.old_testament_dir.clone(), Testament::Taloha),
                (config.new_testament_dir.clone(), Testament::Vaovao),
            ],
            include: build_globset(&config.include_globs)?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn list_testament(&self, dir_name: &str, testament: Testament) -> Result<Vec<BookOption>> {
        let dir = self.root.join(dir_name);
        if !dir.is_dir() {
            tracing::debug!(dir = %dir.display(), "testament directory missing");
            return Ok(Vec::new());
        }

        let mut books = Vec::new();
        for path in book_files(&dir, &self.include)? {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            books.push(BookOption {
                id: format!("{}/{}", dir_name, file_name),
                label: label_from_file_name(&file_name),
                testament,
            });
        }
        Ok(books)
    }

    /// Resolves a book id to a path inside the root, rejecting ids that
    /// would escape it.
    fn resolve(&self, id: &str) -> Option<PathBuf> {
        let relative = Path::new(id);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if id.is_empty() || escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl BookStore for FsLibrary {
    async fn list_books(&self) -> Result<Vec<BookOption>> {
        let mut books = Vec::new();
        for (dir_name, testament) in &self.testaments {
            books.extend(self.list_testament(dir_name, *testament)?);
        }
        Ok(books)
    }

    async fn read_book(&self, id: &str) -> Result<Option<BookData>> {
        let Some(path) = self.resolve(id) else {
            tracing::warn!(book = id, "rejected book id outside the library root");
            return Ok(None);
        };
        if !path.is_file() {
            tracing::warn!(book = id, path = %path.display(), "book file not found");
            return Ok(None);
        }

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(book = id, error = %e, "failed to read book file");
                return Ok(None);
            }
        };

        match parse_book(&raw) {
            Ok(book) => Ok(Some(book.chapters)),
            Err(e) => {
                tracing::warn!(book = id, error = %e, "malformed book file");
                Ok(None)
            }
        }
    }
}

/// In-memory book store, handy for embedding and tests.
#[derive(Default)]
pub struct MemoryLibrary {
    books: Vec<BookOption>,
    data: HashMap<String, BookData>,
}

impl MemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, option: BookOption, data: BookData) {
        self.data.insert(option.id.clone(), data);
        self.books.push(option);
    }
}

#[async_trait]
impl BookStore for MemoryLibrary {
    async fn list_books(&self) -> Result<Vec<BookOption>> {
        Ok(self.books.clone())
    }

    async fn read_book(&self, id: &str) -> Result<Option<BookData>> {
        Ok(self.data.get(id).cloned())
    }
}

/// A parsed book file.
#[derive(Debug, Clone)]
pub struct ParsedBook {
    pub meta: Option<BookMeta>,
    pub chapters: BookData,
}

/// Parses the JSON body of a book file, separating `meta` from chapters.
pub fn parse_book(raw: &str) -> Result<ParsedBook> {
    let value: serde_json::Value =
        serde_json::from_str(raw).context("book file is not valid JSON")?;
    let serde_json::Value::Object(map) = value else {
        bail!("book file must be a JSON object");
    };

    let mut meta = None;
    let mut chapters = BookData::new();
    for (key, value) in map {
        if key == "meta" {
            meta = Some(serde_json::from_value(value).context("invalid meta block")?);
            continue;
        }
        let verses: BTreeMap<String, String> = serde_json::from_value(value)
            .with_context(|| format!("chapter {} must map verse numbers to text", key))?;
        chapters.insert(key, verses);
    }

    Ok(ParsedBook { meta, chapters })
}

/// `genesisy.json` → `Genesisy`, `1-samoela.json` → `1 Samoela`.
pub fn label_from_file_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".json").unwrap_or(file_name);
    stem.replace('-', " ")
        .split(' ')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Files directly inside `dir` whose names match `include`, sorted by name.
pub fn book_files(dir: &Path, include: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if include.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
