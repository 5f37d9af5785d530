//! Passage navigation.
//!
//! Pure functions that decide which verse the control surface shows next.
//! Verse and chapter identifiers are ordered numerically; both directions
//! wrap around the selected-verse set.

use crate::models::{sorted_numeric, BookData, Passage, VersePos};

/// What the control surface is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Re-show the current verse, or the first one if there is none.
    Stay,
    Next,
    Prev,
}

/// The passage's chapter when the book has it, otherwise the book's first
/// chapter.
pub fn resolve_chapter(data: &BookData, passage: &Passage) -> Option<String> {
    if !passage.chapter.is_empty() && data.contains_key(&passage.chapter) {
        return Some(passage.chapter.clone());
    }
    sorted_numeric(data.keys()).into_iter().next()
}

/// The passage's verses in numeric order, or every verse of `chapter` when
/// none are selected.
pub fn selected_verses(data: &BookData, chapter: &str, passage: &Passage) -> Vec<String> {
    if !passage.verses.is_empty() {
        let mut verses = sorted_numeric(&passage.verses);
        verses.dedup();
        return verses;
    }
    data.get(chapter)
        .map(|verses| sorted_numeric(verses.keys()))
        .unwrap_or_default()
}

/// Picks the verse to show for `step`, given the last shown position.
///
/// A position counts only if it is in `chapter` and among `selected`.
/// Without one, `Stay`/`Next` start at the first selected verse and `Prev`
/// at the last. With one, `Next` and `Prev` move one step and wrap.
pub fn target_verse(
    selected: &[String],
    chapter: &str,
    pos: Option<&VersePos>,
    step: Step,
) -> Option<String> {
    let first = selected.first()?;
    let last = selected.last()?;

    let index = pos
        .filter(|p| p.chapter == chapter)
        .and_then(|p| selected.iter().position(|v| *v == p.verse));

    let Some(index) = index else {
        return Some(match step {
            Step::Stay | Step::Next => first.clone(),
            Step::Prev => last.clone(),
        });
    };

    let target = match step {
        Step::Stay => index,
        Step::Next => (index + 1) % selected.len(),
        Step::Prev => (index + selected.len() - 1) % selected.len(),
    };
    Some(selected[target].clone())
}

/// `"<label> <chapter>[:<v1>,<v2>...]:<verse>"`.
pub fn format_reference(book_label: &str, passage: &Passage, chapter: &str, verse: &str) -> String {
    let verses_part = if passage.verses.is_empty() {
        String::new()
    } else {
        format!(":{}", passage.verses.join(","))
    };
    format!("{} {}{}:{}", book_label, chapter, verses_part, verse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn book() -> BookData {
        let mut data = BookData::new();
        for chapter in ["1", "2", "10"] {
            let verses: BTreeMap<String, String> = (1..=12)
                .map(|v| (v.to_string(), format!("{}:{} text", chapter, v)))
                .collect();
            data.insert(chapter.to_string(), verses);
        }
        data
    }

    fn passage(chapter: &str, verses: &[&str]) -> Passage {
        Passage {
            book: "jaona".to_string(),
            chapter: chapter.to_string(),
            verses: verses.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn pos(chapter: &str, verse: &str) -> VersePos {
        VersePos {
            chapter: chapter.to_string(),
            verse: verse.to_string(),
        }
    }

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_chapter_falls_back_numerically() {
        let data = book();
        assert_eq!(resolve_chapter(&data, &passage("2", &[])).as_deref(), Some("2"));
        assert_eq!(resolve_chapter(&data, &passage("99", &[])).as_deref(), Some("1"));
        assert_eq!(resolve_chapter(&data, &passage("", &[])).as_deref(), Some("1"));
        assert_eq!(resolve_chapter(&BookData::new(), &passage("1", &[])), None);
    }

    #[test]
    fn test_selected_verses_numeric_order() {
        let data = book();
        assert_eq!(
            selected_verses(&data, "1", &passage("1", &["10", "2", "9"])),
            ids(&["2", "9", "10"])
        );
        let all = selected_verses(&data, "1", &passage("1", &[]));
        assert_eq!(all.len(), 12);
        assert_eq!(all[1], "2");
        assert_eq!(all[11], "12");
    }

    #[test]
    fn test_next_without_position_starts_first() {
        let selected = ids(&["3", "5", "8"]);
        assert_eq!(target_verse(&selected, "1", None, Step::Next).as_deref(), Some("3"));
        assert_eq!(target_verse(&selected, "1", None, Step::Stay).as_deref(), Some("3"));
    }

    #[test]
    fn test_prev_without_valid_position_lands_last() {
        let selected = ids(&["3", "5", "8"]);
        assert_eq!(target_verse(&selected, "1", None, Step::Prev).as_deref(), Some("8"));
        // Position in another chapter is not valid.
        let other = pos("2", "5");
        assert_eq!(
            target_verse(&selected, "1", Some(&other), Step::Prev).as_deref(),
            Some("8")
        );
        // Position outside the selection is not valid either.
        let stray = pos("1", "4");
        assert_eq!(
            target_verse(&selected, "1", Some(&stray), Step::Prev).as_deref(),
            Some("8")
        );
    }

    #[test]
    fn test_prev_from_first_wraps_to_last() {
        let selected = ids(&["3", "5", "8"]);
        let first = pos("1", "3");
        assert_eq!(
            target_verse(&selected, "1", Some(&first), Step::Prev).as_deref(),
            Some("8")
        );
    }

    #[test]
    fn test_stay_keeps_valid_position() {
        let selected = ids(&["3", "5", "8"]);
        let current = pos("1", "5");
        assert_eq!(
            target_verse(&selected, "1", Some(&current), Step::Stay).as_deref(),
            Some("5")
        );
    }

    #[test]
    fn test_next_is_cyclic_from_every_start() {
        let selected = ids(&["1", "2", "7", "10", "11"]);
        for start in &selected {
            let mut current = pos("4", start);
            let mut seen_first = false;
            for _ in 0..selected.len() {
                let next = target_verse(&selected, "4", Some(&current), Step::Next).unwrap();
                if next == selected[0] {
                    seen_first = true;
                }
                current = pos("4", &next);
            }
            assert!(seen_first, "never revisited first verse from {}", start);
            assert_eq!(&current.verse, start, "cycle length differs from selection size");
        }
    }

    #[test]
    fn test_empty_selection() {
        assert_eq!(target_verse(&[], "1", None, Step::Next), None);
    }

    #[test]
    fn test_format_reference() {
        assert_eq!(
            format_reference("Jaona", &passage("3", &["16", "17"]), "3", "16"),
            "Jaona 3:16,17:16"
        );
        assert_eq!(format_reference("Jaona", &passage("3", &[]), "3", "1"), "Jaona 3:1");
    }
}
