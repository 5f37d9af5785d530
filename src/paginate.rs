//! Measured slide pagination.
//!
//! Splits verse text into slides that fit the projection's available
//! height, preferring sentence boundaries:
//!
//! 1. Split the text into sentences ([`split_sentences`]).
//! 2. Accumulate sentences while the candidate slide still fits.
//! 3. When the next sentence would overflow, commit the slide.
//! 4. A sentence that overflows on its own is packed word by word.
//! 5. A trailing single short word is merged into the previous slide.
//!
//! If the layout cannot measure (not ready), pagination degrades to
//! [`simple_chunk_text`].

use crate::chunk::{char_len, simple_chunk_text, split_sentences};
use crate::config::ProjectionConfig;
use crate::layout::{Layout, LayoutError};

/// Knobs for [`paginate`].
#[derive(Debug, Clone, Copy)]
pub struct PaginationSettings {
    /// Character limit for the measurement-free fallback.
    pub fallback_limit: usize,
    /// A final one-word slide shorter than this is merged backwards.
    pub orphan_max_chars: usize,
}

impl Default for PaginationSettings {
    fn default() -> Self {
        Self {
            fallback_limit: 400,
            orphan_max_chars: 10,
        }
    }
}

impl From<&ProjectionConfig> for PaginationSettings {
    fn from(config: &ProjectionConfig) -> Self {
        Self {
            fallback_limit: config.chunk_limit,
            orphan_max_chars: config.orphan_max_chars,
        }
    }
}

/// Paginate `text` for `layout`. Always returns at least one slide.
pub fn paginate(text: &str, layout: &dyn Layout, settings: PaginationSettings) -> Vec<String> {
    match measure_and_chunk(text, layout, settings.orphan_max_chars) {
        Ok(slides) => slides,
        Err(e) => {
            tracing::debug!(error = %e, "falling back to character chunking");
            simple_chunk_text(text, settings.fallback_limit)
        }
    }
}

fn measure_and_chunk(
    text: &str,
    layout: &dyn Layout,
    orphan_max_chars: usize,
) -> Result<Vec<String>, LayoutError> {
    // Surface a not-ready layout before doing any work.
    layout.available_height()?;

    let mut slides: Vec<String> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let attempt = join(&current, &sentence);
        if layout.fits(&attempt)? {
            current = attempt;
            continue;
        }

        if !current.is_empty() {
            slides.push(std::mem::take(&mut current));
        }

        if layout.fits(&sentence)? {
            current = sentence;
        } else {
            slides.extend(pack_words(&sentence, layout)?);
        }
    }

    if !current.is_empty() {
        slides.push(current);
    }

    merge_orphan(&mut slides, orphan_max_chars);

    if slides.is_empty() {
        slides.push(String::new());
    }
    Ok(slides)
}

/// Greedy word packing for a sentence too tall for one slide.
fn pack_words(sentence: &str, layout: &dyn Layout) -> Result<Vec<String>, LayoutError> {
    let mut pages = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        let attempt = join(&current, word);
        if !current.is_empty() && !layout.fits(&attempt)? {
            pages.push(std::mem::take(&mut current));
            current = word.to_string();
        } else {
            current = attempt;
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }
    Ok(pages)
}

fn merge_orphan(slides: &mut Vec<String>, orphan_max_chars: usize) {
    if slides.len() < 2 {
        return;
    }
    let last = &slides[slides.len() - 1];
    let mut words = last.split_whitespace();
    let is_orphan = match (words.next(), words.next()) {
        (Some(word), None) => char_len(word) < orphan_max_chars,
        _ => false,
    };
    if is_orphan {
        if let Some(orphan) = slides.pop() {
            if let Some(prev) = slides.last_mut() {
                prev.push(' ');
                prev.push_str(orphan.trim());
            }
        }
    }
}

fn join(current: &str, next: &str) -> String {
    if current.is_empty() {
        next.to_string()
    } else {
        format!("{} {}", current, next)
    }
}
