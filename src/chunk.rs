//! Character-budget text chunking and sentence splitting.
//!
//! [`simple_chunk_text`] is the measurement-free pagination used while the
//! projection layout is not ready: it packs whole words into chunks of at
//! most `limit` characters. [`split_sentences`] produces the sentence-like
//! units the measured paginator accumulates.
//!
//! Lengths are counted in `char`s, not bytes, so accented and curly-quoted
//! text is budgeted the way it is displayed.

/// Closing characters that may trail sentence punctuation.
const CLOSERS: &[char] = &[']', ')', '\'', '"', '`', '\u{2019}', '\u{201d}'];

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Split text into word-aligned chunks of at most `limit` characters.
///
/// Returns `[text]` unchanged when it already fits. A single word longer
/// than `limit` is kept whole in its own chunk. Empty text yields `[""]`.
pub fn simple_chunk_text(text: &str, limit: usize) -> Vec<String> {
    if text.is_empty() {
        return vec![String::new()];
    }
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let would_be = if current.is_empty() {
            char_len(word)
        } else {
            char_len(&current) + 1 + char_len(word)
        };

        if would_be > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    if chunks.is_empty() {
        chunks.push(String::new());
    }
    chunks
}

/// Split text into trimmed sentence-like units.
///
/// A sentence ends at a run of `.`, `?` or `!`, plus any trailing closing
/// quotes or brackets, when followed by whitespace or the end of the text.
/// Text after the last terminator forms a final unit. Punctuation inside a
/// word (`3.14`, `a.m.x`) does not end a sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if !is_terminal(chars[i]) {
            i += 1;
            continue;
        }

        let mut end = i;
        while end < chars.len() && is_terminal(chars[end]) {
            end += 1;
        }
        while end < chars.len() && CLOSERS.contains(&chars[end]) {
            end += 1;
        }

        if end == chars.len() || chars[end].is_whitespace() {
            push_trimmed(&mut sentences, &chars[start..end]);
            start = end;
        }
        i = end;
    }

    if start < chars.len() {
        push_trimmed(&mut sentences, &chars[start..]);
    }
    sentences
}

fn push_trimmed(out: &mut Vec<String>, chars: &[char]) {
    let s: String = chars.iter().collect();
    let trimmed = s.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
