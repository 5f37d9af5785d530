//! Control surface state.
//!
//! [`ControlSurface`] is the operator side: the book list, the selected
//! passages, the version label, and the last verse shown. It loads book
//! data on demand (cached for the session, never mutated), builds verse
//! payloads, and talks to the projection only through the [`Hub`].
//!
//! Next/previous first ask the projection to move within its slides; only
//! when that is not handled does the control surface change verse.

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

use crate::hub::Hub;
use crate::library::BookStore;
use crate::models::{sorted_numeric, BookData, BookOption, Passage, VersePayload, VersePos};
use crate::navigation::{format_reference, resolve_chapter, selected_verses, target_verse, Step};
use crate::protocol::Command;

/// Outcome of a navigation action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The projection moved to another slide of the same verse.
    Slide,
    /// A new verse was sent.
    Verse(VersePayload),
    /// Nothing to show (no book selected, book missing, empty selection).
    Nothing,
}

pub struct ControlSurface<S: BookStore> {
    store: S,
    hub: Arc<Hub>,
    version: String,
    books: Vec<BookOption>,
    cache: HashMap<String, Arc<BookData>>,
    passages: Vec<Passage>,
    current_index: usize,
    current_pos: Option<VersePos>,
    verse: String,
}

impl<S: BookStore> ControlSurface<S> {
    pub fn new(store: S, hub: Arc<Hub>, version: impl Into<String>) -> Self {
        Self {
            store,
            hub,
            version: version.into(),
            books: Vec::new(),
            cache: HashMap::new(),
            passages: vec![Passage::default()],
            current_index: 0,
            current_pos: None,
            verse: String::new(),
        }
    }

    /// Loads the book list and seeds the first passage with the first book.
    pub async fn load_books(&mut self) -> Result<&[BookOption]> {
        self.books = self.store.list_books().await?;
        if let Some(first) = self.books.first() {
            if self.passages[0].book.is_empty() {
                self.passages[0].book = first.id.clone();
            }
        }
        tracing::info!(count = self.books.len(), "books loaded");
        Ok(&self.books)
    }

    /// Book data for `id`, read once per session.
    pub async fn ensure_book(&mut self, id: &str) -> Result<Option<Arc<BookData>>> {
        if id.is_empty() {
            return Ok(None);
        }
        if let Some(data) = self.cache.get(id) {
            return Ok(Some(data.clone()));
        }
        let Some(data) = self.store.read_book(id).await? else {
            return Ok(None);
        };
        let data = Arc::new(data);
        self.cache.insert(id.to_string(), data.clone());
        Ok(Some(data))
    }

    /// Picks a book for passage `idx`, resetting it to the book's first
    /// chapter and first verse.
    pub async fn select_book(&mut self, idx: usize, book_id: &str) -> Result<()> {
        self.check_index(idx)?;
        self.passages[idx].book = book_id.to_string();
        let Some(data) = self.ensure_book(book_id).await? else {
            return Ok(());
        };
        let chapter = sorted_numeric(data.keys()).into_iter().next().unwrap_or_default();
        let first_verse = first_verse(&data, &chapter);
        let passage = &mut self.passages[idx];
        passage.chapter = chapter;
        passage.verses = first_verse.into_iter().collect();
        Ok(())
    }

    /// Picks a chapter for passage `idx`, selecting its first verse.
    pub async fn select_chapter(&mut self, idx: usize, chapter: &str) -> Result<()> {
        self.check_index(idx)?;
        self.passages[idx].chapter = chapter.to_string();
        let book = self.passages[idx].book.clone();
        if let Some(data) = self.ensure_book(&book).await? {
            self.passages[idx].verses = first_verse(&data, chapter).into_iter().collect();
        }
        Ok(())
    }

    pub fn set_verses(&mut self, idx: usize, verses: Vec<String>) -> Result<()> {
        self.check_index(idx)?;
        self.passages[idx].verses = verses;
        Ok(())
    }

    /// Appends a copy of the first passage.
    pub fn add_passage(&mut self) -> usize {
        let passage = match self.passages.first() {
            Some(first) => first.clone(),
            None => Passage {
                book: self.books.first().map(|b| b.id.clone()).unwrap_or_default(),
                ..Passage::default()
            },
        };
        self.passages.push(passage);
        self.passages.len() - 1
    }

    /// Removes passage `idx`. The last remaining passage cannot be removed.
    pub fn remove_passage(&mut self, idx: usize) -> Result<()> {
        self.check_index(idx)?;
        if self.passages.len() == 1 {
            bail!("cannot remove the only passage");
        }
        self.passages.remove(idx);
        if self.current_index >= self.passages.len() {
            self.current_index = self.passages.len() - 1;
        }
        Ok(())
    }

    /// Makes passage `idx` the one navigation acts on.
    pub fn set_active(&mut self, idx: usize) -> Result<()> {
        self.check_index(idx)?;
        self.current_index = idx;
        Ok(())
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    /// Sends the current (or first) verse and opens the projection.
    pub async fn display_projection(&mut self) -> Result<Option<VersePayload>> {
        let payload = self.load_verse(Step::Stay).await?;
        if let Some(payload) = &payload {
            self.hub.open_projection(payload.clone());
        }
        Ok(payload)
    }

    pub async fn next_verse(&mut self) -> Result<Advance> {
        self.advance(Command::Next, Step::Next).await
    }

    pub async fn prev_verse(&mut self) -> Result<Advance> {
        self.advance(Command::Prev, Step::Prev).await
    }

    pub fn close_projection(&self) {
        self.hub.close_projection();
    }

    async fn advance(&mut self, cmd: Command, step: Step) -> Result<Advance> {
        if self.hub.send_command(cmd).await {
            return Ok(Advance::Slide);
        }
        Ok(match self.load_verse(step).await? {
            Some(payload) => {
                self.hub.send_verse(payload.clone());
                Advance::Verse(payload)
            }
            None => Advance::Nothing,
        })
    }

    /// Builds the payload for `step` and records it as the current verse.
    async fn load_verse(&mut self, step: Step) -> Result<Option<VersePayload>> {
        let Some(passage) = self.active_passage().cloned() else {
            return Ok(None);
        };
        let Some(data) = self.ensure_book(&passage.book).await? else {
            return Ok(None);
        };
        let Some(chapter) = resolve_chapter(&data, &passage) else {
            return Ok(None);
        };

        let selected = selected_verses(&data, &chapter, &passage);
        let Some(verse_num) = target_verse(&selected, &chapter, self.current_pos.as_ref(), step)
        else {
            return Ok(None);
        };
        let Some(text) = data.get(&chapter).and_then(|c| c.get(&verse_num)) else {
            tracing::warn!(book = %passage.book, %chapter, verse = %verse_num, "verse not found");
            return Ok(None);
        };

        let payload = VersePayload {
            verse: text.clone(),
            version: self.version.clone(),
            reference: format_reference(self.book_label(&passage.book), &passage, &chapter, &verse_num),
            verse_number: verse_num.clone(),
        };

        self.verse = text.clone();
        self.current_pos = Some(VersePos {
            chapter,
            verse: verse_num,
        });
        Ok(Some(payload))
    }

    fn active_passage(&self) -> Option<&Passage> {
        self.passages
            .get(self.current_index)
            .or_else(|| self.passages.first())
            .filter(|p| !p.book.is_empty())
    }

    fn book_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.books
            .iter()
            .find(|b| b.id == id)
            .map(|b| b.label.as_str())
            .unwrap_or(id)
    }

    fn check_index(&self, idx: usize) -> Result<()> {
        if idx >= self.passages.len() {
            bail!("no passage at index {} ({} passages)", idx, self.passages.len());
        }
        Ok(())
    }

    pub fn books(&self) -> &[BookOption] {
        &self.books
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn current_pos(&self) -> Option<&VersePos> {
        self.current_pos.as_ref()
    }

    /// Text of the verse last sent.
    pub fn verse(&self) -> &str {
        &self.verse
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

fn first_verse(data: &BookData, chapter: &str) -> Option<String> {
    data.get(chapter)
        .and_then(|verses| sorted_numeric(verses.keys()).into_iter().next())
}
