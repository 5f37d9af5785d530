//! Projection surface: slide state and its message loop.
//!
//! The surface owns the current verse payload, the slide set derived from
//! it, and the index of the slide on screen. Slides are recomputed when a
//! new payload arrives or the display is resized; the index is reset on a
//! new payload and clamped on resize, so it is always in bounds.

use tokio::sync::mpsc;

use crate::chunk::simple_chunk_text;
use crate::layout::{GridLayout, Layout};
use crate::models::VersePayload;
use crate::paginate::{paginate, PaginationSettings};
use crate::protocol::{Command, Frame, ProjectionEvent, ToProjection};

pub struct ProjectionSurface<L: Layout> {
    layout: L,
    settings: PaginationSettings,
    initial_limit: usize,
    payload: VersePayload,
    slides: Vec<String>,
    index: usize,
}

impl<L: Layout> ProjectionSurface<L> {
    pub fn new(layout: L, settings: PaginationSettings, initial_limit: usize) -> Self {
        Self {
            layout,
            settings,
            initial_limit,
            payload: VersePayload::default(),
            slides: vec![String::new()],
            index: 0,
        }
    }

    /// Shows a payload immediately with cheap character chunking.
    /// Follow with [`finish_update`](Self::finish_update) once the layout
    /// can be measured.
    pub fn begin_update(&mut self, payload: VersePayload) {
        self.slides = non_empty(simple_chunk_text(&payload.verse, self.initial_limit));
        self.payload = payload;
        self.index = 0;
    }

    /// Replaces the provisional slides with measured pagination.
    pub fn finish_update(&mut self) {
        self.slides = non_empty(paginate(&self.payload.verse, &self.layout, self.settings));
        self.index = 0;
    }

    pub fn apply_update(&mut self, payload: VersePayload) {
        self.begin_update(payload);
        self.finish_update();
    }

    /// Re-paginates for a new display size, clamping the slide index.
    pub fn resize(&mut self, layout: L) {
        self.layout = layout;
        self.slides = non_empty(paginate(&self.payload.verse, &self.layout, self.settings));
        self.index = self.index.min(self.slides.len() - 1);
    }

    /// Moves within the slide set. Returns `true` only if there was more
    /// than one slide and the current slide was not already the boundary
    /// in that direction.
    pub fn handle_command(&mut self, cmd: Command) -> bool {
        if self.slides.len() <= 1 {
            return false;
        }
        match cmd {
            Command::Next if self.index < self.slides.len() - 1 => {
                self.index += 1;
                true
            }
            Command::Prev if self.index > 0 => {
                self.index -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn slides(&self) -> &[String] {
        &self.slides
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current_slide(&self) -> &str {
        &self.slides[self.index]
    }

    pub fn frame(&self) -> Frame {
        let text = if self.payload.verse_number.is_empty() {
            self.current_slide().to_string()
        } else {
            format!("{}. {}", self.payload.verse_number, self.current_slide())
        };
        Frame {
            version: self.payload.version.clone(),
            reference: self.payload.reference.clone(),
            text,
            slide: self.index,
            slide_count: self.slides.len(),
        }
    }
}

fn non_empty(mut slides: Vec<String>) -> Vec<String> {
    if slides.is_empty() {
        slides.push(String::new());
    }
    slides
}

/// Runs the projection surface until it is closed or its inbox is dropped.
///
/// Every state change emits a [`ProjectionEvent::Frame`]; every command is
/// answered with exactly one [`ProjectionEvent::ProjectionReply`].
pub async fn run_projection(
    mut surface: ProjectionSurface<GridLayout>,
    mut inbox: mpsc::UnboundedReceiver<ToProjection>,
    events: mpsc::UnboundedSender<ProjectionEvent>,
) {
    tracing::debug!("projection surface started");

    while let Some(msg) = inbox.recv().await {
        match msg {
            ToProjection::VerseUpdate(payload) => {
                surface.begin_update(payload);
                let _ = events.send(ProjectionEvent::Frame(surface.frame()));
                // Measured pagination runs on the next turn of the loop,
                // after the provisional frame has gone out.
                tokio::task::yield_now().await;
                surface.finish_update();
                let _ = events.send(ProjectionEvent::Frame(surface.frame()));
            }
            ToProjection::ProjectionCommand(token) => {
                let handled = surface.handle_command(token.cmd);
                tracing::debug!(cmd = %token.cmd, seq = token.seq, handled, "projection command");
                let _ = events.send(ProjectionEvent::ProjectionReply { token, handled });
                if handled {
                    let _ = events.send(ProjectionEvent::Frame(surface.frame()));
                }
            }
            ToProjection::Resize(layout) => {
                surface.resize(layout);
                let _ = events.send(ProjectionEvent::Frame(surface.frame()));
            }
            ToProjection::Close => break,
        }
    }

    let _ = events.send(ProjectionEvent::Closed);
    tracing::debug!("projection surface closed");
}
