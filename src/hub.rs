//! Hub between the control surface and the projection surface.
//!
//! The hub owns the projection's lifecycle and is the only path between
//! the two surfaces:
//!
//! ```text
//! ┌─────────────┐  verse-update / command   ┌─────┐   ToProjection    ┌────────────┐
//! │   Control   │ ────────────────────────▶ │ Hub │ ────────────────▶ │ Projection │
//! │   surface   │ ◀──── handled: bool ───── │     │ ◀──────────────── │  surface   │
//! └─────────────┘                           └──┬──┘  ProjectionEvent  └────────────┘
//!                                              │ frames
//!                                              ▼
//!                                           display
//! ```
//!
//! `send_command` is a request with a single boolean reply. At most one
//! command is outstanding: issuing another cancels the earlier wait. A
//! reply whose token does not match the pending request is dropped. When
//! the projection is closed, slow, or gone, the answer is `false`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::config::ProjectionConfig;
use crate::layout::GridLayout;
use crate::models::VersePayload;
use crate::paginate::PaginationSettings;
use crate::projection::{run_projection, ProjectionSurface};
use crate::protocol::{Command, CommandToken, Frame, ProjectionEvent, ToProjection};

struct Pending {
    token: CommandToken,
    reply: oneshot::Sender<bool>,
}

/// The single outstanding command wait, shared with the event pump.
#[derive(Clone, Default)]
struct ReplySlot(Arc<Mutex<Option<Pending>>>);

impl ReplySlot {
    /// Registers a new wait. Any earlier wait is dropped, which resolves it
    /// as not handled.
    fn arm(&self, token: CommandToken) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(Pending { token, reply: tx }) {
            tracing::debug!(seq = previous.token.seq, "superseded pending projection command");
        }
        rx
    }

    /// Resolves the pending wait if `token` matches it.
    fn resolve(&self, token: CommandToken, handled: bool) -> bool {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        match slot.as_ref() {
            Some(pending) if pending.token == token => {}
            _ => {
                tracing::debug!(seq = token.seq, cmd = %token.cmd, "ignoring stale projection reply");
                return false;
            }
        }
        if let Some(pending) = slot.take() {
            let _ = pending.reply.send(handled);
        }
        true
    }

    /// Drops any pending wait, resolving it as not handled.
    fn clear(&self) {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(pending) = slot.take() {
            tracing::debug!(seq = pending.token.seq, "pending projection command dropped on close");
        }
    }

    /// Clears the slot if it still holds `token`.
    fn disarm(&self, token: CommandToken) {
        let mut slot = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if slot.as_ref().is_some_and(|p| p.token == token) {
            slot.take();
        }
    }
}

/// Where a projection surface's messages go.
struct ProjectionLink {
    tx: mpsc::UnboundedSender<ToProjection>,
}

impl ProjectionLink {
    fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Channel ends handed to a projection surface by [`Hub::connect`].
pub struct ProjectionEndpoint {
    pub inbox: mpsc::UnboundedReceiver<ToProjection>,
    pub events: mpsc::UnboundedSender<ProjectionEvent>,
}

pub struct Hub {
    projection: Mutex<Option<ProjectionLink>>,
    pending: ReplySlot,
    seq: AtomicU64,
    reply_timeout: Duration,
    layout: Mutex<GridLayout>,
    settings: PaginationSettings,
    initial_limit: usize,
    frames: Option<mpsc::UnboundedSender<Frame>>,
}

impl Hub {
    /// `frames` receives everything the projection displays; pass `None`
    /// to discard it.
    pub fn new(config: &ProjectionConfig, frames: Option<mpsc::UnboundedSender<Frame>>) -> Self {
        Self {
            projection: Mutex::new(None),
            pending: ReplySlot::default(),
            seq: AtomicU64::new(0),
            reply_timeout: config.reply_timeout(),
            layout: Mutex::new(GridLayout::new(config.cols, config.rows)),
            settings: PaginationSettings::from(config),
            initial_limit: config.initial_chunk_limit,
            frames,
        }
    }

    pub fn reply_timeout(&self) -> Duration {
        self.reply_timeout
    }

    pub fn is_projection_open(&self) -> bool {
        self.link_sender().is_some()
    }

    /// Attaches a projection surface and returns its channel ends, replacing
    /// any surface already attached. The hub routes the surface's replies
    /// and frames until it closes.
    pub fn connect(&self) -> ProjectionEndpoint {
        let (tx, inbox) = mpsc::unbounded_channel();
        let (events, events_rx) = mpsc::unbounded_channel();

        let previous = self
            .projection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(ProjectionLink { tx });
        if let Some(previous) = previous {
            let _ = previous.tx.send(ToProjection::Close);
        }

        tokio::spawn(pump_events(events_rx, self.pending.clone(), self.frames.clone()));

        ProjectionEndpoint { inbox, events }
    }

    /// `open-projection`: starts the projection surface if needed, then
    /// delivers `payload` to it.
    pub fn open_projection(&self, payload: VersePayload) {
        if !self.is_projection_open() {
            let layout = *self.layout.lock().unwrap_or_else(|e| e.into_inner());
            let surface = ProjectionSurface::new(layout, self.settings, self.initial_limit);
            let endpoint = self.connect();
            tokio::spawn(run_projection(surface, endpoint.inbox, endpoint.events));
            tracing::info!(cols = layout.cols, rows = layout.rows, "projection opened");
        }
        self.send_verse(payload);
    }

    /// `close-projection`. A no-op when nothing is open. A command still
    /// waiting for its reply resolves as not handled.
    pub fn close_projection(&self) {
        let link = self
            .projection
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(link) = link {
            self.pending.clear();
            let _ = link.tx.send(ToProjection::Close);
            tracing::info!("projection closed");
        }
    }

    /// `verse-update`: fire-and-forget, dropped when no projection is open.
    pub fn send_verse(&self, payload: VersePayload) {
        if let Some(tx) = self.link_sender() {
            let _ = tx.send(ToProjection::VerseUpdate(payload));
        }
    }

    /// Tells the projection its display region changed. The size is kept
    /// for projections opened later.
    pub fn resize(&self, layout: GridLayout) {
        *self.layout.lock().unwrap_or_else(|e| e.into_inner()) = layout;
        if let Some(tx) = self.link_sender() {
            let _ = tx.send(ToProjection::Resize(layout));
        }
    }

    /// `projection-command`: asks the projection to handle `cmd` and waits
    /// for its answer, at most `reply_timeout`. Anything other than a
    /// matching reply is `false`.
    pub async fn send_command(&self, cmd: Command) -> bool {
        let Some(tx) = self.link_sender() else {
            return false;
        };

        let token = CommandToken {
            seq: self.seq.fetch_add(1, Ordering::Relaxed) + 1,
            cmd,
        };
        let reply = self.pending.arm(token);

        if tx.send(ToProjection::ProjectionCommand(token)).is_err() {
            self.pending.disarm(token);
            return false;
        }

        let handled = match tokio::time::timeout(self.reply_timeout, reply).await {
            Ok(Ok(handled)) => handled,
            Ok(Err(_)) => {
                tracing::debug!(seq = token.seq, "projection command cancelled");
                false
            }
            Err(_) => {
                tracing::warn!(
                    seq = token.seq,
                    cmd = %cmd,
                    timeout_ms = self.reply_timeout.as_millis() as u64,
                    "projection did not reply in time"
                );
                false
            }
        };
        self.pending.disarm(token);
        handled
    }

    fn link_sender(&self) -> Option<mpsc::UnboundedSender<ToProjection>> {
        let mut guard = self.projection.lock().unwrap_or_else(|e| e.into_inner());
        match guard.as_ref() {
            Some(link) if link.is_open() => Some(link.tx.clone()),
            Some(_) => {
                guard.take();
                None
            }
            None => None,
        }
    }
}

async fn pump_events(
    mut events: mpsc::UnboundedReceiver<ProjectionEvent>,
    pending: ReplySlot,
    frames: Option<mpsc::UnboundedSender<Frame>>,
) {
    while let Some(event) = events.recv().await {
        match event {
            ProjectionEvent::ProjectionReply { token, handled } => {
                pending.resolve(token, handled);
            }
            ProjectionEvent::Frame(frame) => {
                if let Some(frames) = &frames {
                    let _ = frames.send(frame);
                }
            }
            ProjectionEvent::Closed => break,
        }
    }
}
