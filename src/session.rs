//! Interactive projection session (`vp project`).
//!
//! Wires the file-backed library, the control surface, the hub, and a
//! projection surface together, reads operator commands from stdin, and
//! prints every projected frame to stdout.
//!
//! | Input | Action |
//! |-------|--------|
//! | `n` | next slide or verse |
//! | `p` | previous slide or verse |
//! | `s` | (re)display the current verse |
//! | `r COLSxROWS` | resize the projection |
//! | `v LABEL` | change the version label |
//! | `c` | close the projection |
//! | `q` | quit |

use anyhow::{bail, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::Config;
use crate::control::{Advance, ControlSurface};
use crate::hub::Hub;
use crate::layout::GridLayout;
use crate::library::{BookStore, FsLibrary};
use crate::models::BookOption;
use crate::protocol::Frame;

/// One parsed line of operator input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Next,
    Prev,
    Show,
    Resize(GridLayout),
    Version(String),
    Close,
    Quit,
}

pub fn parse_input(line: &str) -> Result<Option<Input>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((head, rest)) => (head, rest.trim()),
        None => (line, ""),
    };
    let input = match head {
        "n" | "next" => Input::Next,
        "p" | "prev" => Input::Prev,
        "s" | "show" => Input::Show,
        "c" | "close" => Input::Close,
        "q" | "quit" => Input::Quit,
        "r" | "resize" => Input::Resize(rest.parse().map_err(anyhow::Error::msg)?),
        "v" | "version" if !rest.is_empty() => Input::Version(rest.to_string()),
        _ => bail!("unknown input: '{}'", line),
    };
    Ok(Some(input))
}

/// Options for [`run_project`].
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    pub book: String,
    pub chapter: Option<String>,
    pub verses: Vec<String>,
    pub version: Option<String>,
}

pub async fn run_project(config: &Config, options: ProjectOptions) -> Result<()> {
    let library = FsLibrary::new(&config.library)?;
    let books = library.list_books().await?;
    let Some(book) = find_book(&books, &options.book) else {
        bail!(
            "Unknown book: '{}'. Run `vp books` to list available books.",
            options.book
        );
    };
    let book_id = book.id.clone();

    let (frames_tx, frames_rx) = mpsc::unbounded_channel();
    let hub = Arc::new(Hub::new(&config.projection, Some(frames_tx)));
    let printer = tokio::spawn(print_frames(frames_rx));

    let version = resolve_version(config, options.version.as_deref())?;
    let mut control = ControlSurface::new(library, hub.clone(), version);
    control.load_books().await?;
    control.select_book(0, &book_id).await?;
    if let Some(chapter) = &options.chapter {
        control.select_chapter(0, chapter).await?;
    }
    if !options.verses.is_empty() {
        control.set_verses(0, options.verses.clone())?;
    }

    if control.display_projection().await?.is_none() {
        bail!("Nothing to display for '{}'", options.book);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let input = match parse_input(&line) {
            Ok(Some(input)) => input,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };

        match input {
            Input::Next => report(control.next_verse().await?),
            Input::Prev => report(control.prev_verse().await?),
            Input::Show => {
                control.display_projection().await?;
            }
            Input::Resize(layout) => hub.resize(layout),
            Input::Version(label) => {
                if let Err(e) = config.control.check_version(&label) {
                    eprintln!("{}", e);
                    continue;
                }
                control.set_version(label);
                control.display_projection().await?;
            }
            Input::Close => control.close_projection(),
            Input::Quit => break,
        }
    }

    control.close_projection();
    drop(control);
    drop(hub);
    let _ = printer.await;
    Ok(())
}

/// The requested version label, or the configured default. Either must be
/// one of `control.versions`.
fn resolve_version(config: &Config, requested: Option<&str>) -> Result<String> {
    let version = requested.unwrap_or(&config.control.version);
    config.control.check_version(version)?;
    Ok(version.to_string())
}

fn find_book<'a>(books: &'a [BookOption], query: &str) -> Option<&'a BookOption> {
    books
        .iter()
        .find(|b| b.id == query)
        .or_else(|| books.iter().find(|b| b.label.eq_ignore_ascii_case(query)))
}

fn report(advance: Advance) {
    if let Advance::Verse(payload) = advance {
        tracing::debug!(reference = %payload.reference, "verse changed");
    }
}

async fn print_frames(mut frames: mpsc::UnboundedReceiver<Frame>) {
    while let Some(frame) = frames.recv().await {
        println!("────────────────────────────────────────");
        print!("{}", frame);
    }
}
