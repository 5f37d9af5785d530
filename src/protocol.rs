//! Message vocabulary between the control surface, the hub, and the
//! projection surface.
//!
//! | Message | Direction | Kind |
//! |---------|-----------|------|
//! | `verse-update(payload)` | control → projection | fire-and-forget |
//! | `projection-command(token)` | control → projection | request, one boolean reply |
//! | `projection-reply(token, handled)` | projection → control | fire-and-forget |
//! | `resize(layout)` | host → projection | fire-and-forget |
//! | `close` | hub → projection | lifecycle |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::layout::GridLayout;
use crate::models::VersePayload;

/// A navigation command the projection may handle within its own slides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Next,
    Prev,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Next => "next",
            Command::Prev => "prev",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next" => Ok(Command::Next),
            "prev" => Ok(Command::Prev),
            other => Err(format!("unknown projection command: '{}'", other)),
        }
    }
}

/// Correlates a command with its reply. The sequence number keeps a late
/// reply to an earlier request from resolving a newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandToken {
    pub seq: u64,
    pub cmd: Command,
}

/// Messages delivered to the projection surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ToProjection {
    VerseUpdate(VersePayload),
    ProjectionCommand(CommandToken),
    Resize(GridLayout),
    Close,
}

/// Messages emitted by the projection surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ProjectionEvent {
    ProjectionReply { token: CommandToken, handled: bool },
    Frame(Frame),
    Closed,
}

/// What the projection currently shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    pub version: String,
    pub reference: String,
    /// Slide text, prefixed with `"<verse number>. "` when known.
    pub text: String,
    /// Zero-based slide index.
    pub slide: usize,
    pub slide_count: usize,
}

impl Frame {
    /// `Slide i / n`, only when there is more than one slide.
    pub fn indicator(&self) -> Option<String> {
        if self.slide_count > 1 {
            Some(format!("Slide {} / {}", self.slide + 1, self.slide_count))
        } else {
            None
        }
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.version.is_empty() {
            writeln!(f, "{}", self.version)?;
        }
        if !self.reference.is_empty() {
            writeln!(f, "{}", self.reference)?;
        }
        writeln!(f, "{}", self.text)?;
        if let Some(indicator) = self.indicator() {
            writeln!(f, "{}", indicator)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_tokens() {
        assert_eq!("next".parse::<Command>().unwrap(), Command::Next);
        assert_eq!(Command::Prev.to_string(), "prev");
        assert!("skip".parse::<Command>().is_err());
        assert_eq!(serde_json::to_string(&Command::Next).unwrap(), "\"next\"");
    }

    #[test]
    fn test_message_tagging() {
        let msg = ToProjection::ProjectionCommand(CommandToken {
            seq: 3,
            cmd: Command::Prev,
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "projection-command");
        assert_eq!(json["cmd"], "prev");

        let close: ToProjection = serde_json::from_str(r#"{"type":"close"}"#).unwrap();
        assert_eq!(close, ToProjection::Close);
    }

    #[test]
    fn test_indicator_only_for_multiple_slides() {
        let mut frame = Frame {
            slide_count: 1,
            ..Frame::default()
        };
        assert!(frame.indicator().is_none());
        frame.slide_count = 3;
        frame.slide = 1;
        assert_eq!(frame.indicator().as_deref(), Some("Slide 2 / 3"));
    }
}
