//! Display measurement for the projection surface.
//!
//! The paginator never looks at pixels directly; it asks a [`Layout`] how
//! much height is available and how tall a candidate string would render.
//! [`GridLayout`] is a fixed-cell text grid that wraps words the way a
//! block with `white-space: normal` does.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunk::char_len;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The display region has no usable size yet.
    #[error("layout not ready ({cols}x{rows})")]
    NotReady { cols: usize, rows: usize },
}

/// Measures text against a bounded display region.
pub trait Layout: Send {
    /// Height available for slide text.
    fn available_height(&self) -> Result<usize, LayoutError>;

    /// Height `text` would occupy when rendered. Empty text still occupies
    /// one line.
    fn measure(&self, text: &str) -> Result<usize, LayoutError>;

    fn fits(&self, text: &str) -> Result<bool, LayoutError> {
        Ok(self.measure(text)? <= self.available_height()?)
    }
}

/// A monospace grid: `cols` cells per line, `rows` lines, each
/// `line_height` units tall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
    #[serde(default = "default_line_height")]
    pub line_height: usize,
}

fn default_line_height() -> usize {
    1
}

impl GridLayout {
    pub fn new(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            line_height: 1,
        }
    }

    fn ready(&self) -> Result<(), LayoutError> {
        if self.cols == 0 || self.rows == 0 || self.line_height == 0 {
            return Err(LayoutError::NotReady {
                cols: self.cols,
                rows: self.rows,
            });
        }
        Ok(())
    }

    /// Number of lines `text` wraps to. Words longer than a line are
    /// broken across as many lines as they need.
    pub fn wrapped_lines(&self, text: &str) -> usize {
        let mut lines = 0;
        let mut used = 0;

        for word in text.split_whitespace() {
            let len = char_len(word);
            if used > 0 && used + 1 + len <= self.cols {
                used += 1 + len;
                continue;
            }
            if used > 0 {
                lines += 1;
            }
            if len > self.cols {
                lines += (len - 1) / self.cols;
                used = len - ((len - 1) / self.cols) * self.cols;
            } else {
                used = len;
            }
        }

        lines + 1
    }
}

impl std::str::FromStr for GridLayout {
    type Err = String;

    /// Parses `COLSxROWS`, e.g. `60x12`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (cols, rows) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("invalid size '{}', expected COLSxROWS", s))?;
        let cols = cols
            .trim()
            .parse()
            .map_err(|_| format!("invalid column count in '{}'", s))?;
        let rows = rows
            .trim()
            .parse()
            .map_err(|_| format!("invalid row count in '{}'", s))?;
        Ok(Self::new(cols, rows))
    }
}

impl Layout for GridLayout {
    fn available_height(&self) -> Result<usize, LayoutError> {
        self.ready()?;
        Ok(self.rows * self.line_height)
    }

    fn measure(&self, text: &str) -> Result<usize, LayoutError> {
        self.ready()?;
        Ok(self.wrapped_lines(text) * self.line_height)
    }
}
