//! Trajectory file I/O.
//!
//! Plain-text trajectory files hold one pose per line, tokens separated by
//! whitespace or a single delimiter character. Blank lines and lines starting
//! with `#` are ignored on input.

use crate::error::TrajectoryError;
use std::fmt;
use std::str::FromStr;

pub mod calibration;
pub mod reader;
pub mod writer;

pub use calibration::load_extrinsic;
pub use reader::TrajectoryReader;
pub use writer::{OutputFormat, TrajectoryWriter};

/// Token separator for trajectory rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Delimiter {
    /// Any run of whitespace
    #[default]
    Whitespace,
    /// A single character; tokens are trimmed after splitting
    Char(char),
}

impl Delimiter {
    /// Split a line into tokens.
    pub fn split<'a>(&self, line: &'a str) -> Vec<&'a str> {
        match *self {
            Delimiter::Whitespace => line.split_whitespace().collect(),
            Delimiter::Char(c) => line.split(c).map(str::trim).collect(),
        }
    }

    /// Separator used when writing rows.
    pub fn as_output(&self) -> String {
        match *self {
            Delimiter::Whitespace => " ".to_string(),
            Delimiter::Char(c) => c.to_string(),
        }
    }
}

impl FromStr for Delimiter {
    type Err = TrajectoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "whitespace" | "ws" => Ok(Delimiter::Whitespace),
            "tab" | "\\t" => Ok(Delimiter::Char('\t')),
            "comma" => Ok(Delimiter::Char(',')),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c.is_whitespace() && c != '\t' => Ok(Delimiter::Whitespace),
                    (Some(c), None) => Ok(Delimiter::Char(c)),
                    _ => Err(TrajectoryError::InvalidInput(format!(
                        "delimiter must be a single character, got {s:?}"
                    ))),
                }
            }
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delimiter::Whitespace => write!(f, "whitespace"),
            Delimiter::Char(c) => write!(f, "{c:?}"),
        }
    }
}

/// Lines that carry data: non-blank and not `#` comments, with 1-based line numbers.
pub(crate) fn data_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}
