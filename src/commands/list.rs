//! Task set rendering.

use std::fmt;
use std::io::Write;
use std::str::FromStr;

use crate::core::task::TaskSet;
use crate::error::Error;

/// Output format of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListFormat {
    /// Sorted task names, one per line.
    #[default]
    Name,
    /// The whole task set as an indented JSON document.
    Json,
}

impl ListFormat {
    /// Every supported format name.
    pub const ALLOWED: [&'static str; 2] = ["name", "json"];

    /// Write `tasks` to `out` in this format.
    pub fn render<W: Write>(self, tasks: &TaskSet, out: &mut W) -> Result<(), Error> {
        match self {
            Self::Name => {
                for name in tasks.names() {
                    writeln!(out, "{}", name)?;
                }
            }
            Self::Json => {
                let document = serde_json::to_string_pretty(tasks)?;
                writeln!(out, "{}", document)?;
            }
        }
        Ok(())
    }
}

impl FromStr for ListFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(Self::Name),
            "json" => Ok(Self::Json),
            other => Err(Error::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for ListFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name => write!(f, "name"),
            Self::Json => write!(f, "json"),
        }
    }
}
