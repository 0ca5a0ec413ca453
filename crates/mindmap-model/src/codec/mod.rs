//! MMD text codec.
//!
//! [`parse`] turns text into a [`MindMap`] and [`serialize`] writes it back.
//! For any map built through the public API, parsing the serialized text
//! yields a structurally equal map, and serializing that again reproduces
//! the same bytes.

pub mod attribute_line;
pub mod escape;
mod parser;
mod writer;

use std::str::FromStr;

use crate::error::FormatError;
use crate::map::MindMap;

pub use escape::{escape_markdown, escape_pre, make_pre_block, unescape_markdown};
pub use parser::{ParseOptions, parse};
pub use writer::serialize;

/// First line of every written document.
pub const BANNER: &str = "Mind Map generated by NB MindMap plugin";

/// Trailing spaces that end the banner paragraph.
pub const NEXT_PARAGRAPH: &str = "   \n";

impl MindMap {
    /// Parses MMD text, failing on malformed payload blocks.
    pub fn from_mmd(text: &str) -> Result<Self, FormatError> {
        parse(text, &ParseOptions::default())
    }

    pub fn to_mmd(&self) -> String {
        serialize(self)
    }
}

impl FromStr for MindMap {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_mmd(s)
    }
}
