//! Rich-text editing capability.
//!
//! # Responsibility
//! - Define the formatting operations a memo body supports.
//! - Keep markup manipulation out of the memo repository, which only ever
//!   sees finished markup strings.
//!
//! # Invariants
//! - User-supplied text and URLs are HTML-escaped before insertion.
//! - Selections always fall on UTF-8 char boundaries.

pub mod markup;

use std::error::Error;
use std::fmt::{Display, Formatter};

pub use markup::MarkupEditor;

/// Block-level insertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    HorizontalRule,
    /// Wraps the selection in a single-item bullet list.
    BulletList,
    /// Wraps the selection in a single-item numbered list.
    NumberedList,
    /// Unchecked todo item with the given text.
    TodoItem(String),
    /// Link to an uploaded attachment.
    Attachment { url: String, name: String },
}

/// Editor operation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorError {
    SelectionOutOfBounds { start: usize, end: usize, len: usize },
    NotCharBoundary(usize),
    EmptyLink,
    UnsafeLinkScheme(String),
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectionOutOfBounds { start, end, len } => {
                write!(f, "selection {start}..{end} outside markup of length {len}")
            }
            Self::NotCharBoundary(offset) => {
                write!(f, "offset {offset} is not on a character boundary")
            }
            Self::EmptyLink => write!(f, "link url cannot be empty"),
            Self::UnsafeLinkScheme(scheme) => write!(f, "link scheme `{scheme}` is not allowed"),
        }
    }
}

impl Error for EditorError {}

/// Formatting operations over a memo body.
pub trait RichTextEditor {
    fn toggle_bold(&mut self);
    fn toggle_italic(&mut self);
    fn toggle_underline(&mut self);
    /// Turns the selection into a link, or inserts the URL as link text.
    fn insert_link(&mut self, url: &str) -> Result<(), EditorError>;
    /// Replaces the selection with a block and moves the caret after it.
    fn insert_block(&mut self, block: BlockKind);
    fn markup(&self) -> &str;
}

/// Escapes text for inclusion in markup content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
