//! List preview derivation for memo bodies.
//!
//! # Invariants
//! - Previews are plain text: no tags, collapsed whitespace.
//! - Previews never exceed `PREVIEW_MAX_CHARS` plus the `...` marker.

use crate::model::memo::MemoContent;
use once_cell::sync::Lazy;
use regex::Regex;

/// Maximum preview length in characters.
pub const PREVIEW_MAX_CHARS: usize = 120;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Derives the list preview of a memo body.
///
/// Rules:
/// - Reads the first block only.
/// - Tags are replaced by spaces, common entities decoded, whitespace
///   normalized.
/// - The first 120 chars are kept; `...` marks truncation.
pub fn derive_memo_preview(content: &MemoContent) -> Option<String> {
    let without_tags = TAG_RE.replace_all(content.markup(), " ");
    let decoded = decode_entities(&without_tags);
    let normalized = WHITESPACE_RE.replace_all(&decoded, " ");
    let trimmed = normalized.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut preview: String = trimmed.chars().take(PREVIEW_MAX_CHARS).collect();
    if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        preview.push_str("...");
    }
    Some(preview)
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
