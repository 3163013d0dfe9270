//! String-backed implementation of [`RichTextEditor`].

use crate::editor::{escape_html, BlockKind, EditorError, RichTextEditor};
use std::ops::Range;

const BLOCKED_LINK_SCHEMES: &[&str] = &["javascript", "vbscript", "data"];

/// Markup buffer with a byte-range selection.
///
/// An empty selection is a caret. New editors place the caret at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupEditor {
    markup: String,
    selection: Range<usize>,
}

impl MarkupEditor {
    pub fn new(markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let end = markup.len();
        Self {
            markup,
            selection: end..end,
        }
    }

    /// Selects a byte range of the markup.
    pub fn select(&mut self, range: Range<usize>) -> Result<(), EditorError> {
        let len = self.markup.len();
        if range.start > range.end || range.end > len {
            return Err(EditorError::SelectionOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        for offset in [range.start, range.end] {
            if !self.markup.is_char_boundary(offset) {
                return Err(EditorError::NotCharBoundary(offset));
            }
        }
        self.selection = range;
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.selection = 0..self.markup.len();
    }

    pub fn move_to_end(&mut self) {
        let end = self.markup.len();
        self.selection = end..end;
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    pub fn selected_text(&self) -> &str {
        &self.markup[self.selection.clone()]
    }

    pub fn into_markup(self) -> String {
        self.markup
    }

    fn toggle_inline(&mut self, tag: &str) {
        let open = format!("<{tag}>");
        let close = format!("</{tag}>");
        let Range { start, end } = self.selection.clone();

        let is_plain = |inner: &str| tags_balanced(inner, &open, &close);

        // Selection sits directly inside the tag pair.
        if self.markup[..start].ends_with(&open)
            && self.markup[end..].starts_with(&close)
            && is_plain(&self.markup[start..end])
        {
            self.markup.replace_range(end..end + close.len(), "");
            self.markup.replace_range(start - open.len()..start, "");
            self.selection = start - open.len()..end - open.len();
            return;
        }

        // Selection includes the tag pair.
        let selected = &self.markup[start..end];
        if selected.len() >= open.len() + close.len()
            && selected.starts_with(&open)
            && selected.ends_with(&close)
            && is_plain(&selected[open.len()..selected.len() - close.len()])
        {
            let inner = selected[open.len()..selected.len() - close.len()].to_string();
            self.markup.replace_range(start..end, &inner);
            self.selection = start..start + inner.len();
            return;
        }

        self.markup.insert_str(end, &close);
        self.markup.insert_str(start, &open);
        self.selection = start + open.len()..end + open.len();
    }

    fn replace_selection(&mut self, replacement: &str) {
        let start = self.selection.start;
        self.markup.replace_range(self.selection.clone(), replacement);
        let caret = start + replacement.len();
        self.selection = caret..caret;
    }
}

impl RichTextEditor for MarkupEditor {
    fn toggle_bold(&mut self) {
        self.toggle_inline("b");
    }

    fn toggle_italic(&mut self) {
        self.toggle_inline("i");
    }

    fn toggle_underline(&mut self) {
        self.toggle_inline("u");
    }

    fn insert_link(&mut self, url: &str) -> Result<(), EditorError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(EditorError::EmptyLink);
        }
        if let Some((scheme, _)) = url.split_once(':') {
            let scheme = scheme.trim().to_ascii_lowercase();
            if BLOCKED_LINK_SCHEMES.contains(&scheme.as_str()) {
                return Err(EditorError::UnsafeLinkScheme(scheme));
            }
        }

        let href = escape_html(url);
        if self.selection.is_empty() {
            self.replace_selection(&format!("<a href=\"{href}\">{href}</a>"));
            return Ok(());
        }

        let Range { start, end } = self.selection.clone();
        let open = format!("<a href=\"{href}\">");
        self.markup.insert_str(end, "</a>");
        self.markup.insert_str(start, &open);
        self.selection = start + open.len()..end + open.len();
        Ok(())
    }

    fn insert_block(&mut self, block: BlockKind) {
        let rendered = match block {
            BlockKind::HorizontalRule => "<hr>".to_string(),
            BlockKind::BulletList => format!("<ul><li>{}</li></ul>", self.selected_text()),
            BlockKind::NumberedList => format!("<ol><li>{}</li></ol>", self.selected_text()),
            BlockKind::TodoItem(text) => format!(
                "<div class=\"todo-item\"><input type=\"checkbox\"><span>{}</span></div>",
                escape_html(&text)
            ),
            BlockKind::Attachment { url, name } => format!(
                "<div class=\"attachment\"><a href=\"{}\" target=\"_blank\" rel=\"noopener noreferrer\">📎 {}</a></div>",
                escape_html(&url),
                escape_html(&name)
            ),
        };
        self.replace_selection(&rendered);
    }

    fn markup(&self) -> &str {
        &self.markup
    }
}

/// True when every `close` in `text` pairs with an earlier `open`, and no
/// `open` is left unclosed.
fn tags_balanced(text: &str, open: &str, close: &str) -> bool {
    let mut depth = 0_usize;
    let mut rest = text;
    loop {
        let next_open = rest.find(open);
        let Some(at_close) = rest.find(close) else {
            return depth == 0 && next_open.is_none();
        };
        match next_open {
            Some(at_open) if at_open < at_close => {
                depth += 1;
                rest = &rest[at_open + open.len()..];
            }
            _ => {
                let Some(remaining) = depth.checked_sub(1) else {
                    return false;
                };
                depth = remaining;
                rest = &rest[at_close + close.len()..];
            }
        }
    }
}
