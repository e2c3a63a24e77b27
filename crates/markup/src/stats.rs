//! Size and length counters stored alongside each document and version.

use serde::Serialize;

use crate::render::to_plain_text;

/// Byte, character and word counts for a piece of Markdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TextStats {
    /// UTF-8 length of the raw source.
    pub bytes: i64,
    /// Unicode scalar values in the raw source.
    pub chars: i32,
    /// Whitespace separated words in the rendered plain text.
    pub words: i32,
}

impl TextStats {
    #[must_use]
    pub fn of(content: &str) -> Self {
        let plain = to_plain_text(content);
        Self {
            bytes: content.len() as i64,
            chars: content.chars().count() as i32,
            words: plain.split_whitespace().count() as i32,
        }
    }
}
