//! Markdown AST nodes.

use serde::{Deserialize, Serialize};

/// Block-level element of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "camelCase")]
pub enum Block {
    /// ATX heading (`# Title` .. `###### Title`).
    Heading {
        level: u8,
        children: Vec<InlineNode>,
    },

    /// Paragraph of inline content. Soft line breaks are kept as `\n`.
    Paragraph { children: Vec<InlineNode> },

    /// Fenced code block.
    CodeBlock { code: String, lang: Option<String> },

    /// Block quote (`> text`), which may nest any block.
    Quote { children: Vec<Block> },

    /// Bullet (`- item`) or numbered (`1. item`) list.
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<InlineNode>>,
    },

    /// Thematic break (`---`).
    Rule,
}

/// Inline node with its byte span in the source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineNode {
    /// The type of node.
    #[serde(flatten)]
    pub node_type: InlineType,
    /// Start position in the source text.
    pub start: usize,
    /// End position in the source text.
    pub end: usize,
}

impl InlineNode {
    /// Create a new inline node.
    #[must_use]
    pub fn new(node_type: InlineType, start: usize, end: usize) -> Self {
        Self {
            node_type,
            start,
            end,
        }
    }

    pub(crate) fn shifted(mut self, offset: usize) -> Self {
        self.start += offset;
        self.end += offset;
        self.node_type = match self.node_type {
            InlineType::Bold { children } => InlineType::Bold {
                children: shift_all(children, offset),
            },
            InlineType::Italic { children } => InlineType::Italic {
                children: shift_all(children, offset),
            },
            InlineType::Strike { children } => InlineType::Strike {
                children: shift_all(children, offset),
            },
            InlineType::Link { url, children } => InlineType::Link {
                url,
                children: shift_all(children, offset),
            },
            other => other,
        };
        self
    }
}

fn shift_all(nodes: Vec<InlineNode>, offset: usize) -> Vec<InlineNode> {
    nodes.into_iter().map(|n| n.shifted(offset)).collect()
}

/// Types of inline nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "props", rename_all = "camelCase")]
pub enum InlineType {
    /// Plain text.
    Text { text: String },

    /// Bold text (**text**).
    Bold { children: Vec<InlineNode> },

    /// Italic text (*text*).
    Italic { children: Vec<InlineNode> },

    /// Strikethrough text (~~text~~).
    Strike { children: Vec<InlineNode> },

    /// Inline code (`code`).
    InlineCode { code: String },

    /// Link [text](url).
    Link {
        url: String,
        children: Vec<InlineNode>,
    },

    /// Bare URL.
    Url { url: String },
}

impl InlineType {
    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Bold { .. } => "bold",
            Self::Italic { .. } => "italic",
            Self::Strike { .. } => "strike",
            Self::InlineCode { .. } => "inlineCode",
            Self::Link { .. } => "link",
            Self::Url { .. } => "url",
        }
    }
}
