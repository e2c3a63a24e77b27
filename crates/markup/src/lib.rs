//! Markdown rendering for marknest documents.
//!
//! # Features
//!
//! - **Parsing**: Convert Markdown to blocks and inline spans via [`parse`]
//! - **Rendering**: HTML via [`to_html`] or plain text via [`to_plain_text`]
//! - **Counting**: Byte, character and word totals via [`TextStats`]
//!
//! # Example
//!
//! ```
//! use marknest_markup::{TextStats, to_html};
//!
//! let text = "Hello **world**";
//! assert_eq!(to_html(text), "<p>Hello <strong>world</strong></p>");
//! assert_eq!(TextStats::of(text).words, 2);
//! ```

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]

mod nodes;
mod parser;
mod render;
mod stats;

pub use nodes::{Block, InlineNode, InlineType};
pub use parser::{parse, parse_inline};
pub use render::{to_html, to_plain_text};
pub use stats::TextStats;
