//! Rendering to HTML and plain text.

use crate::nodes::{Block, InlineNode, InlineType};

/// Render Markdown to HTML.
#[must_use]
pub fn to_html(text: &str) -> String {
    blocks_to_html(&crate::parse(text))
}

/// Render Markdown to plain text (markup stripped).
#[must_use]
pub fn to_plain_text(text: &str) -> String {
    blocks_to_plain_text(&crate::parse(text))
}

fn blocks_to_html(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(block_to_html)
        .collect::<Vec<_>>()
        .join("\n")
}

fn block_to_html(block: &Block) -> String {
    match block {
        Block::Heading { level, children } => {
            format!("<h{level}>{}</h{level}>", nodes_to_html(children))
        }
        Block::Paragraph { children } => format!("<p>{}</p>", nodes_to_html(children)),
        Block::CodeBlock { code, lang } => {
            if let Some(l) = lang {
                format!(
                    "<pre><code class=\"language-{}\">{}</code></pre>",
                    html_escape(l),
                    html_escape(code)
                )
            } else {
                format!("<pre><code>{}</code></pre>", html_escape(code))
            }
        }
        Block::Quote { children } => {
            format!("<blockquote>\n{}\n</blockquote>", blocks_to_html(children))
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            let items: String = items
                .iter()
                .map(|item| format!("<li>{}</li>", nodes_to_html(item)))
                .collect();
            match (ordered, start) {
                (false, _) => format!("<ul>{items}</ul>"),
                (true, 1) => format!("<ol>{items}</ol>"),
                (true, n) => format!("<ol start=\"{n}\">{items}</ol>"),
            }
        }
        Block::Rule => "<hr />".to_string(),
    }
}

fn nodes_to_html(nodes: &[InlineNode]) -> String {
    nodes.iter().map(node_to_html).collect()
}

fn node_to_html(node: &InlineNode) -> String {
    match &node.node_type {
        InlineType::Text { text } => html_escape(text),
        InlineType::Bold { children } => {
            format!("<strong>{}</strong>", nodes_to_html(children))
        }
        InlineType::Italic { children } => format!("<em>{}</em>", nodes_to_html(children)),
        InlineType::Strike { children } => format!("<del>{}</del>", nodes_to_html(children)),
        InlineType::InlineCode { code } => format!("<code>{}</code>", html_escape(code)),
        InlineType::Url { url } => format!(
            "<a href=\"{}\" rel=\"nofollow noopener\">{}</a>",
            html_escape(url),
            html_escape(url)
        ),
        InlineType::Link { url, children } => format!(
            "<a href=\"{}\" rel=\"nofollow noopener\">{}</a>",
            html_escape(url),
            nodes_to_html(children)
        ),
    }
}

fn blocks_to_plain_text(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(block_to_plain_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn block_to_plain_text(block: &Block) -> String {
    match block {
        Block::Heading { children, .. } | Block::Paragraph { children } => {
            nodes_to_plain_text(children)
        }
        Block::CodeBlock { code, .. } => code.clone(),
        Block::Quote { children } => blocks_to_plain_text(children),
        Block::List { items, .. } => items
            .iter()
            .map(|item| nodes_to_plain_text(item))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::Rule => String::new(),
    }
}

fn nodes_to_plain_text(nodes: &[InlineNode]) -> String {
    nodes.iter().map(node_to_plain_text).collect()
}

fn node_to_plain_text(node: &InlineNode) -> String {
    match &node.node_type {
        InlineType::Text { text } => text.clone(),
        InlineType::Bold { children }
        | InlineType::Italic { children }
        | InlineType::Strike { children }
        | InlineType::Link { children, .. } => nodes_to_plain_text(children),
        InlineType::InlineCode { code } => code.clone(),
        InlineType::Url { url } => url.clone(),
    }
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<script>alert('x')</script>"),
            "&lt;script&gt;alert(&#x27;x&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_to_html_document() {
        let html = to_html("# Notes\n\nSome **bold** and *soft* text.\n\n- one\n- two");
        assert_eq!(
            html,
            "<h1>Notes</h1>\n<p>Some <strong>bold</strong> and <em>soft</em> text.</p>\n<ul><li>one</li><li>two</li></ul>"
        );
    }

    #[test]
    fn test_to_html_escapes_raw_html() {
        assert_eq!(to_html("<b>hi</b>"), "<p>&lt;b&gt;hi&lt;/b&gt;</p>");
    }

    #[test]
    fn test_to_html_code_and_numbered_list() {
        assert_eq!(
            to_html("```sh\necho <x>\n```"),
            "<pre><code class=\"language-sh\">echo &lt;x&gt;</code></pre>"
        );
        assert_eq!(to_html("2. b\n3. c"), "<ol start=\"2\"><li>b</li><li>c</li></ol>");
    }

    #[test]
    fn test_to_plain_text_strips_markup() {
        assert_eq!(
            to_plain_text("## Title\n\nSee [the docs](https://example.com) ~~now~~"),
            "Title\n\nSee the docs now"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(to_html(""), "");
        assert_eq!(to_plain_text("   \n\n"), "");
    }
}
