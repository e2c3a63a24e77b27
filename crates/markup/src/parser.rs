//! Markdown parser.
//!
//! Blocks are recognised line by line; inline spans are found with regexes
//! and resolved left to right, dropping any match that overlaps an earlier one.

use regex::Regex;

use crate::nodes::{Block, InlineNode, InlineType};

// Regex patterns - these are valid static patterns that cannot fail
#[allow(clippy::unwrap_used)]
static HEADING_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^(#{1,6})(?:[ \t]+(.*?))?[ \t]*#*[ \t]*$").unwrap());

#[allow(clippy::unwrap_used)]
static BULLET_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[ ]{0,3}[-*+][ \t]+(.*)$").unwrap());

#[allow(clippy::unwrap_used)]
static NUMBERED_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"^[ ]{0,3}(\d{1,9})[.)][ \t]+(.*)$").unwrap());

#[allow(clippy::unwrap_used)]
static RULE_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"^[ ]{0,3}(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,}|(?:_[ \t]*){3,})$").unwrap()
});

#[allow(clippy::unwrap_used)]
static LINK_RE: std::sync::LazyLock<Regex> = std::sync::LazyLock::new(|| {
    Regex::new(r"\[([^\]]+)\]\(((?:https?://|mailto:|/|#)[^\s)]*)\)").unwrap()
});

#[allow(clippy::unwrap_used)]
static URL_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"https?://[^\s<>\[\]()]+").unwrap());

#[allow(clippy::unwrap_used)]
static BOLD_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());

#[allow(clippy::unwrap_used)]
static ITALIC_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"\*([^*\s](?:[^*]*[^*\s])?)\*").unwrap());

#[allow(clippy::unwrap_used)]
static STRIKE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"~~(.+?)~~").unwrap());

#[allow(clippy::unwrap_used)]
static INLINE_CODE_RE: std::sync::LazyLock<Regex> =
    std::sync::LazyLock::new(|| Regex::new(r"`([^`]+)`").unwrap());

/// Parse Markdown text into blocks.
#[must_use]
pub fn parse(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.lines().collect();
    parse_lines(&lines)
}

fn parse_lines(lines: &[&str]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim_start();

        if trimmed.is_empty() {
            i += 1;
            continue;
        }

        // Fenced code runs to the closing fence or the end of input
        if let Some(info) = trimmed.strip_prefix("```") {
            let lang = Some(info.trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            let mut code_lines = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with("```") {
                code_lines.push(lines[i]);
                i += 1;
            }
            i += 1; // closing fence
            blocks.push(Block::CodeBlock {
                code: code_lines.join("\n"),
                lang,
            });
            continue;
        }

        if let Some(cap) = HEADING_RE.captures(trimmed) {
            let level = cap.get(1).map_or(1, |m| m.as_str().len()) as u8;
            let content = cap.get(2).map_or("", |m| m.as_str());
            blocks.push(Block::Heading {
                level,
                children: parse_inline(content),
            });
            i += 1;
            continue;
        }

        if RULE_RE.is_match(line) {
            blocks.push(Block::Rule);
            i += 1;
            continue;
        }

        if trimmed.starts_with('>') {
            let mut inner = Vec::new();
            while i < lines.len() {
                let Some(rest) = lines[i].trim_start().strip_prefix('>') else {
                    break;
                };
                inner.push(rest.strip_prefix(' ').unwrap_or(rest));
                i += 1;
            }
            blocks.push(Block::Quote {
                children: parse_lines(&inner),
            });
            continue;
        }

        if BULLET_RE.is_match(line) {
            let mut items = Vec::new();
            while i < lines.len() {
                let Some(cap) = BULLET_RE.captures(lines[i]) else {
                    break;
                };
                items.push(parse_inline(cap.get(1).map_or("", |m| m.as_str())));
                i += 1;
            }
            blocks.push(Block::List {
                ordered: false,
                start: 1,
                items,
            });
            continue;
        }

        if let Some(first) = NUMBERED_RE.captures(line) {
            let start = first
                .get(1)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(1);
            let mut items = Vec::new();
            while i < lines.len() {
                let Some(cap) = NUMBERED_RE.captures(lines[i]) else {
                    break;
                };
                items.push(parse_inline(cap.get(2).map_or("", |m| m.as_str())));
                i += 1;
            }
            blocks.push(Block::List {
                ordered: true,
                start,
                items,
            });
            continue;
        }

        // Paragraph: consecutive lines until a blank line or another block starts
        let mut para = vec![line.trim()];
        i += 1;
        while i < lines.len() && !starts_block(lines[i]) {
            para.push(lines[i].trim());
            i += 1;
        }
        blocks.push(Block::Paragraph {
            children: parse_inline(&para.join("\n")),
        });
    }

    blocks
}

fn starts_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty()
        || trimmed.starts_with("```")
        || trimmed.starts_with('>')
        || HEADING_RE.is_match(trimmed)
        || RULE_RE.is_match(line)
        || BULLET_RE.is_match(line)
        || NUMBERED_RE.is_match(line)
}

/// Parse inline Markdown into nodes.
#[must_use]
#[allow(clippy::unwrap_used)] // Regex capture groups are guaranteed to exist
pub fn parse_inline(text: &str) -> Vec<InlineNode> {
    let mut nodes = Vec::new();
    let mut pos = 0;

    // Collect all matches with their positions
    let mut matches: Vec<(usize, usize, InlineType)> = Vec::new();

    // Inline code first: its content is literal
    for cap in INLINE_CODE_RE.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let code = cap.get(1).unwrap().as_str().to_string();
        matches.push((m.start(), m.end(), InlineType::InlineCode { code }));
    }

    for cap in LINK_RE.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let label = cap.get(1).unwrap();
        let url = cap.get(2).unwrap().as_str().to_string();
        let children = nested(label.as_str(), label.start());
        matches.push((m.start(), m.end(), InlineType::Link { url, children }));
    }

    for m in URL_RE.find_iter(text) {
        matches.push((
            m.start(),
            m.end(),
            InlineType::Url {
                url: m.as_str().to_string(),
            },
        ));
    }

    for cap in BOLD_RE.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let inner = cap.get(1).unwrap();
        let children = nested(inner.as_str(), inner.start());
        matches.push((m.start(), m.end(), InlineType::Bold { children }));
    }

    // Italic is searched with bold and code spans blanked out, so the
    // asterisks of `**bold**` can never pair up with a later `*`.
    let masked = mask_spans(text, &matches);
    for cap in ITALIC_RE.captures_iter(&masked) {
        let m = cap.get(0).unwrap();
        let inner = cap.get(1).unwrap();
        let children = nested(&text[inner.start()..inner.end()], inner.start());
        matches.push((m.start(), m.end(), InlineType::Italic { children }));
    }

    for cap in STRIKE_RE.captures_iter(text) {
        let m = cap.get(0).unwrap();
        let inner = cap.get(1).unwrap();
        let children = nested(inner.as_str(), inner.start());
        matches.push((m.start(), m.end(), InlineType::Strike { children }));
    }

    // Sort by position; on a tie the longer span wins
    matches.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));

    // Remove overlapping matches (keep first)
    let mut filtered_matches: Vec<(usize, usize, InlineType)> = Vec::new();
    for m in matches {
        if filtered_matches.last().is_none_or(|last| m.0 >= last.1) {
            filtered_matches.push(m);
        }
    }

    for (start, end, node_type) in filtered_matches {
        if start > pos {
            nodes.push(InlineNode::new(
                InlineType::Text {
                    text: text[pos..start].to_string(),
                },
                pos,
                start,
            ));
        }
        nodes.push(InlineNode::new(node_type, start, end));
        pos = end;
    }

    if pos < text.len() {
        nodes.push(InlineNode::new(
            InlineType::Text {
                text: text[pos..].to_string(),
            },
            pos,
            text.len(),
        ));
    }

    nodes
}

fn mask_spans(text: &str, matches: &[(usize, usize, InlineType)]) -> String {
    let mut bytes = text.as_bytes().to_vec();
    for (start, end, node_type) in matches {
        if matches!(
            node_type,
            InlineType::Bold { .. } | InlineType::InlineCode { .. }
        ) {
            bytes[*start..*end].fill(b' ');
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn nested(inner: &str, offset: usize) -> Vec<InlineNode> {
    parse_inline(inner)
        .into_iter()
        .map(|n| n.shifted(offset))
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_levels() {
        let blocks = parse("# One\n### Three ###");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(blocks[0], Block::Heading { level: 1, .. }));
        assert!(matches!(blocks[1], Block::Heading { level: 3, .. }));
    }

    #[test]
    fn test_paragraph_stops_at_blank_line() {
        let blocks = parse("first line\nsecond line\n\nnext");
        assert_eq!(blocks.len(), 2);
        match &blocks[0] {
            Block::Paragraph { children } => match &children[0].node_type {
                InlineType::Text { text } => assert_eq!(text, "first line\nsecond line"),
                other => panic!("unexpected {other:?}"),
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fenced_code_keeps_markup_literal() {
        let blocks = parse("```rust\nlet x = **1**;\n```");
        assert_eq!(
            blocks,
            vec![Block::CodeBlock {
                code: "let x = **1**;".to_string(),
                lang: Some("rust".to_string()),
            }]
        );
    }

    #[test]
    fn test_unterminated_fence_runs_to_end() {
        let blocks = parse("```\nopen");
        assert_eq!(blocks.len(), 1);
        assert!(matches!(&blocks[0], Block::CodeBlock { code, lang: None } if code == "open"));
    }

    #[test]
    fn test_lists() {
        let blocks = parse("- a\n- b\n\n3. c\n4. d");
        assert_eq!(blocks.len(), 2);
        assert!(matches!(&blocks[0], Block::List { ordered: false, items, .. } if items.len() == 2));
        assert!(matches!(&blocks[1], Block::List { ordered: true, start: 3, .. }));
    }

    #[test]
    fn test_quote_nests_blocks() {
        let blocks = parse("> # Title\n> body");
        match &blocks[0] {
            Block::Quote { children } => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Block::Heading { level: 1, .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_rule() {
        assert_eq!(parse("---"), vec![Block::Rule]);
        assert_eq!(parse("* * *"), vec![Block::Rule]);
    }

    #[test]
    fn test_bold_is_not_italic() {
        let nodes = parse_inline("a **b** c");
        assert_eq!(nodes.len(), 3);
        assert!(matches!(nodes[1].node_type, InlineType::Bold { .. }));
        assert_eq!((nodes[1].start, nodes[1].end), (2, 7));
    }

    #[test]
    fn test_link_swallows_inner_url() {
        let nodes = parse_inline("[docs](https://example.com/a)");
        assert_eq!(nodes.len(), 1);
        match &nodes[0].node_type {
            InlineType::Link { url, children } => {
                assert_eq!(url, "https://example.com/a");
                assert_eq!(children[0].start, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_javascript_link_is_not_a_link() {
        let nodes = parse_inline("[x](javascript:alert(1))");
        assert!(
            nodes
                .iter()
                .all(|n| !matches!(n.node_type, InlineType::Link { .. }))
        );
    }

    #[test]
    fn test_code_wins_over_emphasis() {
        let nodes = parse_inline("`*not italic*`");
        assert_eq!(nodes.len(), 1);
        assert!(matches!(&nodes[0].node_type, InlineType::InlineCode { code } if code == "*not italic*"));
    }
}
