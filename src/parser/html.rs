//! Shared HTML sanitation and wrapping used by every book format's output
//! stage and by the chapter-content write path.
//!
//! Rather than pull in a general HTML5 parser, input is walked with a
//! small typed DOM view built from a permissive hand-rolled
//! tokenizer: tags not in the whitelist are unwrapped (dropped, text
//! kept) rather than rejected outright, matching the uniform output rule
//! that `<a>` tags are stripped but their text survives.

const VOID_ELEMENTS: &[&str] = &["br", "img"];
const WHITELISTED_ELEMENTS: &[&str] = &[
    "p", "br", "strong", "em", "s", "sub", "sup", "h2", "img", "article",
];

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
}

/// Parses a fragment into a forest of nodes. Tolerant of malformed
/// input: unmatched closing tags are ignored, unclosed tags are closed
/// implicitly at end of input.
fn parse(input: &str) -> Vec<Node> {
    let mut stack: Vec<(String, Vec<(String, String)>, Vec<Node>)> = Vec::new();
    let mut root: Vec<Node> = Vec::new();
    let bytes = input.as_bytes();
    let mut i = 0usize;
    let mut text_buf = String::new();

    macro_rules! flush_text {
        () => {
            if !text_buf.is_empty() {
                let node = Node::Text(std::mem::take(&mut text_buf));
                push_node(&mut stack, &mut root, node);
            }
        };
    }

    while i < bytes.len() {
        if bytes[i] == b'<' {
            if let Some(end) = input[i..].find('>') {
                let tag_src = &input[i + 1..i + end];
                flush_text!();
                if let Some(name) = tag_src.strip_prefix('/') {
                    let name = name.trim().to_ascii_lowercase();
                    // Close the matching open element, if any is on the stack.
                    if let Some(pos) = stack.iter().rposition(|(t, _, _)| *t == name) {
                        while stack.len() > pos {
                            let (tag, attrs, children) = stack.pop().unwrap();
                            let node = Node::Element { tag, attrs, children };
                            push_node(&mut stack, &mut root, node);
                        }
                    }
                } else {
                    let self_closing = tag_src.trim_end().ends_with('/');
                    let body = tag_src.trim_end().trim_end_matches('/');
                    let mut parts = body.split_whitespace();
                    let name = parts
                        .next()
                        .unwrap_or("")
                        .to_ascii_lowercase();
                    let attrs = parse_attrs(body);
                    if name.is_empty() {
                        // malformed tag, ignore
                    } else if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
                        let node = Node::Element {
                            tag: name,
                            attrs,
                            children: Vec::new(),
                        };
                        push_node(&mut stack, &mut root, node);
                    } else {
                        stack.push((name, attrs, Vec::new()));
                    }
                }
                i += end + 1;
                continue;
            }
        }
        let ch = input[i..].chars().next().unwrap_or('<');
        text_buf.push(ch);
        i += ch.len_utf8();
    }
    flush_text!();

    while let Some((tag, attrs, children)) = stack.pop() {
        let node = Node::Element { tag, attrs, children };
        push_node(&mut stack, &mut root, node);
    }

    root
}

fn push_node(
    stack: &mut Vec<(String, Vec<(String, String)>, Vec<Node>)>,
    root: &mut Vec<Node>,
    node: Node,
) {
    if let Some((_, _, children)) = stack.last_mut() {
        children.push(node);
    } else {
        root.push(node);
    }
}

/// Very small `name="value"`/`name='value'` attribute scanner — good
/// enough for the constrained attribute set (`src`) this pipeline ever
/// emits or accepts.
fn parse_attrs(tag_body: &str) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    let bytes = tag_body.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        let name_start = i;
        while i < bytes.len() && bytes[i] != b'=' && !(bytes[i] as char).is_whitespace() {
            i += 1;
        }
        if i == name_start {
            i += 1;
            continue;
        }
        let name = tag_body[name_start..i].to_ascii_lowercase();
        while i < bytes.len() && (bytes[i] as char).is_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'=' {
            i += 1;
            while i < bytes.len() && (bytes[i] as char).is_whitespace() {
                i += 1;
            }
            if i < bytes.len() && (bytes[i] == b'"' || bytes[i] == b'\'') {
                let quote = bytes[i];
                i += 1;
                let value_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                let value = tag_body[value_start..i.min(tag_body.len())].to_string();
                if i < bytes.len() {
                    i += 1;
                }
                attrs.push((name, value));
            }
        }
    }
    attrs
}

fn escape_text(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// Renders a node, unwrapping non-whitelisted elements into their
/// children (text and whitelisted descendants survive; the tag itself
/// and any other attributes do not). Whitelisted elements keep only the
/// `src` attribute, and only on `img` with a safe scheme.
fn render(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element { tag, attrs, children } => {
            if !WHITELISTED_ELEMENTS.contains(&tag.as_str()) {
                for child in children {
                    render(child, out);
                }
                return;
            }
            // Headings below h2 collapse to h2 (uniform output rule);
            // the tokenizer only ever whitelists "h2" itself today, so
            // this is a no-op reserved for future heading levels.
            let tag = tag.as_str();
            out.push('<');
            out.push_str(tag);
            if tag == "img"
                && let Some((_, src)) = attrs.iter().find(|(k, _)| k == "src")
                && is_safe_image_src(src)
            {
                out.push_str(" src=\"");
                out.push_str(&escape_text(src));
                out.push('"');
            }
            out.push('>');
            if !VOID_ELEMENTS.contains(&tag) {
                for child in children {
                    render(child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

fn is_safe_image_src(src: &str) -> bool {
    let lower = src.trim().to_ascii_lowercase();
    lower.starts_with("data:image/")
}

/// Drops paragraph elements with no rendered content — the uniform
/// output rule "empty paragraphs are dropped".
fn drop_empty_paragraphs(nodes: Vec<Node>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter_map(|node| match node {
            Node::Element { tag, attrs, children } => {
                let children = drop_empty_paragraphs(children);
                if tag == "p" && children.iter().all(is_blank) {
                    None
                } else {
                    Some(Node::Element { tag, attrs, children })
                }
            }
            other => Some(other),
        })
        .collect()
}

fn is_blank(node: &Node) -> bool {
    match node {
        Node::Text(t) => t.trim().is_empty(),
        Node::Element { .. } => false,
    }
}

/// Sanitizes a fragment of HTML: strips scripts/styles/event handlers,
/// non-whitelisted tags, and external URL references. Idempotent and the
/// identity transform on input already in the whitelisted subset.
pub fn sanitize(input: &str) -> String {
    let nodes = drop_empty_paragraphs(parse(input));
    let mut out = String::new();
    for node in &nodes {
        render(node, &mut out);
    }
    out
}

/// Wraps already-sanitized chapter HTML in the `<article>` element every
/// chapter is served in, applied at read time so the stored row holds
/// the bare sanitized body.
pub fn wrap_article(sanitized_inner: &str) -> String {
    format!("<article>{sanitized_inner}</article>")
}

/// Builds a single `<p>` per blank-line-separated paragraph, `<br>` for
/// intra-paragraph newlines, with full HTML-escaping — the TXT format
/// rule, also reused by the legacy DOC extractor.
pub fn paragraphs_from_plain_text(text: &str) -> String {
    let mut out = String::new();
    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }
        out.push_str("<p>");
        let lines: Vec<&str> = trimmed.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if idx > 0 {
                out.push_str("<br>");
            }
            out.push_str(&escape_text(line));
        }
        out.push_str("</p>");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_plain_text() {
        assert_eq!(sanitize("<p>a & b</p>"), "<p>a &amp; b</p>");
    }

    #[test]
    fn strips_script_tags_keeping_nothing_executable() {
        let out = sanitize("<p>hi<script>alert(1)</script>bye</p>");
        assert!(!out.contains("<script"));
        assert!(out.contains("hi"));
        assert!(out.contains("bye"));
    }

    #[test]
    fn strips_anchor_tags_keeping_text() {
        let out = sanitize("<p>click <a href=\"javascript:x\">here</a> now</p>");
        assert!(!out.contains("<a"));
        assert!(out.contains("here"));
    }

    #[test]
    fn drops_empty_paragraphs() {
        let out = sanitize("<p>  </p><p>real</p>");
        assert_eq!(out, "<p>real</p>");
    }

    #[test]
    fn keeps_whitelisted_formatting() {
        let out = sanitize("<p><strong>bold</strong> <em>em</em></p>");
        assert_eq!(out, "<p><strong>bold</strong> <em>em</em></p>");
    }

    #[test]
    fn drops_external_image_src_but_keeps_data_uri() {
        let out = sanitize("<p><img src=\"https://evil.example/x.png\"><img src=\"data:image/png;base64,AAAA\"></p>");
        assert!(!out.contains("evil.example"));
        assert!(out.contains("data:image/png;base64,AAAA"));
    }

    #[test]
    fn identity_on_already_safe_input() {
        let safe = "<p>In a hole in the ground there lived a hobbit.</p>";
        assert_eq!(sanitize(safe), safe);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let out = paragraphs_from_plain_text("Para one.\n\nPara two.");
        assert_eq!(out, "<p>Para one.</p><p>Para two.</p>");
    }

    #[test]
    fn intra_paragraph_newlines_become_br() {
        let out = paragraphs_from_plain_text("line one\nline two");
        assert_eq!(out, "<p>line one<br>line two</p>");
    }
}
