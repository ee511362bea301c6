//! Asciidoc rendering of a [Document]. Pure and deterministic: the same document always
//! renders to the same bytes.

use crate::model::{Block, Document, Inline, ListItem};

/// Deepest list nesting asciidoc markers express (`*****`).
const MAX_LIST_DEPTH: usize = 5;

const ADMONITION_LABELS: [&str; 5] = ["NOTE", "TIP", "IMPORTANT", "WARNING", "CAUTION"];

/// Render a whole chapter: `==` title, source link, optional sidebar, then the body.
pub fn render_document(doc: &Document) -> String {
    let mut parts = vec![format!("== {}", escape_text(&doc.title))];

    let mut origin = format!("link:{}[original article]", macro_target(&doc.source_url));
    if let Some(ref date) = doc.published {
        origin.push_str(" published on ");
        origin.push_str(&escape_text(date));
    }
    parts.push(origin);

    if let Some(ref sidebar) = doc.sidebar {
        parts.push(format!(
            ".{}\n****\n{}\n****",
            escape_text(sidebar.title.trim()),
            guard_line_starts(&escape_text(&sidebar.body))
        ));
    }

    let body = render_blocks(&doc.blocks);
    if !body.is_empty() {
        parts.push(body);
    }
    let mut out = parts.join("\n\n");
    out.push('\n');
    out
}

/// Render blocks separated by blank lines.
pub fn render_blocks(blocks: &[Block]) -> String {
    render_blocks_at(blocks, 0)
}

fn render_blocks_at(blocks: &[Block], quote_depth: usize) -> String {
    let mut out = String::new();
    let mut prev: Option<&Block> = None;
    for block in blocks {
        let rendered = render_block(block, quote_depth);
        if rendered.is_empty() {
            continue;
        }
        if let Some(p) = prev {
            out.push_str("\n\n");
            // Adjacent lists would otherwise merge into one.
            if matches!(p, Block::List { .. }) && matches!(block, Block::List { .. }) {
                out.push_str("//-\n");
            }
        }
        out.push_str(&rendered);
        prev = Some(block);
    }
    out
}

fn render_block(block: &Block, quote_depth: usize) -> String {
    match block {
        Block::Heading { level, text } => {
            let level = usize::from(*level).clamp(1, 6);
            format!("{} {}", "=".repeat(level), escape_text(text))
        }
        Block::Paragraph(runs) => guard_line_starts(&render_inlines(runs)),
        Block::List { ordered, items } => {
            let mut lines = Vec::new();
            render_list(*ordered, items, 1, quote_depth, &mut lines);
            lines.join("\n")
        }
        Block::Image { src, alt, caption } => {
            let macro_line = format!("image::{}[{}]", macro_target(src), image_alt_attr(alt));
            match caption.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                Some(c) => format!(".{}\n{}", escape_text(c), macro_line),
                None => macro_line,
            }
        }
        Block::CodeBlock { language, text } => {
            let header = match language {
                Some(lang) => format!("[source,{}]", lang),
                None => "[listing]".to_string(),
            };
            let delim = delimiter_for('-', 4, text);
            format!("{}\n{}\n{}\n{}", header, delim, text, delim)
        }
        Block::Quote(inner) => {
            let body = render_blocks_at(inner, quote_depth + 1);
            if body.is_empty() {
                return String::new();
            }
            let delim = "_".repeat(4 + quote_depth);
            format!("[quote]\n{}\n{}\n{}", delim, body, delim)
        }
        Block::Table(html) => {
            let delim = delimiter_for('+', 4, html);
            format!("{}\n{}\n{}", delim, html.trim(), delim)
        }
    }
}

fn render_list(
    ordered: bool,
    items: &[ListItem],
    depth: usize,
    quote_depth: usize,
    lines: &mut Vec<String>,
) {
    let marker = (if ordered { "." } else { "*" }).repeat(depth.min(MAX_LIST_DEPTH));
    for item in items {
        let text = render_inlines(&item.content);
        let text = if text.is_empty() {
            "{empty}".to_string()
        } else {
            text
        };
        lines.push(format!("{} {}", marker, text));
        for child in &item.children {
            match child {
                Block::List { ordered, items } => {
                    render_list(*ordered, items, depth + 1, quote_depth, lines)
                }
                other => {
                    let rendered = render_block(other, quote_depth);
                    if !rendered.is_empty() {
                        lines.push("+".to_string());
                        lines.push(rendered);
                    }
                }
            }
        }
    }
}

/// Concatenate inline runs into asciidoc inline markup.
pub fn render_inlines(runs: &[Inline]) -> String {
    runs.iter().map(render_inline).collect()
}

fn render_inline(run: &Inline) -> String {
    match run {
        Inline::Text { text } => escape_text(text),
        Inline::Bold { children } => emphasis("**", children),
        Inline::Italic { children } => emphasis("__", children),
        Inline::Code { text } => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return String::new();
            }
            let (lead, trail) = edge_whitespace(text);
            if trimmed.contains("+`") {
                format!("{}`{}`{}", lead, escape_text(trimmed), trail)
            } else {
                format!("{}`+{}+`{}", lead, trimmed, trail)
            }
        }
        Inline::Link { href, children } => {
            format!("link:{}[{}]", macro_target(href), render_inlines(children).trim())
        }
        Inline::LineBreak => " +\n".to_string(),
    }
}

/// Unconstrained markers with edge whitespace moved outside them.
fn emphasis(marker: &str, children: &[Inline]) -> String {
    let inner = render_inlines(children);
    let trimmed = inner.trim();
    if trimmed.is_empty() {
        return inner;
    }
    let (lead, trail) = edge_whitespace(&inner);
    format!("{}{}{}{}{}", lead, marker, trimmed, marker, trail)
}

fn edge_whitespace(s: &str) -> (&str, &str) {
    (
        &s[..s.len() - s.trim_start().len()],
        &s[s.trim_end().len()..],
    )
}

/// Macro targets end at the first `[`, so brackets in URLs are percent-encoded.
fn macro_target(url: &str) -> String {
    url.replace('[', "%5B").replace(']', "%5D")
}

/// Escape asciidoc inline markup characters with numeric character references.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '*' => out.push_str("&#42;"),
            '_' => out.push_str("&#95;"),
            '`' => out.push_str("&#96;"),
            '#' => out.push_str("&#35;"),
            '^' => out.push_str("&#94;"),
            '~' => out.push_str("&#126;"),
            '+' => out.push_str("&#43;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Keep paragraph lines from being read as block syntax (titles, lists, sections, admonitions).
fn guard_line_starts(s: &str) -> String {
    s.split('\n').map(guard_line_start).collect::<Vec<_>>().join("\n")
}

fn guard_line_start(line: &str) -> String {
    let Some(first) = line.chars().next() else {
        return String::new();
    };
    let reference = match first {
        '=' => Some("&#61;"),
        '.' => Some("&#46;"),
        '-' => Some("&#45;"),
        '|' => Some("&#124;"),
        '>' => Some("&#62;"),
        '/' => Some("&#47;"),
        ':' => Some("&#58;"),
        '\'' if line.starts_with("'''") => Some("&#39;"),
        '<' if line.starts_with("<<<") => Some("&#60;"),
        _ => None,
    };
    if let Some(r) = reference {
        return format!("{}{}", r, &line[first.len_utf8()..]);
    }

    // "1. Start here" would become an ordered list.
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 && line[digits..].starts_with(". ") {
        return format!("{}&#46;{}", &line[..digits], &line[digits + 1..]);
    }

    // "A. Lincoln" and "iv) later" are list items too.
    let mut chars = line.chars();
    if let (Some(c), Some('.'), Some(' ')) = (chars.next(), chars.next(), chars.next()) {
        if c.is_ascii_alphabetic() {
            return format!("{}&#46;{}", c, &line[2..]);
        }
    }
    let roman = line.len() - line.trim_start_matches(['I', 'V', 'X', 'i', 'v', 'x']).len();
    if roman > 0 && line[roman..].starts_with(") ") {
        return format!("{}&#41;{}", &line[..roman], &line[roman + 1..]);
    }

    for label in ADMONITION_LABELS {
        if let Some(rest) = line.strip_prefix(label) {
            if rest.starts_with(": ") {
                return format!("{}&#58;{}", label, &rest[1..]);
            }
        }
    }
    line.to_string()
}

/// Image alt as a macro attribute; quoted when it contains separators.
fn image_alt_attr(alt: &str) -> String {
    let alt = alt.replace(']', "\\]");
    if alt.contains(',') || alt.contains('"') || alt.contains('=') {
        format!("\"{}\"", alt.replace('"', "\\\""))
    } else {
        alt
    }
}

/// Shortest delimiter of `c` (at least `min` long) that no content line equals.
fn delimiter_for(c: char, min: usize, content: &str) -> String {
    let mut delim = c.to_string().repeat(min);
    while content.lines().any(|l| l.trim_end() == delim) {
        delim.push(c);
    }
    delim
}
