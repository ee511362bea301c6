//! Content extraction: raw page HTML plus a [SiteProfile] in, [Document] out.
//!
//! The content node is walked depth-first in document order. Recognized tags map to
//! [Block] and [Inline] variants; wrappers and unknown tags contribute their children.
//! Subtrees matching an exclude selector are skipped whole.

use crate::model::{Block, Document, Inline, ListItem, Sidebar};
use crate::profile::SiteProfile;
use reqwest::Url;
use scraper::{ElementRef, Html, Node, Selector};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No title found at {url} (title selector and <title> both empty).")]
    MissingTitle { url: String },

    #[error("Content node not found at {url}: selector {selector:?} matched nothing.")]
    MissingContent { selector: String, url: String },

    #[error("Content node at {url} holds no readable blocks.")]
    EmptyContent { url: String },

    #[error("Invalid selector {selector:?}: {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Parse a CSS selector or return an error (avoids panics from Selector::parse).
fn parse_selector(sel: &str) -> Result<Selector, ExtractError> {
    Selector::parse(sel).map_err(|e| ExtractError::InvalidSelector {
        selector: sel.to_string(),
        reason: e.to_string(),
    })
}

/// Strip a known site suffix from the end of a page title (e.g. " - Farnam Street"),
/// so that titles containing " - " themselves are preserved.
pub fn strip_title_site_suffix(s: &str, suffixes: &[String]) -> String {
    let mut t = s.trim();
    for suffix in suffixes {
        if t.ends_with(suffix.as_str()) {
            t = t[..t.len() - suffix.len()].trim();
            break;
        }
    }
    t.to_string()
}

/// Replace every whitespace run with a single space.
fn collapse_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_ws = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_ws {
                out.push(' ');
            }
            in_ws = true;
        } else {
            out.push(c);
            in_ws = false;
        }
    }
    out
}

fn element_text(el: ElementRef<'_>) -> String {
    collapse_ws(&el.text().collect::<String>()).trim().to_string()
}

fn first_text(doc: &Html, selector: &str) -> Result<Option<String>, ExtractError> {
    let sel = parse_selector(selector)?;
    Ok(doc
        .select(&sel)
        .map(element_text)
        .find(|s| !s.is_empty()))
}

/// Extract the readable article from `html`, fetched from `page_url`.
pub fn extract(html: &str, page_url: &Url, profile: &SiteProfile) -> Result<Document, ExtractError> {
    let doc = Html::parse_document(html);

    let title = match first_text(&doc, profile.title_selector)? {
        Some(t) => t,
        None => {
            debug!(selector = profile.title_selector, "title selector empty, using <title>");
            let suffixes: Vec<String> = [" - ", " | ", " – ", " — "]
                .iter()
                .map(|sep| format!("{}{}", sep, profile.name))
                .collect();
            first_text(&doc, "title")?
                .map(|t| strip_title_site_suffix(&t, &suffixes))
                .filter(|t| !t.is_empty())
                .ok_or_else(|| ExtractError::MissingTitle {
                    url: page_url.to_string(),
                })?
        }
    };

    let content_sel = parse_selector(profile.content_selector)?;
    let root = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| ExtractError::MissingContent {
            selector: profile.content_selector.to_string(),
            url: page_url.to_string(),
        })?;

    let excludes = profile
        .all_excludes()
        .map(parse_selector)
        .collect::<Result<Vec<_>, _>>()?;
    let walker = Walker {
        base: page_url,
        excludes,
    };
    let mut blocks = Vec::new();
    walker.blocks(root, None, &mut blocks);
    if blocks.is_empty() {
        return Err(ExtractError::EmptyContent {
            url: page_url.to_string(),
        });
    }
    debug!(blocks = blocks.len(), %page_url, "extracted");

    let published = match profile.published_selector {
        Some(sel) => first_text(&doc, sel)?,
        None => None,
    };
    let sidebar = match profile.sidebar {
        Some(s) => match (first_text(&doc, s.title_selector)?, first_text(&doc, s.body_selector)?) {
            (Some(title), Some(body)) => Some(Sidebar { title, body }),
            _ => None,
        },
        None => None,
    };

    Ok(Document {
        title,
        source_url: page_url.to_string(),
        published,
        sidebar,
        blocks,
    })
}

struct Walker<'u> {
    base: &'u Url,
    excludes: Vec<Selector>,
}

impl Walker<'_> {
    fn is_excluded(&self, el: &ElementRef<'_>) -> bool {
        self.excludes.iter().any(|s| s.matches(el))
    }

    /// Walk the children of a block container. `skip` names a child tag handled by the caller.
    fn blocks(&self, el: ElementRef<'_>, skip: Option<&str>, out: &mut Vec<Block>) {
        let mut pending: Vec<Inline> = Vec::new();
        let mut hoisted: Vec<Block> = Vec::new();
        for child in el.children() {
            match child.value() {
                Node::Text(text) => pending.push(Inline::text(collapse_ws(text))),
                Node::Element(e) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_excluded(&child_el) || skip == Some(e.name()) {
                        continue;
                    }
                    if is_inline_tag(e.name()) {
                        self.inline_element(child_el, &mut pending, &mut hoisted);
                    } else {
                        flush_paragraph(&mut pending, &mut hoisted, out);
                        self.block(child_el, out);
                    }
                }
                _ => {}
            }
        }
        flush_paragraph(&mut pending, &mut hoisted, out);
    }

    fn block(&self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        match el.value().name() {
            "h1" | "h2" => self.heading(el, 3, out),
            "h3" => self.heading(el, 4, out),
            "h4" => self.heading(el, 5, out),
            "h5" | "h6" => self.heading(el, 6, out),
            "p" => {
                let mut runs = Vec::new();
                let mut hoisted = Vec::new();
                self.inline_into(el, &mut runs, &mut hoisted);
                flush_paragraph(&mut runs, &mut hoisted, out);
            }
            "ul" | "ol" => {
                let ordered = el.value().name() == "ol";
                let mut items = Vec::new();
                self.list_items(el, &mut items);
                if !items.is_empty() {
                    out.push(Block::List { ordered, items });
                }
            }
            "blockquote" => {
                let mut inner = Vec::new();
                self.blocks(el, None, &mut inner);
                if !inner.is_empty() {
                    out.push(Block::Quote(inner));
                }
            }
            "pre" => {
                if let Some(code) = self.code_block(el) {
                    out.push(code);
                }
            }
            "img" => {
                if let Some(img) = self.image(el) {
                    out.push(img);
                }
            }
            "figure" => self.figure(el, out),
            "table" => {
                let mut html = String::new();
                self.write_html(el, &mut html);
                out.push(Block::Table(html));
            }
            "hr" | "br" | "wbr" => {}
            _ => self.blocks(el, None, out),
        }
    }

    fn heading(&self, el: ElementRef<'_>, level: u8, out: &mut Vec<Block>) {
        let text = self.text(el);
        if !text.is_empty() {
            out.push(Block::Heading { level, text });
        }
    }

    /// Collapsed, trimmed text of `el` without excluded descendants.
    fn text(&self, el: ElementRef<'_>) -> String {
        let mut raw = String::new();
        self.raw_text(el, &mut raw);
        collapse_ws(&raw).trim().to_string()
    }

    fn raw_text(&self, el: ElementRef<'_>, out: &mut String) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        if !self.is_excluded(&child_el) {
                            self.raw_text(child_el, out);
                        }
                    }
                }
                _ => {}
            }
        }
    }

    fn code_block(&self, pre: ElementRef<'_>) -> Option<Block> {
        let mut raw = String::new();
        self.raw_text(pre, &mut raw);
        let mut language = language_of(pre).or_else(|| {
            pre.children()
                .filter_map(ElementRef::wrap)
                .find(|c| c.value().name() == "code")
                .and_then(language_of)
        });
        let mut text = raw.as_str();
        if let Some((lang, body)) = unwrap_code_shortcode(text.trim()) {
            language = language.or(lang);
            text = body;
        }
        let text = text
            .strip_prefix("\r\n")
            .or_else(|| text.strip_prefix('\n'))
            .unwrap_or(text)
            .trim_end();
        if text.trim().is_empty() {
            return None;
        }
        Some(Block::CodeBlock {
            language,
            text: text.to_string(),
        })
    }

    /// Re-serialize `el` for passthrough. Excluded subtrees, comments, and `on*` handlers
    /// are dropped; `href`/`src` are resolved like links and images elsewhere.
    fn write_html(&self, el: ElementRef<'_>, out: &mut String) {
        let element = el.value();
        let name = element.name();
        let mut attrs: Vec<(&str, String)> = element
            .attrs()
            .filter(|(attr, _)| !attr.starts_with("on"))
            .filter_map(|(attr, value)| {
                let value = match attr {
                    "href" => self.resolve_link(value)?,
                    "src" => self.resolve(value, &["http", "https"])?,
                    _ => value.to_string(),
                };
                Some((attr, value))
            })
            .collect();
        attrs.sort();

        out.push('<');
        out.push_str(name);
        for (attr, value) in &attrs {
            out.push(' ');
            out.push_str(attr);
            out.push_str("=\"");
            out.push_str(&escape_html(value, true));
            out.push('"');
        }
        out.push('>');
        if is_void_tag(name) {
            return;
        }
        for child in el.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&escape_html(text, false)),
                Node::Element(_) => {
                    if let Some(child_el) = ElementRef::wrap(child) {
                        if !self.is_excluded(&child_el) {
                            self.write_html(child_el, out);
                        }
                    }
                }
                _ => {}
            }
        }
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }

    fn list_items(&self, list: ElementRef<'_>, items: &mut Vec<ListItem>) {
        for child in list.children().filter_map(ElementRef::wrap) {
            if self.is_excluded(&child) {
                continue;
            }
            if child.value().name() != "li" {
                // Stray wrappers between <ul> and <li>.
                self.list_items(child, items);
                continue;
            }
            let item = self.list_item(child);
            if !item.content.is_empty() || !item.children.is_empty() {
                items.push(item);
            }
        }
    }

    fn list_item(&self, li: ElementRef<'_>) -> ListItem {
        let mut runs = Vec::new();
        let mut children = Vec::new();
        for child in li.children() {
            match child.value() {
                Node::Text(text) => runs.push(Inline::text(collapse_ws(text))),
                Node::Element(e) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if self.is_excluded(&child_el) {
                        continue;
                    }
                    match e.name() {
                        "ul" | "ol" | "blockquote" | "pre" | "table" | "figure" => {
                            self.block(child_el, &mut children)
                        }
                        "p" => {
                            runs.push(Inline::text(" "));
                            self.inline_into(child_el, &mut runs, &mut children);
                        }
                        _ => self.inline_element(child_el, &mut runs, &mut children),
                    }
                }
                _ => {}
            }
        }
        ListItem {
            content: normalize_runs(runs),
            children,
        }
    }

    fn inline_into(&self, el: ElementRef<'_>, runs: &mut Vec<Inline>, hoisted: &mut Vec<Block>) {
        for child in el.children() {
            match child.value() {
                Node::Text(text) => runs.push(Inline::text(collapse_ws(text))),
                Node::Element(_) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    if !self.is_excluded(&child_el) {
                        self.inline_element(child_el, runs, hoisted);
                    }
                }
                _ => {}
            }
        }
    }

    /// Inline context. Images are hoisted out to follow the enclosing paragraph;
    /// any other unrecognized element contributes its children inline.
    fn inline_element(&self, el: ElementRef<'_>, runs: &mut Vec<Inline>, hoisted: &mut Vec<Block>) {
        match el.value().name() {
            "strong" | "b" => {
                let mut children = Vec::new();
                self.inline_into(el, &mut children, hoisted);
                runs.push(Inline::Bold { children });
            }
            "em" | "i" => {
                let mut children = Vec::new();
                self.inline_into(el, &mut children, hoisted);
                runs.push(Inline::Italic { children });
            }
            "code" | "kbd" | "tt" | "samp" => {
                let mut raw = String::new();
                self.raw_text(el, &mut raw);
                runs.push(Inline::Code {
                    text: collapse_ws(&raw),
                });
            }
            "a" => {
                let mut children = Vec::new();
                self.inline_into(el, &mut children, hoisted);
                match el.value().attr("href").and_then(|h| self.resolve_link(h)) {
                    Some(href) => runs.push(Inline::Link { href, children }),
                    None => runs.extend(children),
                }
            }
            "br" => runs.push(Inline::LineBreak),
            "img" => {
                if let Some(img) = self.image(el) {
                    hoisted.push(img);
                }
            }
            "wbr" => {}
            _ => self.inline_into(el, runs, hoisted),
        }
    }

    fn figure(&self, el: ElementRef<'_>, out: &mut Vec<Block>) {
        let caption = el
            .children()
            .filter_map(ElementRef::wrap)
            .find(|c| c.value().name() == "figcaption" && !self.is_excluded(c))
            .map(|c| self.text(c))
            .filter(|s| !s.is_empty());
        let mut inner = Vec::new();
        self.blocks(el, Some("figcaption"), &mut inner);
        if let Some(caption) = caption {
            let slot = inner.iter_mut().find_map(|b| match b {
                Block::Image { caption, .. } if caption.is_none() => Some(caption),
                _ => None,
            });
            match slot {
                Some(slot) => *slot = Some(caption),
                None => inner.push(Block::Paragraph(vec![Inline::Italic {
                    children: vec![Inline::text(caption)],
                }])),
            }
        }
        out.extend(inner);
    }

    fn image(&self, el: ElementRef<'_>) -> Option<Block> {
        let attrs = el.value();
        let raw = attrs
            .attr("srcset")
            .and_then(widest_srcset_candidate)
            .or_else(|| attrs.attr("src"))
            .or_else(|| attrs.attr("data-src"))?;
        let src = self.resolve(raw, &["http", "https"])?;
        Some(Block::Image {
            src,
            alt: collapse_ws(attrs.attr("alt").unwrap_or_default()).trim().to_string(),
            caption: None,
        })
    }

    fn resolve_link(&self, href: &str) -> Option<String> {
        self.resolve(href, &["http", "https", "mailto"])
    }

    /// Resolve against the page URL; None when empty or the scheme is not allowed.
    fn resolve(&self, raw: &str, schemes: &[&str]) -> Option<String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        let url = self.base.join(raw).ok()?;
        schemes
            .contains(&url.scheme())
            .then(|| url.to_string())
    }
}

/// Tags that only ever format text; everything else at block level opens a new block.
fn is_inline_tag(name: &str) -> bool {
    matches!(
        name,
        "a" | "abbr"
            | "b"
            | "bdi"
            | "bdo"
            | "br"
            | "cite"
            | "code"
            | "data"
            | "del"
            | "dfn"
            | "em"
            | "font"
            | "i"
            | "ins"
            | "kbd"
            | "label"
            | "mark"
            | "q"
            | "s"
            | "samp"
            | "small"
            | "span"
            | "strike"
            | "strong"
            | "sub"
            | "sup"
            | "time"
            | "tt"
            | "u"
            | "var"
            | "wbr"
    )
}

fn is_void_tag(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

fn escape_html(s: &str, in_attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attr => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
    out
}

fn flush_paragraph(runs: &mut Vec<Inline>, hoisted: &mut Vec<Block>, out: &mut Vec<Block>) {
    let runs = normalize_runs(std::mem::take(runs));
    if !runs.is_empty() {
        out.push(Block::Paragraph(runs));
    }
    out.append(hoisted);
}

/// Highest `w` (or `x`) descriptor wins; candidates without a descriptor count as 1.
fn widest_srcset_candidate(srcset: &str) -> Option<&str> {
    let mut best: Option<(&str, f64)> = None;
    for candidate in srcset.split(',') {
        let mut parts = candidate.split_whitespace();
        let Some(url) = parts.next() else {
            continue;
        };
        let size = parts
            .next()
            .and_then(|d| d.strip_suffix('w').or_else(|| d.strip_suffix('x')))
            .and_then(|n| n.parse::<f64>().ok())
            .unwrap_or(1.0);
        if best.map_or(true, |(_, b)| size > b) {
            best = Some((url, size));
        }
    }
    best.map(|(url, _)| url)
}

/// `class="language-rust"`, `class="lang-rust"`, or SyntaxHighlighter's `class="brush: rust; ..."`.
fn language_of(el: ElementRef<'_>) -> Option<String> {
    let class = el.value().attr("class")?;
    if let Some(rest) = class.split("brush:").nth(1) {
        let lang = rest.split(';').next().unwrap_or_default().trim();
        if !lang.is_empty() {
            return Some(lang.to_string());
        }
    }
    class
        .split_whitespace()
        .find_map(|c| c.strip_prefix("language-").or_else(|| c.strip_prefix("lang-")))
        .filter(|l| !l.is_empty())
        .map(String::from)
}

/// WordPress `[code lang=python]...[/code]` shortcode left inside a `<pre>`.
fn unwrap_code_shortcode(s: &str) -> Option<(Option<String>, &str)> {
    let rest = s.strip_prefix("[code")?;
    let close = rest.find(']')?;
    let attrs = &rest[..close];
    if !attrs.is_empty() && !attrs.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest[close + 1..].strip_suffix("[/code]")?;
    let lang = attrs
        .split_whitespace()
        .find_map(|a| a.strip_prefix("lang=").or_else(|| a.strip_prefix("language=")))
        .map(|l| l.trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|l| !l.is_empty());
    Some((lang, body))
}

/// Merge adjacent text, drop empty runs, and trim whitespace and line breaks at both ends.
fn normalize_runs(runs: Vec<Inline>) -> Vec<Inline> {
    let mut out: Vec<Inline> = Vec::with_capacity(runs.len());
    for run in runs {
        let run = match run {
            Inline::Bold { children } => Inline::Bold {
                children: normalize_inner(children),
            },
            Inline::Italic { children } => Inline::Italic {
                children: normalize_inner(children),
            },
            Inline::Link { href, children } => Inline::Link {
                href,
                children: normalize_inner(children),
            },
            other => other,
        };
        if let Inline::Text { text } = &run {
            if let Some(Inline::Text { text: prev }) = out.last_mut() {
                prev.push_str(text);
                *prev = collapse_ws(prev);
                continue;
            }
        }
        if !is_empty_run(&run) {
            out.push(run);
        }
    }
    trim_start_runs(&mut out);
    trim_end_runs(&mut out);
    out
}

fn is_empty_run(run: &Inline) -> bool {
    match run {
        Inline::Text { text } => text.is_empty(),
        Inline::Code { text } => text.trim().is_empty(),
        Inline::Bold { children } | Inline::Italic { children } | Inline::Link { children, .. } => {
            children.is_empty()
        }
        Inline::LineBreak => false,
    }
}

/// Like [normalize_runs] but keeps edge whitespace, which separates the run from its neighbours.
fn normalize_inner(children: Vec<Inline>) -> Vec<Inline> {
    let blank = children
        .iter()
        .all(|c| matches!(c, Inline::Text { text } if text.trim().is_empty()));
    if blank {
        return children
            .into_iter()
            .next()
            .map(|_| vec![Inline::text(" ")])
            .unwrap_or_default();
    }
    let leading = matches!(children.first(), Some(Inline::Text { text }) if text.starts_with(' '));
    let trailing = matches!(children.last(), Some(Inline::Text { text }) if text.ends_with(' '));
    let mut out = normalize_runs(children);
    if leading {
        out.insert(0, Inline::text(" "));
    }
    if trailing {
        out.push(Inline::text(" "));
    }
    out
}

fn trim_start_runs(runs: &mut Vec<Inline>) {
    while let Some(first) = runs.first_mut() {
        match first {
            Inline::Text { text } => {
                let trimmed = text.trim_start();
                if trimmed.is_empty() {
                    runs.remove(0);
                    continue;
                }
                *text = trimmed.to_string();
            }
            Inline::LineBreak => {
                runs.remove(0);
                continue;
            }
            Inline::Bold { children }
            | Inline::Italic { children }
            | Inline::Link { children, .. } => {
                trim_start_runs(children);
                if children.is_empty() {
                    runs.remove(0);
                    continue;
                }
            }
            Inline::Code { .. } => {}
        }
        break;
    }
}

fn trim_end_runs(runs: &mut Vec<Inline>) {
    while let Some(last) = runs.last_mut() {
        match last {
            Inline::Text { text } => {
                let trimmed = text.trim_end();
                if trimmed.is_empty() {
                    runs.pop();
                    continue;
                }
                *text = trimmed.to_string();
            }
            Inline::LineBreak => {
                runs.pop();
                continue;
            }
            Inline::Bold { children }
            | Inline::Italic { children }
            | Inline::Link { children, .. } => {
                trim_end_runs(children);
                if children.is_empty() {
                    runs.pop();
                    continue;
                }
            }
            Inline::Code { .. } => {}
        }
        break;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{lookup, ProfileError};
    use std::error::Error;

    const FS_URL: &str = "https://fs.blog/2018/04/first-principles/";

    fn extract_fs(html: &str) -> Result<Document, Box<dyn Error>> {
        let url = Url::parse(FS_URL)?;
        let profile = lookup(FS_URL)?;
        Ok(extract(html, &url, profile)?)
    }

    fn text(s: &str) -> Inline {
        Inline::text(s)
    }

    const FS_ARTICLE: &str = r#"<!DOCTYPE html><html><head><title>First Principles - Farnam Street</title></head><body>
<header id="masthead"><h1 class="site-title">Farnam Street</h1></header>
<article>
<h1 class="entry-title">First Principles: The Building Blocks of True Knowledge</h1>
<time class="entry-date published">April 2018</time>
<div class="entry-content">
<p>First-principles thinking is one of the <strong>best ways</strong> to reverse-engineer
   complicated problems.</p>
<div class="sharedaddy"><p>Share this on Twitter</p></div>
<h2>Socratic Questioning</h2>
<ul>
  <li>Clarifying your thinking</li>
  <li>Challenging assumptions
    <ol><li>Why do I think this?</li></ol>
  </li>
</ul>
<blockquote><p>I don't know what's the matter with people.</p><blockquote><p>Nested.</p></blockquote></blockquote>
<pre class="language-python">def f():
    return 1
</pre>
<figure><img src="/wp-content/uploads/musk.jpg" alt="Elon Musk"><figcaption>Musk on batteries</figcaption></figure>
<script>alert("x")</script>
</div>
</article>
<footer class="site-footer">Copyright</footer>
</body></html>"#;

    #[test]
    fn fs_blog_article_blocks_in_document_order() -> Result<(), Box<dyn Error>> {
        let doc = extract_fs(FS_ARTICLE)?;
        assert_eq!(doc.title, "First Principles: The Building Blocks of True Knowledge");
        assert_eq!(doc.published.as_deref(), Some("April 2018"));
        assert_eq!(doc.source_url, FS_URL);

        let kinds: Vec<&str> = doc
            .blocks
            .iter()
            .map(|b| match b {
                Block::Heading { .. } => "heading",
                Block::Paragraph(_) => "paragraph",
                Block::List { .. } => "list",
                Block::Image { .. } => "image",
                Block::CodeBlock { .. } => "code",
                Block::Quote(_) => "quote",
                Block::Table(_) => "table",
            })
            .collect();
        assert_eq!(kinds, ["paragraph", "heading", "list", "quote", "code", "image"]);

        assert_eq!(
            doc.blocks[0],
            Block::Paragraph(vec![
                text("First-principles thinking is one of the "),
                Inline::Bold {
                    children: vec![text("best ways")]
                },
                text(" to reverse-engineer complicated problems."),
            ])
        );
        assert_eq!(
            doc.blocks[1],
            Block::Heading {
                level: 3,
                text: "Socratic Questioning".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn excluded_subtrees_and_scripts_are_dropped() -> Result<(), Box<dyn Error>> {
        let doc = extract_fs(FS_ARTICLE)?;
        let all = format!("{:?}", doc.blocks);
        assert!(!all.contains("Share this"));
        assert!(!all.contains("alert"));
        assert!(!all.contains("Copyright"));
        Ok(())
    }

    #[test]
    fn nested_lists_and_quotes_keep_their_nesting() -> Result<(), Box<dyn Error>> {
        let doc = extract_fs(FS_ARTICLE)?;
        let Block::List { ordered, items } = &doc.blocks[2] else {
            return Err("expected list".into());
        };
        assert!(!ordered);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, vec![text("Clarifying your thinking")]);
        assert_eq!(items[1].content, vec![text("Challenging assumptions")]);
        match items[1].children.as_slice() {
            [Block::List { ordered: true, items: inner }] => {
                assert_eq!(inner[0].content, vec![text("Why do I think this?")]);
            }
            other => return Err(format!("expected nested ordered list, got {:?}", other).into()),
        }

        let Block::Quote(quote) = &doc.blocks[3] else {
            return Err("expected quote".into());
        };
        assert_eq!(quote.len(), 2);
        assert!(matches!(&quote[1], Block::Quote(inner) if inner.len() == 1));
        Ok(())
    }

    #[test]
    fn code_and_figure_blocks() -> Result<(), Box<dyn Error>> {
        let doc = extract_fs(FS_ARTICLE)?;
        assert_eq!(
            doc.blocks[4],
            Block::CodeBlock {
                language: Some("python".to_string()),
                text: "def f():\n    return 1".to_string()
            }
        );
        assert_eq!(
            doc.blocks[5],
            Block::Image {
                src: "https://fs.blog/wp-content/uploads/musk.jpg".to_string(),
                alt: "Elon Musk".to_string(),
                caption: Some("Musk on batteries".to_string())
            }
        );
        Ok(())
    }

    #[test]
    fn wrappers_flatten_and_loose_text_becomes_paragraph() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="entry-content">
<div><section>Loose <em>text</em> here<p>Inner</p></section></div>
<custom-widget><span>kept</span></custom-widget>
</div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph(vec![
                    text("Loose "),
                    Inline::Italic {
                        children: vec![text("text")]
                    },
                    text(" here"),
                ]),
                Block::Paragraph(vec![text("Inner")]),
                Block::Paragraph(vec![text("kept")]),
            ]
        );
        Ok(())
    }

    #[test]
    fn links_resolve_against_page_url() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="entry-content">
<p>See <a href="/mental-models/">models</a>, <a href="javascript:void(0)">this</a> and <a>bare</a>.</p>
</div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![
                text("See "),
                Inline::Link {
                    href: "https://fs.blog/mental-models/".to_string(),
                    children: vec![text("models")]
                },
                text(", this and bare."),
            ])]
        );
        Ok(())
    }

    #[test]
    fn image_inside_paragraph_follows_it() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="entry-content">
<p>Before <img src="a.png" srcset="a-300.png 300w, a-1024.png 1024w, a-768.png 768w" alt="A"> after</p>
</div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks,
            vec![
                Block::Paragraph(vec![text("Before after")]),
                Block::Image {
                    src: "https://fs.blog/2018/04/first-principles/a-1024.png".to_string(),
                    alt: "A".to_string(),
                    caption: None
                },
            ]
        );
        Ok(())
    }

    #[test]
    fn line_breaks_inside_paragraph_are_kept_but_trimmed_at_edges() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="entry-content">
<p><br>one<br>two<br></p></div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks,
            vec![Block::Paragraph(vec![text("one"), Inline::LineBreak, text("two")])]
        );
        Ok(())
    }

    #[test]
    fn title_falls_back_to_document_title_without_site_suffix() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><head><title>Mental Models - Farnam Street</title></head><body>
<div class="entry-content"><p>Body</p></div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(doc.title, "Mental Models");
        Ok(())
    }

    #[test]
    fn missing_title_is_an_error() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><div class="entry-content"><p>Body</p></div></body></html>"#;
        match extract_fs(html) {
            Err(e) => match e.downcast_ref::<ExtractError>() {
                Some(ExtractError::MissingTitle { .. }) => Ok(()),
                _ => Err(format!("expected MissingTitle, got {}", e).into()),
            },
            Ok(doc) => Err(format!("expected error, got {:?}", doc).into()),
        }
    }

    #[test]
    fn missing_content_node_is_an_error() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="post"><p>Body</p></div></body></html>"#;
        match extract_fs(html) {
            Err(e) => match e.downcast_ref::<ExtractError>() {
                Some(ExtractError::MissingContent { selector, .. }) if selector == ".entry-content" => {
                    Ok(())
                }
                _ => Err(format!("expected MissingContent, got {}", e).into()),
            },
            Ok(doc) => Err(format!("expected error, got {:?}", doc).into()),
        }
    }

    #[test]
    fn malformed_html_is_tolerated() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1>T</h1><div class="entry-content"><p>One<p>Two <b>bold"#;
        let doc = extract_fs(html)?;
        assert_eq!(doc.blocks.len(), 2);
        assert_eq!(doc.blocks[0], Block::Paragraph(vec![text("One")]));
        Ok(())
    }

    #[test]
    fn excludes_apply_inside_tables_headings_captions_and_code() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1 class="entry-title">T</h1><div class="entry-content">
<h2>Costs<script>track()</script><span class="sharedaddy">Share</span></h2>
<table><tr><td onclick="go()"><a href="/rates">1</a><script>alert(1)</script><div class="sharedaddy">Share this</div></td></tr></table>
<figure><img src="/a.png" alt=""><figcaption>Chart<button>Pin</button></figcaption></figure>
<pre><code>let x = 1;<script>bad()</script></code></pre>
</div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks[0],
            Block::Heading {
                level: 3,
                text: "Costs".to_string()
            }
        );
        assert_eq!(
            doc.blocks[1],
            Block::Table(
                "<table><tbody><tr><td><a href=\"https://fs.blog/rates\">1</a></td></tr></tbody></table>"
                    .to_string()
            )
        );
        assert_eq!(
            doc.blocks[2],
            Block::Image {
                src: "https://fs.blog/a.png".to_string(),
                alt: String::new(),
                caption: Some("Chart".to_string())
            }
        );
        assert_eq!(
            doc.blocks[3],
            Block::CodeBlock {
                language: None,
                text: "let x = 1;".to_string()
            }
        );
        Ok(())
    }

    #[test]
    fn table_text_and_attributes_are_escaped() -> Result<(), Box<dyn Error>> {
        let html = r#"<html><body><h1 class="entry-title">T</h1><div class="entry-content">
<table title="a &quot;b&quot;"><tr><td>x &lt; y &amp; z</td></tr></table></div></body></html>"#;
        let doc = extract_fs(html)?;
        assert_eq!(
            doc.blocks,
            vec![Block::Table(
                "<table title=\"a &quot;b&quot;\"><tbody><tr><td>x &lt; y &amp; z</td></tr></tbody></table>"
                    .to_string()
            )]
        );
        Ok(())
    }

    #[test]
    fn unintended_consequences_takes_content_from_page_wrapper() -> Result<(), Box<dyn Error>> {
        let page = "https://unintendedconsequenc.es/inversion/";
        let html = r#"<html><head><title>Inversion - Unintended Consequences</title></head><body>
<div class="entry-content"><p>Promo outside the page wrapper.</p></div>
<div id="page">
<h1>Inversion <em>explained</em></h1>
<div class="entry-content"><p>Think backwards.</p>
<div class="jp-relatedposts"><p>Related</p></div>
<div id="comments"><p>Nice post!</p></div></div>
</div></body></html>"#;
        let profile = lookup(page)?;
        let doc = extract(html, &Url::parse(page)?, profile)?;
        assert_eq!(doc.title, "Inversion explained");
        assert_eq!(doc.blocks, vec![Block::Paragraph(vec![text("Think backwards.")])]);
        Ok(())
    }

    #[test]
    fn untools_sidebar_and_title() -> Result<(), Box<dyn Error>> {
        let page = "https://untools.co/first-principles";
        let html = r#"<html><body>
<div class="article-module--top--a1b2"><h2>First principles</h2>
<span class="tag-module--tag--x9">Problem solving</span>
<div class="article-module--when-useful--z3">Useful when you are stuck.</div></div>
<div class="article-module--content--c4"><p>Break it down.</p>
<div class="article-module--sources--q"><p>Sources: <a href="https://fs.blog/">fs</a></p></div></div>
</body></html>"#;
        let profile = lookup(page)?;
        let doc = extract(html, &Url::parse(page)?, profile)?;
        assert_eq!(doc.title, "First principles");
        assert_eq!(
            doc.sidebar,
            Some(Sidebar {
                title: "Problem solving".to_string(),
                body: "Useful when you are stuck.".to_string()
            })
        );
        assert_eq!(doc.blocks.len(), 2);
        Ok(())
    }

    #[test]
    fn morning_paper_code_shortcode_is_unwrapped() -> Result<(), Box<dyn Error>> {
        let page = "https://blog.acolyer.org/2019/01/01/paper/";
        let html = r#"<html><body><h1 class="entry-title">Paper</h1><div class="entry-content">
<pre>[code lang=rust]fn main() {}[/code]</pre></div></body></html>"#;
        let profile = lookup(page)?;
        let doc = extract(html, &Url::parse(page)?, profile)?;
        assert_eq!(
            doc.blocks,
            vec![Block::CodeBlock {
                language: Some("rust".to_string()),
                text: "fn main() {}".to_string()
            }]
        );
        Ok(())
    }

    #[test]
    fn unsupported_site_never_reaches_extraction() {
        assert!(matches!(
            lookup("https://unsupported-site.example/post"),
            Err(ProfileError::UnsupportedSite { .. })
        ));
    }

    #[test]
    fn widest_srcset_candidate_picks_largest_descriptor() {
        assert_eq!(
            widest_srcset_candidate("a.png 300w, b.png 1200w, c.png 800w"),
            Some("b.png")
        );
        assert_eq!(widest_srcset_candidate("a.png, b.png 2x"), Some("b.png"));
        assert_eq!(widest_srcset_candidate(""), None);
    }

    #[test]
    fn language_of_brush_class() {
        let html = Html::parse_fragment(r#"<pre class="brush: python; title: ; notranslate">x</pre>"#);
        let sel = Selector::parse("pre").unwrap();
        let pre = html.select(&sel).next().unwrap();
        assert_eq!(language_of(pre).as_deref(), Some("python"));
    }

    #[test]
    fn strip_title_site_suffix_removes_trailing_suffix_only() {
        let suffixes = vec![" - Farnam Street".to_string()];
        assert_eq!(
            strip_title_site_suffix("Chapter - One - Farnam Street", &suffixes),
            "Chapter - One"
        );
        assert_eq!(strip_title_site_suffix("Plain", &suffixes), "Plain");
    }

    #[test]
    fn collapse_ws_squeezes_runs() {
        assert_eq!(collapse_ws("a \n\t b  c"), "a b c");
    }
}
