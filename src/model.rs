//! Structured document model shared by the extractor and the markup transformer.
//!
//! The extractor is the only producer of [Document]; [crate::markup] is the only consumer.
//! Nothing here knows about selectors or asciidoc syntax.

/// Readable content of one web page, in source reading order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub title: String,
    /// Absolute URL the page was fetched from.
    pub source_url: String,
    /// Publication date as printed on the page, if the site profile knows where to look.
    pub published: Option<String>,
    pub sidebar: Option<Sidebar>,
    pub blocks: Vec<Block>,
}

/// Short summary box rendered above the chapter body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sidebar {
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// `level` is the section depth inside the chapter; the chapter title itself is depth 2.
    Heading { level: u8, text: String },
    Paragraph(Vec<Inline>),
    List { ordered: bool, items: Vec<ListItem> },
    Image {
        src: String,
        alt: String,
        caption: Option<String>,
    },
    CodeBlock {
        language: Option<String>,
        text: String,
    },
    Quote(Vec<Block>),
    /// Table HTML, re-serialized without excluded subtrees and passed through to the ebook.
    Table(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListItem {
    pub content: Vec<Inline>,
    /// Nested lists (and any other blocks) that belong to this item.
    pub children: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text { text: String },
    Bold { children: Vec<Inline> },
    Italic { children: Vec<Inline> },
    Code { text: String },
    Link { href: String, children: Vec<Inline> },
    LineBreak,
}

impl Inline {
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text { text: s.into() }
    }
}

/// One rendered ebook section, produced from exactly one configured URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub source_url: String,
    pub title: String,
    /// Asciidoc text of the whole chapter, including its `==` title line.
    pub markup: String,
    /// Path relative to the project directory, e.g. `chapters/first-principles.asciidoc`.
    pub file_name: String,
}
