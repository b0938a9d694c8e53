use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Cleaned, typed content of one section page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CleanedContent {
    /// Page the content was extracted from; references were resolved against it
    pub source_url: String,
    pub title: String,
    pub body: Vec<ContentBlock>,
    pub diagnostics: CleanDiagnostics,
}

/// One block-level unit of section content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum ContentBlock {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph { inlines: Vec<Inline> },
    Image { image: ImageRef },
    Table { table: TableData },
    Code {
        language: Option<String>,
        text: String,
        /// Links and images found inside the listing, resolved like any other
        #[serde(default)]
        references: Vec<Inline>,
    },
    List { ordered: bool, items: Vec<ListItem> },
}

/// Inline run inside a heading, paragraph, list item or table cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum Inline {
    Text { text: String },
    Code { text: String },
    LineBreak,
    /// Hyperlink whose `href` is always absolute
    Link { href: String, content: Vec<Inline> },
    Image { image: ImageRef },
    /// A reference that could not be resolved, kept as plain text
    Unresolved { text: String, reference: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImageRef {
    /// Absolute image URL
    pub src: String,
    pub alt: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableData {
    pub caption: Option<Vec<Inline>>,
    pub rows: Vec<TableRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableRow {
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TableCell {
    pub header: bool,
    pub colspan: u32,
    pub rowspan: u32,
    pub inlines: Vec<Inline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ListItem {
    pub blocks: Vec<ContentBlock>,
}

/// What the cleaner did to a page, returned instead of logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CleanDiagnostics {
    /// Chrome subtrees removed by signature match
    pub removed_elements: usize,
    pub resolved_references: usize,
    pub unresolved_references: usize,
    /// Unrecognized elements whose text was folded into the enclosing block
    pub flattened_elements: usize,
}

impl CleanedContent {
    pub const fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Every link target and image source in document order.
    ///
    /// Unresolved references are not included; see [`Self::unresolved_references`].
    pub fn references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.body {
            block.collect_references(&mut out);
        }
        out
    }

    /// Original text of every reference that failed resolution
    pub fn unresolved_references(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for block in &self.body {
            block.visit_inlines(true, &mut |inline| {
                if let Inline::Unresolved { reference, .. } = inline {
                    out.push(reference.as_str());
                }
            });
        }
        out
    }

    /// Concatenated visible text of the body, mostly useful for previews and tests
    pub fn plain_text(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        for block in &self.body {
            let mut text = String::new();
            block.for_each_inline(&mut |inline| match inline {
                Inline::Text { text: t } | Inline::Code { text: t } | Inline::Unresolved { text: t, .. } => {
                    text.push_str(t);
                }
                Inline::LineBreak => text.push('\n'),
                Inline::Link { .. } | Inline::Image { .. } => {}
            });
            if let ContentBlock::Code { text: code, .. } = block {
                text.push_str(code);
            }
            if !text.is_empty() {
                parts.push(text);
            }
        }
        parts.join("\n")
    }
}

impl ContentBlock {
    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Image { image } => out.push(&image.src),
            Self::Heading { inlines, .. } | Self::Paragraph { inlines } => {
                inlines.iter().for_each(|i| i.collect_references(out));
            }
            Self::Table { table } => {
                for inline in table.inlines() {
                    inline.collect_references(out);
                }
            }
            Self::List { items, .. } => {
                for block in items.iter().flat_map(|item| &item.blocks) {
                    block.collect_references(out);
                }
            }
            Self::Code { references, .. } => {
                references.iter().for_each(|i| i.collect_references(out));
            }
        }
    }

    /// Visit every visible inline in this block, depth first, including link content.
    ///
    /// References lifted out of code listings are not visited; their text is
    /// already part of the listing.
    pub fn for_each_inline<'a>(&'a self, visit: &mut dyn FnMut(&'a Inline)) {
        self.visit_inlines(false, visit);
    }

    fn visit_inlines<'a>(&'a self, with_code_references: bool, visit: &mut dyn FnMut(&'a Inline)) {
        match self {
            Self::Heading { inlines, .. } | Self::Paragraph { inlines } => {
                inlines.iter().for_each(|i| i.walk(visit));
            }
            Self::Table { table } => table.inlines().for_each(|i| i.walk(visit)),
            Self::List { items, .. } => {
                for block in items.iter().flat_map(|item| &item.blocks) {
                    block.visit_inlines(with_code_references, visit);
                }
            }
            Self::Code { references, .. } if with_code_references => {
                references.iter().for_each(|i| i.walk(visit));
            }
            Self::Image { .. } | Self::Code { .. } => {}
        }
    }
}

impl TableData {
    /// Caption inlines followed by cell inlines in row order
    fn inlines(&self) -> impl Iterator<Item = &Inline> {
        self.caption
            .iter()
            .flatten()
            .chain(self.rows.iter().flat_map(|r| &r.cells).flat_map(|c| &c.inlines))
    }
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Inline)) {
        visit(self);
        if let Self::Link { content, .. } = self {
            content.iter().for_each(|i| i.walk(visit));
        }
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Link { href, content } => {
                out.push(href);
                content.iter().for_each(|i| i.collect_references(out));
            }
            Self::Image { image } => out.push(&image.src),
            _ => {}
        }
    }
}
