//! Section content cleaner
//!
//! Locates the content region of a section page, detaches site chrome from
//! it, and walks what remains into typed [`ContentBlock`]s. Every link and
//! image reference is rewritten against the page URL; references that cannot
//! be resolved become [`Inline::Unresolved`] markers.

use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;
use tracing::debug;
use url::Url;

use super::config::ContentSignature;
use super::{
    CompiledSignature, ContextualParser, ParseContext, ReaderError, ReaderResult, collapse_whitespace, element_text,
};
use crate::domain::content::{
    CleanDiagnostics, CleanedContent, ContentBlock, ImageRef, Inline, ListItem, TableCell, TableData, TableRow,
};
use crate::infrastructure::url_resolver;

const MAX_COLSPAN: u32 = 1000;
const MAX_ROWSPAN: u32 = 65534;

/// Cleaner for section pages
#[derive(Debug, Clone)]
pub struct ContentCleaner {
    region: CompiledSignature,
    chrome: CompiledSignature,
    title: CompiledSignature,
    page_title: CompiledSignature,
}

impl ContentCleaner {
    /// Create a cleaner with the default site signatures
    pub fn new() -> ReaderResult<Self> {
        Self::with_config(&ContentSignature::default())
    }

    pub fn with_config(signature: &ContentSignature) -> ReaderResult<Self> {
        Ok(Self {
            region: CompiledSignature::compile(&signature.region)?,
            chrome: CompiledSignature::compile_optional(&signature.chrome)?,
            title: CompiledSignature::compile_optional(&signature.title)?,
            page_title: CompiledSignature::compile_optional(&signature.page_title)?,
        })
    }

    /// Clean one section page fetched from `source_url`
    pub fn clean_section(&self, markup: &str, source_url: &Url) -> ReaderResult<CleanedContent> {
        self.parse_with_context(markup, &ParseContext::new(source_url.clone()))
    }

    /// Chrome elements inside the region, outermost matches only
    fn chrome_within<'a>(&self, region: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        let mut matched = Vec::new();
        let mut seen = HashSet::new();

        for selector in self.chrome.iter() {
            for element in region.select(selector) {
                if element.id() != region.id() && seen.insert(element.id()) {
                    matched.push(element);
                }
            }
        }

        matched.retain(|element| !element.ancestors().any(|ancestor| seen.contains(&ancestor.id())));
        matched
    }
}

impl ContextualParser for ContentCleaner {
    type Output = CleanedContent;

    fn parse_with_context(&self, markup: &str, context: &ParseContext) -> ReaderResult<Self::Output> {
        let source_url = &context.page_url;
        let region_missing = || ReaderError::ContentRegionNotFound {
            url: source_url.to_string(),
            tried_selectors: self.region.sources(),
        };

        let mut html = Html::parse_document(markup);

        let region = self
            .region
            .iter()
            .find_map(|selector| html.select(selector).next())
            .ok_or_else(region_missing)?;
        let region_id = region.id();

        let chrome = self.chrome_within(region);
        let chrome_ids: HashSet<_> = chrome.iter().map(|element| element.id()).collect();
        let removed_elements = chrome.len();

        // The first heading outside chrome is the section title and leaves the body,
        // unless it has no text to give.
        let heading = self
            .title
            .iter()
            .filter_map(|selector| {
                region.select(selector).find(|candidate| {
                    !chrome_ids.contains(&candidate.id())
                        && !candidate.ancestors().any(|ancestor| chrome_ids.contains(&ancestor.id()))
                })
            })
            .next();
        let heading_title = heading.map(|element| element_text(&element)).filter(|t| !t.is_empty());
        let heading_id = heading.filter(|_| heading_title.is_some()).map(|element| element.id());

        let title = heading_title
            .or_else(|| {
                self.page_title
                    .iter()
                    .filter_map(|selector| html.select(selector).next())
                    .map(|element| element_text(&element))
                    .find(|text| !text.is_empty())
            })
            .or_else(|| context.fallback_title.clone())
            .unwrap_or_default();

        for id in chrome_ids.into_iter().chain(heading_id) {
            if let Some(mut node) = html.tree.get_mut(id) {
                node.detach();
            }
        }

        let region = html
            .tree
            .get(region_id)
            .and_then(ElementRef::wrap)
            .ok_or_else(region_missing)?;

        let mut builder = BlockBuilder::new(source_url);
        let body = builder.blocks_of(region);
        let diagnostics = CleanDiagnostics {
            removed_elements: removed_elements + builder.diagnostics.removed_elements,
            ..builder.diagnostics
        };

        debug!(
            "Cleaned {}: {} blocks, {} chrome removed, {} resolved, {} unresolved, {} flattened",
            source_url,
            body.len(),
            diagnostics.removed_elements,
            diagnostics.resolved_references,
            diagnostics.unresolved_references,
            diagnostics.flattened_elements
        );

        Ok(CleanedContent {
            source_url: source_url.to_string(),
            title,
            body,
            diagnostics,
        })
    }
}

/// How an element takes part in the block walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementClass {
    Heading(u8),
    Paragraph,
    Preformatted,
    List { ordered: bool },
    Table,
    Rule,
    Container,
    Image,
    LineBreak,
    Link,
    Code,
    Inline,
    Ignored,
    Unknown,
}

impl ElementClass {
    fn of(element: &ElementRef<'_>) -> Self {
        match element.value().name() {
            "h1" => Self::Heading(1),
            "h2" => Self::Heading(2),
            "h3" => Self::Heading(3),
            "h4" => Self::Heading(4),
            "h5" => Self::Heading(5),
            "h6" => Self::Heading(6),
            "p" => Self::Paragraph,
            "pre" => Self::Preformatted,
            "ul" => Self::List { ordered: false },
            "ol" => Self::List { ordered: true },
            "table" => Self::Table,
            "hr" => Self::Rule,
            "div" | "section" | "article" | "main" | "aside" | "blockquote" | "figure" | "figcaption" | "header"
            | "footer" | "nav" | "details" | "summary" | "dl" | "dt" | "dd" | "li" | "center" | "address" | "form"
            | "fieldset" | "caption" | "thead" | "tbody" | "tfoot" | "tr" | "td" | "th" => Self::Container,
            "img" => Self::Image,
            "br" => Self::LineBreak,
            "a" => Self::Link,
            "code" | "kbd" | "samp" | "tt" => Self::Code,
            "span" | "strong" | "b" | "em" | "i" | "u" | "s" | "del" | "ins" | "mark" | "small" | "sub" | "sup"
            | "abbr" | "cite" | "q" | "time" | "var" | "dfn" | "label" | "bdi" | "bdo" | "font" | "wbr" => Self::Inline,
            "script" | "style" | "noscript" | "template" | "head" | "meta" | "link" => Self::Ignored,
            _ => Self::Unknown,
        }
    }

    const fn is_block(self) -> bool {
        matches!(
            self,
            Self::Heading(_)
                | Self::Paragraph
                | Self::Preformatted
                | Self::List { .. }
                | Self::Table
                | Self::Rule
                | Self::Container
        )
    }
}

/// Walks a cleaned region into blocks, counting what it did
struct BlockBuilder<'u> {
    base: &'u Url,
    diagnostics: CleanDiagnostics,
}

impl<'u> BlockBuilder<'u> {
    fn new(base: &'u Url) -> Self {
        Self {
            base,
            diagnostics: CleanDiagnostics::default(),
        }
    }

    fn blocks_of(&mut self, parent: ElementRef<'_>) -> Vec<ContentBlock> {
        let mut blocks = Vec::new();
        let mut pending = Vec::new();

        for child in parent.children() {
            let element = match child.value() {
                Node::Text(text) => {
                    pending.push(Inline::text(collapse_whitespace(text)));
                    continue;
                }
                Node::Element(_) => match ElementRef::wrap(child) {
                    Some(element) => element,
                    None => continue,
                },
                _ => continue,
            };

            let class = ElementClass::of(&element);
            if class.is_block() || (class == ElementClass::Unknown && has_block_descendant(&element)) {
                flush_paragraph(&mut pending, &mut blocks);
            }

            match class {
                ElementClass::Heading(level) => {
                    let inlines = normalize_inlines(self.inlines_of(element));
                    if !inlines.is_empty() {
                        blocks.push(ContentBlock::Heading { level, inlines });
                    }
                }
                ElementClass::Paragraph => {
                    let inlines = self.inlines_of(element);
                    blocks.extend(paragraph_blocks(inlines));
                }
                ElementClass::Preformatted => blocks.extend(self.code_block(element)),
                ElementClass::List { ordered } => blocks.extend(self.list(element, ordered)),
                ElementClass::Table => {
                    let table = self.table(element);
                    if !table.rows.is_empty() || table.caption.is_some() {
                        blocks.push(ContentBlock::Table { table });
                    }
                }
                ElementClass::Rule => {}
                ElementClass::Ignored => self.drop_element(&element),
                ElementClass::Container => blocks.extend(self.blocks_of(element)),
                ElementClass::Unknown if has_block_descendant(&element) => blocks.extend(self.blocks_of(element)),
                _ => pending.extend(self.inline_element(element)),
            }
        }

        flush_paragraph(&mut pending, &mut blocks);
        blocks
    }

    fn inlines_of(&mut self, parent: ElementRef<'_>) -> Vec<Inline> {
        let mut inlines = Vec::new();
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => inlines.push(Inline::text(collapse_whitespace(text))),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        inlines.extend(self.inline_element(element));
                    }
                }
                _ => {}
            }
        }
        inlines
    }

    /// One element in inline position
    fn inline_element(&mut self, element: ElementRef<'_>) -> Vec<Inline> {
        match ElementClass::of(&element) {
            ElementClass::Link => self.link(element),
            ElementClass::Image => self.image(element).into_iter().collect(),
            ElementClass::LineBreak => vec![Inline::LineBreak],
            ElementClass::Code if has_reference(&element) => {
                self.inlines_of(element).into_iter().map(as_code).collect()
            }
            ElementClass::Code => {
                let text = element_text(&element);
                if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Inline::Code { text }]
                }
            }
            ElementClass::Inline => self.inlines_of(element),
            ElementClass::Rule => Vec::new(),
            ElementClass::Ignored => {
                self.drop_element(&element);
                Vec::new()
            }
            ElementClass::Unknown => {
                self.diagnostics.flattened_elements += 1;
                self.inlines_of(element)
            }
            // Block content where only inlines fit (e.g. table cells) keeps its line structure.
            _ => {
                let mut inlines = vec![Inline::LineBreak];
                inlines.extend(self.inlines_of(element));
                inlines.push(Inline::LineBreak);
                inlines
            }
        }
    }

    fn link(&mut self, element: ElementRef<'_>) -> Vec<Inline> {
        let content = self.inlines_of(element);
        let Some(href) = element.value().attr("href").map(str::trim).filter(|h| !h.is_empty()) else {
            return content;
        };
        if is_script_reference(href) {
            return content;
        }

        match url_resolver::resolve(self.base, href) {
            Ok(url) => {
                self.diagnostics.resolved_references += 1;
                let mut content = normalize_inlines(content);
                if content.is_empty() {
                    content.push(Inline::text(url.as_str()));
                }
                vec![Inline::Link {
                    href: url.to_string(),
                    content,
                }]
            }
            Err(e) => {
                debug!("Keeping unresolved link as text: {}", e);
                self.diagnostics.unresolved_references += 1;
                let text = element_text(&element);
                let mut inlines = vec![Inline::Unresolved {
                    text: if text.is_empty() { href.to_string() } else { text },
                    reference: href.to_string(),
                }];
                // Images inside the link were already resolved and counted.
                inlines.extend(
                    content
                        .into_iter()
                        .filter(|inline| matches!(inline, Inline::Image { .. } | Inline::Unresolved { .. })),
                );
                inlines
            }
        }
    }

    /// Non-content element outside the chrome signatures, e.g. a stray `script`
    fn drop_element(&mut self, element: &ElementRef<'_>) {
        debug!("Dropping <{}> from the body", element.value().name());
        self.diagnostics.removed_elements += 1;
    }

    fn image(&mut self, element: ElementRef<'_>) -> Option<Inline> {
        let value = element.value();
        let Some(src) = ["src", "data-src"]
            .iter()
            .filter_map(|attr| value.attr(attr))
            .map(str::trim)
            .find(|src| !src.is_empty())
        else {
            debug!("Dropping image without a source");
            return None;
        };

        let alt = value
            .attr("alt")
            .map(|alt| collapse_whitespace(alt).trim().to_string())
            .unwrap_or_default();
        let title = value
            .attr("title")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        match url_resolver::resolve(self.base, src) {
            Ok(url) => {
                self.diagnostics.resolved_references += 1;
                Some(Inline::Image {
                    image: ImageRef {
                        src: url.to_string(),
                        alt,
                        title,
                    },
                })
            }
            Err(e) => {
                debug!("Keeping unresolved image as text: {}", e);
                self.diagnostics.unresolved_references += 1;
                Some(Inline::Unresolved {
                    text: if alt.is_empty() { "image".to_string() } else { alt },
                    reference: src.to_string(),
                })
            }
        }
    }

    fn list(&mut self, element: ElementRef<'_>, ordered: bool) -> Option<ContentBlock> {
        let mut items = Vec::new();
        for child in element.children().filter_map(ElementRef::wrap) {
            if ElementClass::of(&child) == ElementClass::Ignored {
                self.drop_element(&child);
                continue;
            }
            let blocks = self.blocks_of(child);
            if !blocks.is_empty() {
                items.push(ListItem { blocks });
            }
        }
        (!items.is_empty()).then_some(ContentBlock::List { ordered, items })
    }

    fn table(&mut self, element: ElementRef<'_>) -> TableData {
        let caption = element
            .children()
            .filter_map(ElementRef::wrap)
            .find(|child| child.value().name() == "caption")
            .map(|caption| normalize_inlines(self.inlines_of(caption)))
            .filter(|caption| !caption.is_empty());

        let mut rows = Vec::new();
        for row in element.descendants().filter_map(ElementRef::wrap) {
            if row.value().name() != "tr" {
                continue;
            }
            // Rows of nested tables belong to those tables.
            let owner = row
                .ancestors()
                .filter_map(ElementRef::wrap)
                .find(|ancestor| ancestor.value().name() == "table")
                .map(|table| table.id());
            if owner != Some(element.id()) {
                continue;
            }

            let mut cells = Vec::new();
            for cell in row.children().filter_map(ElementRef::wrap) {
                let header = match cell.value().name() {
                    "th" => true,
                    "td" => false,
                    _ => continue,
                };
                cells.push(TableCell {
                    header,
                    colspan: span(&cell, "colspan", MAX_COLSPAN),
                    rowspan: span(&cell, "rowspan", MAX_ROWSPAN),
                    inlines: normalize_inlines(self.inlines_of(cell)),
                });
            }
            if !cells.is_empty() {
                rows.push(TableRow { cells });
            }
        }

        TableData { caption, rows }
    }

    /// A `pre` listing: text kept verbatim, links and images lifted out and resolved
    fn code_block(&mut self, element: ElementRef<'_>) -> Option<ContentBlock> {
        let raw: String = element.text().collect();
        let text = raw.trim_start_matches(['\n', '\r']).trim_end();

        let mut references = Vec::new();
        for descendant in element.descendants().skip(1).filter_map(ElementRef::wrap) {
            // Links own the images they wrap.
            let inside_link = descendant
                .ancestors()
                .take_while(|ancestor| ancestor.id() != element.id())
                .filter_map(ElementRef::wrap)
                .any(|ancestor| ancestor.value().name() == "a");
            if inside_link {
                continue;
            }
            match ElementClass::of(&descendant) {
                ElementClass::Link => references.extend(self.link(descendant).into_iter().filter(|inline| {
                    matches!(
                        inline,
                        Inline::Link { .. } | Inline::Image { .. } | Inline::Unresolved { .. }
                    )
                })),
                ElementClass::Image => references.extend(self.image(descendant)),
                _ => {}
            }
        }

        if text.is_empty() && references.is_empty() {
            return None;
        }

        let language = element
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| matches!(e.value().name(), "pre" | "code"))
            .flat_map(|e| e.value().classes())
            .find_map(|class| class.strip_prefix("lang-").or_else(|| class.strip_prefix("language-")))
            .filter(|language| !language.is_empty())
            .map(str::to_string);

        Some(ContentBlock::Code {
            language,
            text: text.to_string(),
            references,
        })
    }
}

fn has_block_descendant(element: &ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|descendant| ElementClass::of(&descendant).is_block())
}

fn has_reference(element: &ElementRef<'_>) -> bool {
    element
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .any(|descendant| matches!(descendant.value().name(), "a" | "img"))
}

/// Text inside a code element stays code, including link text
fn as_code(inline: Inline) -> Inline {
    match inline {
        Inline::Text { text } => Inline::Code { text },
        Inline::Link { href, content } => Inline::Link {
            href,
            content: content.into_iter().map(as_code).collect(),
        },
        other => other,
    }
}

fn is_script_reference(href: &str) -> bool {
    href.split_once(':').is_some_and(|(scheme, _)| {
        let scheme = scheme.trim();
        scheme.eq_ignore_ascii_case("javascript") || scheme.eq_ignore_ascii_case("vbscript")
    })
}

fn span(cell: &ElementRef<'_>, attr: &str, max: u32) -> u32 {
    cell.value()
        .attr(attr)
        .and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value > 0)
        .map_or(1, |value| value.min(max))
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<ContentBlock>) {
    if !pending.is_empty() {
        blocks.extend(paragraph_blocks(std::mem::take(pending)));
    }
}

/// A paragraph, nothing for an empty one, or image blocks for an image-only one
fn paragraph_blocks(inlines: Vec<Inline>) -> Vec<ContentBlock> {
    let inlines = normalize_inlines(inlines);
    if inlines.is_empty() {
        return Vec::new();
    }

    let image_only = inlines.iter().all(|inline| match inline {
        Inline::Image { .. } | Inline::LineBreak => true,
        Inline::Text { text } => text.trim().is_empty(),
        _ => false,
    });

    if image_only {
        inlines
            .into_iter()
            .filter_map(|inline| match inline {
                Inline::Image { image } => Some(ContentBlock::Image { image }),
                _ => None,
            })
            .collect()
    } else {
        vec![ContentBlock::Paragraph { inlines }]
    }
}

/// Merge adjacent text, collapse whitespace, and trim at edges and line breaks
fn normalize_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        match inline {
            Inline::Text { text } => match merged.last_mut() {
                Some(Inline::Text { text: previous }) => previous.push_str(&text),
                _ => merged.push(Inline::Text { text }),
            },
            Inline::Link { href, content } => merged.push(Inline::Link {
                href,
                content: normalize_inlines(content),
            }),
            other => merged.push(other),
        }
    }

    let breaks: Vec<bool> = merged.iter().map(|inline| matches!(inline, Inline::LineBreak)).collect();
    let last = merged.len().saturating_sub(1);
    for (index, inline) in merged.iter_mut().enumerate() {
        if let Inline::Text { text } = inline {
            let mut collapsed = collapse_whitespace(text);
            if index == 0 || breaks[index - 1] {
                collapsed = collapsed.trim_start().to_string();
            }
            if index == last || breaks[index + 1] {
                collapsed = collapsed.trim_end().to_string();
            }
            *text = collapsed;
        }
    }

    let mut normalized: Vec<Inline> = Vec::with_capacity(merged.len());
    for inline in merged {
        match inline {
            Inline::Text { text } if text.is_empty() => {}
            Inline::LineBreak if normalized.is_empty() || matches!(normalized.last(), Some(Inline::LineBreak)) => {}
            other => normalized.push(other),
        }
    }
    while matches!(normalized.last(), Some(Inline::LineBreak)) {
        normalized.pop();
    }
    normalized
}
