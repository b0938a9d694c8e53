//! Module index parser
//!
//! Turns the unit list of a module index page into ordered section
//! descriptors. Entries that do not carry a navigable link are treated as
//! group headers and skipped.

use scraper::{ElementRef, Html};
use std::collections::HashSet;
use tracing::{debug, warn};
use url::Url;

use super::config::NavigationSignature;
use super::{CompiledSignature, ContextualParser, ParseContext, ReaderError, ReaderResult, element_text};
use crate::domain::section::SectionDescriptor;
use crate::infrastructure::url_resolver::{self, is_fragment_only};

/// Parsed module index page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleIndex {
    pub title: Option<String>,
    pub sections: Vec<SectionDescriptor>,
}

/// Parser for module index pages
#[derive(Debug, Clone)]
pub struct NavigationParser {
    container: CompiledSignature,
    entry: CompiledSignature,
    link: CompiledSignature,
    module_title: CompiledSignature,
}

impl NavigationParser {
    /// Create a parser with the default site signatures
    pub fn new() -> ReaderResult<Self> {
        Self::with_config(&NavigationSignature::default())
    }

    pub fn with_config(signature: &NavigationSignature) -> ReaderResult<Self> {
        Ok(Self {
            container: CompiledSignature::compile(&signature.container)?,
            entry: CompiledSignature::compile(&signature.entry)?,
            link: CompiledSignature::compile(&signature.link)?,
            module_title: CompiledSignature::compile(&signature.module_title)?,
        })
    }

    /// Ordered section descriptors of an index page, resolved against `base`
    pub fn extract_navigation(&self, index_markup: &str, base: &Url) -> ReaderResult<Vec<SectionDescriptor>> {
        let html = Html::parse_document(index_markup);
        self.sections_from_document(&html, base)
    }

    /// Module title: first non-empty match of the title signature
    pub fn extract_title(&self, index_markup: &str) -> Option<String> {
        let html = Html::parse_document(index_markup);
        self.title_from_document(&html)
    }

    fn title_from_document(&self, html: &Html) -> Option<String> {
        self.module_title
            .iter()
            .filter_map(|selector| html.select(selector).next())
            .map(|element| element_text(&element))
            .find(|text| !text.is_empty())
    }

    fn sections_from_document(&self, html: &Html, base: &Url) -> ReaderResult<Vec<SectionDescriptor>> {
        let container = self
            .container
            .iter()
            .find_map(|selector| html.select(selector).next())
            .ok_or_else(|| ReaderError::NavigationNotFound {
                url: base.to_string(),
                tried_selectors: self.container.sources(),
            })?;

        let entries: Vec<ElementRef<'_>> = self
            .entry
            .iter()
            .map(|selector| container.select(selector).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default();

        debug!("Found {} navigation entries in {}", entries.len(), base);

        let entry_ids: HashSet<_> = entries.iter().map(|entry| entry.id()).collect();
        let mut sections = Vec::new();

        for (position, entry) in entries.iter().enumerate() {
            // A link belongs to the innermost entry containing it, so a group
            // header never borrows the link of one of its children.
            let owned_by_entry = |link: &ElementRef<'_>| {
                link.ancestors()
                    .find(|ancestor| entry_ids.contains(&ancestor.id()))
                    .map(|ancestor| ancestor.id())
                    == Some(entry.id())
            };

            let Some(link) = self
                .link
                .iter()
                .flat_map(|selector| entry.select(selector))
                .find(|link| owned_by_entry(link))
            else {
                debug!("Skipping navigation entry {} without a link", position);
                continue;
            };

            let href = link.value().attr("href").unwrap_or_default().trim();
            if href.is_empty() || is_fragment_only(href) {
                debug!("Skipping navigation entry {} with in-page link '{}'", position, href);
                continue;
            }

            let absolute = match url_resolver::resolve(base, href) {
                Ok(url) if matches!(url.scheme(), "http" | "https") => url,
                Ok(url) => {
                    debug!("Skipping navigation entry {} with non-page link '{}'", position, url);
                    continue;
                }
                Err(e) => {
                    warn!("Skipping navigation entry {}: {}", position, e);
                    continue;
                }
            };

            let mut title = element_text(&link);
            if title.is_empty() {
                title = ["title", "aria-label"]
                    .iter()
                    .find_map(|attr| link.value().attr(attr))
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default();
            }
            if title.is_empty() {
                debug!("Skipping navigation entry {} without a title", position);
                continue;
            }

            let ordinal = sections.len();
            sections.push(SectionDescriptor::new(title, href.to_string(), absolute.to_string(), ordinal));
        }

        debug!(
            "Extracted {} sections: {:?}",
            sections.len(),
            sections.iter().map(|s| s.title.as_str()).collect::<Vec<_>>()
        );
        Ok(sections)
    }
}

impl ContextualParser for NavigationParser {
    type Output = ModuleIndex;

    fn parse_with_context(&self, markup: &str, context: &ParseContext) -> ReaderResult<Self::Output> {
        let html = Html::parse_document(markup);
        let sections = self.sections_from_document(&html, &context.page_url)?;
        let title = self
            .title_from_document(&html)
            .or_else(|| context.fallback_title.clone());
        Ok(ModuleIndex { title, sections })
    }
}
