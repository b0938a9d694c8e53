//! Module assembler
//!
//! Orchestrates fetching and parsing for one request-scoped [`Module`]: the
//! index page is fetched once, sections are fetched and cleaned only when
//! asked for, and every result is keyed by ordinal.

use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::domain::content::CleanedContent;
use crate::domain::module::Module;
use crate::domain::module_reference::ModuleReference;
use crate::domain::section::SectionDescriptor;
use crate::domain::services::PageFetcher;
use crate::infrastructure::config::FetchConfig;
use crate::infrastructure::parsing::{
    ContentCleaner, ContextualParser, NavigationParser, ParseContext, SignatureRules,
};
use crate::infrastructure::reader_error::{ReaderError, ReaderResult};

/// Outcome of a parallel prefetch, per ordinal
#[derive(Debug, Default)]
pub struct PrefetchReport {
    /// Ordinals cleaned by this call, ascending
    pub loaded: Vec<usize>,
    /// Ordinals that were already cleaned before this call
    pub cached: Vec<usize>,
    pub failed: BTreeMap<usize, ReaderError>,
}

impl PrefetchReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ModuleAssembler<F: PageFetcher> {
    fetcher: F,
    navigation: NavigationParser,
    cleaner: ContentCleaner,
    config: FetchConfig,
}

impl<F: PageFetcher> ModuleAssembler<F> {
    /// Assembler with default fetch settings and site signatures
    pub fn new(fetcher: F) -> ReaderResult<Self> {
        Self::with_config(fetcher, FetchConfig::default(), &SignatureRules::default())
    }

    pub fn with_config(fetcher: F, config: FetchConfig, signatures: &SignatureRules) -> ReaderResult<Self> {
        Ok(Self {
            fetcher,
            navigation: NavigationParser::with_config(&signatures.navigation)?,
            cleaner: ContentCleaner::with_config(&signatures.content)?,
            config,
        })
    }

    pub const fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Ordered section descriptors of a module (one index fetch)
    pub async fn load_navigation(&self, reference: &ModuleReference) -> ReaderResult<Vec<SectionDescriptor>> {
        Ok(self.open_module(reference).await?.into_sections())
    }

    /// Fetch and parse the index page into a module with no sections loaded yet
    pub async fn open_module(&self, reference: &ModuleReference) -> ReaderResult<Module> {
        let request_id = Uuid::new_v4();
        let span = info_span!("module", request_id = %request_id, module = %reference);

        let mut module = self.fetch_index(reference).instrument(span).await?;
        module.request_id = request_id;
        Ok(module)
    }

    /// Cleaned content of one section, fetched on first access and kept in the module
    pub async fn section<'m>(&self, module: &'m mut Module, ordinal: usize) -> ReaderResult<&'m CleanedContent> {
        if module.loaded(ordinal).is_none() {
            let descriptor = module.section_descriptor(ordinal)?.clone();
            let content = self
                .fetch_section(&descriptor)
                .instrument(info_span!("section", request_id = %module.request_id, ordinal))
                .await?;
            module.store(ordinal, content);
        } else {
            debug!("Section {} already loaded", ordinal);
        }

        module.loaded(ordinal).ok_or(ReaderError::SectionNotFound {
            ordinal,
            available: module.sections().len(),
        })
    }

    /// Load one section of a module from scratch: index fetch, lookup, section fetch, clean
    pub async fn load_section(&self, reference: &ModuleReference, ordinal: usize) -> ReaderResult<CleanedContent> {
        let mut module = self.open_module(reference).await?;
        self.section(&mut module, ordinal).await?;
        module.take(ordinal).ok_or(ReaderError::SectionNotFound {
            ordinal,
            available: module.sections().len(),
        })
    }

    /// Clean several sections with bounded parallelism.
    ///
    /// Results are stored by ordinal, so the module ends up exactly as if
    /// the sections had been loaded one by one. A failing section does not
    /// affect the others.
    pub async fn prefetch_sections(&self, module: &mut Module, ordinals: &[usize]) -> PrefetchReport {
        let mut report = PrefetchReport::default();
        let mut pending = Vec::new();

        for ordinal in ordinals.iter().copied().collect::<BTreeSet<_>>() {
            if module.loaded(ordinal).is_some() {
                report.cached.push(ordinal);
                continue;
            }
            match module.section_descriptor(ordinal) {
                Ok(descriptor) => pending.push(descriptor.clone()),
                Err(e) => {
                    report.failed.insert(ordinal, e);
                }
            }
        }

        let limit = self.config.max_concurrent_sections.max(1);
        let span = info_span!("prefetch", request_id = %module.request_id, sections = pending.len(), limit);
        let results: Vec<(usize, ReaderResult<CleanedContent>)> = stream::iter(pending)
            .map(|descriptor| async move { (descriptor.ordinal, self.fetch_section(&descriptor).await) })
            .buffered(limit)
            .collect()
            .instrument(span)
            .await;

        for (ordinal, result) in results {
            match result {
                Ok(content) => {
                    module.store(ordinal, content);
                    report.loaded.push(ordinal);
                }
                Err(e) => {
                    warn!("Section {} failed during prefetch: {}", ordinal, e);
                    report.failed.insert(ordinal, e);
                }
            }
        }

        report
    }

    async fn fetch_index(&self, reference: &ModuleReference) -> ReaderResult<Module> {
        info!("📚 Opening module {}", reference);
        let markup = self.fetcher.fetch(reference.url(), self.config.timeout()).await?;
        let index = self
            .navigation
            .parse_with_context(&markup, &ParseContext::new(reference.url().clone()))?;

        info!(
            "Module '{}' has {} sections",
            index.title.as_deref().unwrap_or("untitled"),
            index.sections.len()
        );
        Ok(Module::new(reference.clone(), index.title, index.sections))
    }

    async fn fetch_section(&self, descriptor: &SectionDescriptor) -> ReaderResult<CleanedContent> {
        info!("📄 Loading section {} '{}'", descriptor.ordinal, descriptor.title);
        let url = Url::parse(&descriptor.absolute_url)
            .map_err(|e| ReaderError::malformed_url(&descriptor.absolute_url, e.to_string()))?;

        let markup = self.fetcher.fetch(&url, self.config.timeout()).await?;
        let context = ParseContext::new(url).with_fallback_title(descriptor.title.clone());
        let mut content = self.cleaner.parse_with_context(&markup, &context)?;
        if content.title.is_empty() {
            content.title = descriptor.title.clone();
        }

        debug!(
            "Section {} cleaned: {} blocks, diagnostics {:?}",
            descriptor.ordinal,
            content.body.len(),
            content.diagnostics
        );
        Ok(content)
    }
}
