//! Module reading use cases
//!
//! Entry points for the presentation layer. They take the module URL as raw
//! text, validate it, run the assembler and fold every outcome into a
//! serializable response.

use anyhow::Result;
use tracing::{info, warn};

use super::dto::{NavigationResponse, SectionResponse};
use super::module_assembler::ModuleAssembler;
use crate::domain::module_reference::{ModuleReference, ModuleUrlPolicy};
use crate::domain::services::PageFetcher;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::http_client::HttpClient;

pub struct ModuleUseCases<F: PageFetcher> {
    assembler: ModuleAssembler<F>,
    policy: ModuleUrlPolicy,
}

impl ModuleUseCases<HttpClient> {
    /// Use cases backed by the HTTP client, configured from `config`
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let client = HttpClient::with_config(config.fetch.clone())?;
        let assembler = ModuleAssembler::with_config(client, config.fetch.clone(), &config.signatures)?;
        Ok(Self::new(assembler, config.module_urls.clone()))
    }
}

impl<F: PageFetcher> ModuleUseCases<F> {
    pub fn new(assembler: ModuleAssembler<F>, policy: ModuleUrlPolicy) -> Self {
        Self { assembler, policy }
    }

    pub const fn assembler(&self) -> &ModuleAssembler<F> {
        &self.assembler
    }

    /// Table of contents of the module at `module_url`
    pub async fn load_navigation(&self, module_url: &str) -> NavigationResponse {
        let result = match ModuleReference::parse_with_policy(module_url, &self.policy) {
            Ok(reference) => self.assembler.load_navigation(&reference).await,
            Err(e) => Err(e),
        };

        match &result {
            Ok(sections) => info!("Navigation for {} has {} sections", module_url, sections.len()),
            Err(e) => warn!("Navigation for {} failed: {}", module_url, e),
        }
        NavigationResponse::from(result)
    }

    /// Cleaned content of section `ordinal` of the module at `module_url`
    pub async fn load_section(&self, module_url: &str, ordinal: usize) -> SectionResponse {
        let result = match ModuleReference::parse_with_policy(module_url, &self.policy) {
            Ok(reference) => self.assembler.load_section(&reference, ordinal).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Section {} of {} failed: {}", ordinal, module_url, e);
        }
        SectionResponse::from(result)
    }
}
