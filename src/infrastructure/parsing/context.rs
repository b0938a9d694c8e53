//! Parsing context for HTML extraction
//!
//! Carries the URL of the page being parsed; every relative reference in that
//! page is resolved against it.

use url::Url;

/// Context information for parsing operations
#[derive(Debug, Clone)]
pub struct ParseContext {
    /// URL the markup was fetched from
    pub page_url: Url,

    /// Title to fall back to when the page has none (e.g. from the navigation entry)
    pub fallback_title: Option<String>,
}

impl ParseContext {
    pub fn new(page_url: Url) -> Self {
        Self {
            page_url,
            fallback_title: None,
        }
    }

    /// Set a fallback title
    pub fn with_fallback_title(mut self, title: impl Into<String>) -> Self {
        self.fallback_title = Some(title.into());
        self
    }
}
