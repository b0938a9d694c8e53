//! HTML parsing infrastructure for training modules
//!
//! Selector-driven extraction of the module navigation and of cleaned section
//! content. Structural signatures come from [`config::SignatureRules`] and are
//! compiled once per parser.

pub mod config;
pub mod content_cleaner;
pub mod context;
pub mod error;
pub mod navigation_parser;

// Re-export public types
pub use config::{ContentSignature, NavigationSignature, SignatureRules};
pub use content_cleaner::ContentCleaner;
pub use context::ParseContext;
pub use error::{ReaderError, ReaderResult};
pub use navigation_parser::NavigationParser;

use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::{debug, warn};

lazy_static! {
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("static regex");
}

/// Parser for one kind of page
pub trait ContextualParser {
    type Output;

    /// Parse raw markup of the page described by `context`
    fn parse_with_context(&self, markup: &str, context: &ParseContext) -> ReaderResult<Self::Output>;
}

/// A signature list compiled into selectors, keeping the source text for errors
#[derive(Debug, Clone)]
pub struct CompiledSignature {
    selectors: Vec<(String, Selector)>,
}

impl CompiledSignature {
    /// Compile multiple selector strings; invalid ones are skipped with a warning.
    ///
    /// Fails only when nothing compiles, since an empty signature can never match.
    pub fn compile(selector_strings: &[String]) -> ReaderResult<Self> {
        let mut selectors = Vec::new();
        let mut errors = Vec::new();

        for selector_str in selector_strings {
            match Selector::parse(selector_str) {
                Ok(selector) => selectors.push((selector_str.clone(), selector)),
                Err(e) => {
                    warn!("Failed to compile selector '{}': {}", selector_str, e);
                    errors.push(format!("'{selector_str}': {e}"));
                }
            }
        }

        if selectors.is_empty() {
            return Err(ReaderError::InvalidSignature {
                selector: selector_strings.join(", "),
                reason: if errors.is_empty() {
                    "no selectors configured".to_string()
                } else {
                    errors.join(", ")
                },
            });
        }

        if !errors.is_empty() {
            debug!("Some selectors failed to compile: {}", errors.join(", "));
        }

        Ok(Self { selectors })
    }

    /// Like [`Self::compile`], but an empty list yields a signature that never matches
    pub fn compile_optional(selector_strings: &[String]) -> ReaderResult<Self> {
        if selector_strings.is_empty() {
            return Ok(Self { selectors: Vec::new() });
        }
        Self::compile(selector_strings)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Selector> {
        self.selectors.iter().map(|(_, s)| s)
    }

    /// Source text of every selector, for error reports
    pub fn sources(&self) -> Vec<String> {
        self.selectors.iter().map(|(s, _)| s.clone()).collect()
    }
}

/// Collapse whitespace runs into single spaces without trimming
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Visible text of an element, collapsed and trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>()).trim().to_string()
}
