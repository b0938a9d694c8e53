//! Test utilities for the module reader
//!
//! An in-memory [`PageFetcher`] with canned pages plus builders for
//! index and section markup shaped like the training site.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::domain::services::PageFetcher;
use crate::infrastructure::reader_error::{ReaderError, ReaderResult};

/// Module root used by in-crate tests
pub const TEST_MODULE_URL: &str = "https://learn.microsoft.com/en-us/training/modules/sample-module/";

/// Canned response for one URL
#[derive(Debug, Clone)]
pub enum CannedPage {
    Body(String),
    Status(u16),
    Unreachable,
}

/// Fetcher answering from a fixed URL → response table
#[derive(Debug, Default)]
pub struct InMemoryFetcher {
    pages: HashMap<String, CannedPage>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), CannedPage::Body(body.into()));
        self
    }

    pub fn with_status(mut self, url: &str, code: u16) -> Self {
        self.pages.insert(url.to_string(), CannedPage::Status(code));
        self
    }

    pub fn with_unreachable(mut self, url: &str) -> Self {
        self.pages.insert(url.to_string(), CannedPage::Unreachable);
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.as_str() == url).count()
    }
}

#[async_trait]
impl PageFetcher for InMemoryFetcher {
    async fn fetch(&self, url: &Url, _timeout: Duration) -> ReaderResult<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        match self.pages.get(url.as_str()) {
            Some(CannedPage::Body(body)) => Ok(body.clone()),
            Some(CannedPage::Status(code)) => Err(ReaderError::http_status(*code, url.as_str())),
            Some(CannedPage::Unreachable) => Err(ReaderError::network(url.as_str(), "connection refused", false)),
            None => Err(ReaderError::http_status(404, url.as_str())),
        }
    }
}

/// Index page listing `(title, href)` units in order
pub fn index_markup(module_title: &str, units: &[(&str, &str)]) -> String {
    let items: String = units
        .iter()
        .map(|(title, href)| {
            format!(
                r#"<li class="module-unit"><div class="barLink"><a href="{href}">{title}</a></div>
                <span class="unit-duration">5 min</span></li>"#
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html><html><head><title>{module_title} - Training</title></head><body>
        <header class="site-header"><a href="/en-us/">Learn</a></header>
        <main><h1>{module_title}</h1><div class="achievements">200 XP</div>
        <ul id="unit-list">{items}</ul></main>
        <footer class="site-footer">Privacy</footer></body></html>"#
    )
}

/// Section page with a title heading and the given body markup
pub fn section_markup(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><head><title>{title} - Training</title></head><body>
        <header class="site-header"><a href="/en-us/">Learn</a></header>
        <main>
            <nav aria-label="Breadcrumb"><a href="../">Module</a></nav>
            <h1>{title}</h1>
            {body}
            <div id="feedback-section"><p>Was this page helpful?</p></div>
            <div class="next-unit"><a href="next">Continue</a></div>
        </main>
        <footer class="site-footer">Privacy</footer></body></html>"#
    )
}
