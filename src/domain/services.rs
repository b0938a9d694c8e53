//! Domain service interfaces
//!
//! The module assembler only depends on these traits; the HTTP implementation
//! lives in the infrastructure layer.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::infrastructure::reader_error::ReaderResult;

/// Retrieves raw markup for an absolute URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch the document, failing with `Network` or `HttpStatus`
    async fn fetch(&self, url: &Url, timeout: Duration) -> ReaderResult<String>;
}

#[async_trait]
impl<T: PageFetcher + ?Sized> PageFetcher for std::sync::Arc<T> {
    async fn fetch(&self, url: &Url, timeout: Duration) -> ReaderResult<String> {
        (**self).fetch(url, timeout).await
    }
}
