//! Learn Module Reader - training module fetching and cleaning
//!
//! Turns a training module's index page into an ordered table of contents
//! and each of its unit pages into a typed, chrome-free representation with
//! every reference made absolute.

pub mod application;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
pub mod test_utils;

// Re-export the main entry points
pub use application::{ModuleAssembler, ModuleUseCases, NavigationResponse, SectionResponse};
pub use domain::{CleanedContent, ContentBlock, Inline, Module, ModuleReference, PageFetcher, SectionDescriptor};
pub use infrastructure::{AppConfig, ConfigManager, HttpClient, ReaderError, ReaderResult};
