//! Domain module - module references, section descriptors and cleaned content
//!
//! These types form the intermediate representation handed to the
//! presentation layer.

pub mod content;
pub mod module;
pub mod module_reference;
pub mod section;
pub mod services;

// Re-export commonly used items
pub use content::{
    CleanDiagnostics, CleanedContent, ContentBlock, ImageRef, Inline, ListItem, TableCell, TableData, TableRow,
};
pub use module::Module;
pub use module_reference::{ModuleReference, ModuleUrlPolicy};
pub use section::SectionDescriptor;
pub use services::PageFetcher;
