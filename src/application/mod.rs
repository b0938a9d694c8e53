//! Application layer - module reading use cases
//!
//! Coordinates the fetcher and the parsers for one request and exposes the
//! serializable responses consumed by the presentation layer.

pub mod dto;
pub mod module_assembler;
pub mod module_use_cases;

// Re-export commonly used items
pub use dto::{ErrorBody, NavigationResponse, SectionResponse};
pub use module_assembler::{ModuleAssembler, PrefetchReport};
pub use module_use_cases::ModuleUseCases;
