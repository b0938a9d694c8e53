//! Error module re-export
//!
//! Parsers share the crate-wide reader error taxonomy.

pub use crate::infrastructure::reader_error::{ReaderError, ReaderResult};
