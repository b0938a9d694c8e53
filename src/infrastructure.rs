//! Infrastructure layer: HTTP fetching, HTML parsing, configuration and logging
//!
//! Implements the domain service traits and holds everything that touches
//! the network, the filesystem or raw markup.

pub mod config;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod reader_error;
pub mod url_resolver;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager, FetchConfig, LoggingConfig, defaults, learn_site};
pub use http_client::HttpClient;
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{ContentCleaner, ContextualParser, NavigationParser, ParseContext, SignatureRules};
pub use reader_error::{ErrorKind, ReaderError, ReaderResult};
