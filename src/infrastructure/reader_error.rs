//! Error taxonomy for fetching, parsing and assembling training modules
//!
//! Per-reference failures (`MalformedUrl`) are absorbed by the cleaner; every
//! other variant is surfaced for the single navigation or section load that
//! produced it.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Malformed URL reference '{reference}': {reason}")]
    MalformedUrl { reference: String, reason: String },

    #[error("Network error while fetching {url}: {reason}")]
    Network {
        url: String,
        reason: String,
        timed_out: bool,
    },

    #[error("HTTP status {code} while fetching {url}")]
    HttpStatus { code: u16, url: String },

    #[error("Navigation region not found in {url}")]
    NavigationNotFound {
        url: String,
        tried_selectors: Vec<String>,
    },

    #[error("Content region not found in {url}")]
    ContentRegionNotFound {
        url: String,
        tried_selectors: Vec<String>,
    },

    #[error("Section {ordinal} not found (module has {available} sections)")]
    SectionNotFound { ordinal: usize, available: usize },

    #[error("Not a recognized module URL: {url} - {reason}")]
    InvalidModuleUrl { url: String, reason: String },

    #[error("Invalid structural signature '{selector}': {reason}")]
    InvalidSignature { selector: String, reason: String },
}

/// Serializable discriminant handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ErrorKind {
    MalformedUrl,
    NetworkError,
    HttpStatusError,
    NavigationNotFound,
    ContentRegionNotFound,
    SectionNotFound,
    InvalidModuleUrl,
    InvalidSignature,
}

impl ReaderError {
    /// Create a malformed URL error for a single reference
    pub fn malformed_url(reference: &str, reason: impl Into<String>) -> Self {
        Self::MalformedUrl {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }

    /// Create a network error, flagging whether the request timed out
    pub fn network(url: &str, reason: impl Into<String>, timed_out: bool) -> Self {
        Self::Network {
            url: url.to_string(),
            reason: reason.into(),
            timed_out,
        }
    }

    pub fn http_status(code: u16, url: &str) -> Self {
        Self::HttpStatus {
            code,
            url: url.to_string(),
        }
    }

    pub fn invalid_module_url(url: &str, reason: impl Into<String>) -> Self {
        Self::InvalidModuleUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedUrl { .. } => ErrorKind::MalformedUrl,
            Self::Network { .. } => ErrorKind::NetworkError,
            Self::HttpStatus { .. } => ErrorKind::HttpStatusError,
            Self::NavigationNotFound { .. } => ErrorKind::NavigationNotFound,
            Self::ContentRegionNotFound { .. } => ErrorKind::ContentRegionNotFound,
            Self::SectionNotFound { .. } => ErrorKind::SectionNotFound,
            Self::InvalidModuleUrl { .. } => ErrorKind::InvalidModuleUrl,
            Self::InvalidSignature { .. } => ErrorKind::InvalidSignature,
        }
    }

    /// Whether repeating the same GET could succeed.
    ///
    /// Only transport failures and transient server statuses qualify; a 404 or
    /// a page with the wrong shape will not change on retry.
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { code, .. } => matches!(*code, 408 | 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { code, .. } => Some(*code),
            _ => None,
        }
    }
}

pub type ReaderResult<T> = Result<T, ReaderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            ReaderError::http_status(404, "https://example.com").kind(),
            ErrorKind::HttpStatusError
        );
        assert_eq!(
            ReaderError::network("https://example.com", "refused", false).kind(),
            ErrorKind::NetworkError
        );
        assert_eq!(
            ReaderError::SectionNotFound { ordinal: 9, available: 3 }.kind(),
            ErrorKind::SectionNotFound
        );
    }

    #[test]
    fn test_retry_policy() {
        assert!(ReaderError::network("u", "timeout", true).is_retryable());
        assert!(ReaderError::http_status(503, "u").is_retryable());
        assert!(ReaderError::http_status(429, "u").is_retryable());
        assert!(!ReaderError::http_status(404, "u").is_retryable());
        assert!(!ReaderError::NavigationNotFound { url: "u".into(), tried_selectors: vec![] }.is_retryable());
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::HttpStatusError).unwrap();
        assert_eq!(json, "\"http_status_error\"");
    }

    #[test]
    fn test_display_includes_status() {
        let message = ReaderError::http_status(404, "https://site/mod/unit2/").to_string();
        assert!(message.contains("404"));
        assert!(message.contains("https://site/mod/unit2/"));
    }
}
