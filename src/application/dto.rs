//! Response envelopes handed to the presentation layer
//!
//! Each response serializes either as `{"ok": ...}` or as
//! `{"error": {"kind": ..., "message": ...}}`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::content::CleanedContent;
use crate::domain::section::SectionDescriptor;
use crate::infrastructure::reader_error::{ErrorKind, ReaderError, ReaderResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ReaderError> for ErrorBody {
    fn from(error: &ReaderError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NavigationResponse {
    Ok(Vec<SectionDescriptor>),
    Error(ErrorBody),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum SectionResponse {
    Ok(CleanedContent),
    Error(ErrorBody),
}

impl From<ReaderResult<Vec<SectionDescriptor>>> for NavigationResponse {
    fn from(result: ReaderResult<Vec<SectionDescriptor>>) -> Self {
        match result {
            Ok(sections) => Self::Ok(sections),
            Err(e) => Self::Error(ErrorBody::from(&e)),
        }
    }
}

impl From<ReaderResult<CleanedContent>> for SectionResponse {
    fn from(result: ReaderResult<CleanedContent>) -> Self {
        match result {
            Ok(content) => Self::Ok(content),
            Err(e) => Self::Error(ErrorBody::from(&e)),
        }
    }
}

impl NavigationResponse {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub const fn error(&self) -> Option<&ErrorBody> {
        match self {
            Self::Error(body) => Some(body),
            Self::Ok(_) => None,
        }
    }
}

impl SectionResponse {
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    pub const fn error(&self) -> Option<&ErrorBody> {
        match self {
            Self::Error(body) => Some(body),
            Self::Ok(_) => None,
        }
    }
}
