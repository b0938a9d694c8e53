use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

/// One navigable unit of a module, in reading order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SectionDescriptor {
    /// Visible title of the unit link
    pub title: String,
    /// Link target exactly as written in the index page
    pub relative_path: String,
    /// Link target resolved against the module root
    pub absolute_url: String,
    /// Position in the index page, starting at 0
    pub ordinal: usize,
}

impl SectionDescriptor {
    pub fn new(title: String, relative_path: String, absolute_url: String, ordinal: usize) -> Self {
        Self {
            title,
            relative_path,
            absolute_url,
            ordinal,
        }
    }
}

impl AsRef<str> for SectionDescriptor {
    fn as_ref(&self) -> &str {
        &self.absolute_url
    }
}

impl fmt::Display for SectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} ({})", self.ordinal, self.title, self.absolute_url)
    }
}
