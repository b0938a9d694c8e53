//! Request-scoped aggregate of one module's navigation and the sections read so far

use std::collections::BTreeMap;
use uuid::Uuid;

use super::content::CleanedContent;
use super::module_reference::ModuleReference;
use super::section::SectionDescriptor;
use crate::infrastructure::reader_error::{ReaderError, ReaderResult};

#[derive(Debug, Clone)]
pub struct Module {
    /// Correlates log lines of one request; never part of the content
    pub request_id: Uuid,
    pub reference: ModuleReference,
    pub title: Option<String>,
    sections: Vec<SectionDescriptor>,
    contents: BTreeMap<usize, CleanedContent>,
}

impl Module {
    pub fn new(reference: ModuleReference, title: Option<String>, sections: Vec<SectionDescriptor>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            reference,
            title,
            sections,
            contents: BTreeMap::new(),
        }
    }

    pub fn sections(&self) -> &[SectionDescriptor] {
        &self.sections
    }

    pub fn into_sections(self) -> Vec<SectionDescriptor> {
        self.sections
    }

    pub fn section_descriptor(&self, ordinal: usize) -> ReaderResult<&SectionDescriptor> {
        self.sections.get(ordinal).ok_or(ReaderError::SectionNotFound {
            ordinal,
            available: self.sections.len(),
        })
    }

    /// Content already cleaned during this request
    pub fn loaded(&self, ordinal: usize) -> Option<&CleanedContent> {
        self.contents.get(&ordinal)
    }

    pub fn loaded_count(&self) -> usize {
        self.contents.len()
    }

    pub(crate) fn store(&mut self, ordinal: usize, content: CleanedContent) -> &CleanedContent {
        self.contents.entry(ordinal).or_insert(content)
    }

    /// Hand a cleaned section over to the caller, removing it from the module
    pub fn take(&mut self, ordinal: usize) -> Option<CleanedContent> {
        self.contents.remove(&ordinal)
    }
}
