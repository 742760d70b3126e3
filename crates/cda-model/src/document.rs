//! Per-document extraction result: patient and author metadata plus the
//! top-level sections with their entry trees.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::tree::{Attributes, TreeNode};

/// Fallback key part for a section without a `code` descendant.
pub const NO_CODE: &str = "no-code";
/// Fallback key part for a section without a `title` descendant.
pub const NO_TITLE: &str = "no-title";

/// Patient fields read from the first `patientRole`.
///
/// Every field is the navigation result: an empty string means the path
/// was not found *or* the document carries an empty value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PatientRecord {
    pub given_name: String,
    pub family_name: String,
    pub gender: String,
    pub birth_date: String,
    pub identifier: String,
    pub identifier_root: String,
}

/// Author fields read from one `author` element.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorRecord {
    pub given_name: String,
    pub family_name: String,
    pub organization: String,
    pub identifier: String,
    pub authored_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionMeta {
    /// All attributes of the section's first `code` descendant, when there is one.
    pub code: Option<Attributes>,
    /// Text of the first `title` descendant, when there is one.
    pub title: Option<String>,
}

impl SectionMeta {
    fn code_attribute(&self, name: &str) -> Option<&str> {
        self.code
            .as_ref()
            .and_then(|code| code.get(name))
            .map(String::as_str)
    }

    pub fn code_value(&self) -> Option<&str> {
        self.code_attribute("code")
    }

    pub fn code_system(&self) -> Option<&str> {
        self.code_attribute("codeSystem")
    }

    pub fn code_system_name(&self) -> Option<&str> {
        self.code_attribute("codeSystemName")
    }

    /// Composite `code_title` key. A missing `code` element or `title`
    /// element falls back to `no-code` / `no-title`; a `code` element
    /// without a `code` attribute contributes an empty part.
    pub fn key(&self) -> String {
        let code = match &self.code {
            Some(_) => self.code_value().unwrap_or_default(),
            None => NO_CODE,
        };
        section_key(code, self.title.as_deref().unwrap_or(NO_TITLE))
    }
}

pub fn section_key(code: &str, title: &str) -> String {
    format!("{code}_{title}")
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Section {
    pub meta: SectionMeta,
    /// Direct `entry` children of the section, in document order.
    pub entries: Vec<TreeNode>,
}

/// Sections keyed by their composite key, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sections {
    entries: Vec<(String, Section)>,
}

impl Sections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a section. A section with the same key is replaced in place
    /// and returned.
    pub fn insert(&mut self, key: impl Into<String>, section: Section) -> Option<Section> {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, section)),
            None => {
                self.entries.push((key, section));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Section> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, section)| section)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Section)> {
        self.entries.iter().map(|(key, section)| (key.as_str(), section))
    }

    /// Total number of entries across all sections.
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|(_, section)| section.entries.len()).sum()
    }
}

impl Serialize for Sections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, section) in &self.entries {
            map.serialize_entry(key, section)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentExtraction {
    pub patient: PatientRecord,
    pub authors: Vec<AuthorRecord>,
    pub sections: Sections,
}
