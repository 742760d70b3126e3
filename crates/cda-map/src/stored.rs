//! Rebuilding per-entry value maps from the work-order tables.

use std::collections::BTreeMap;

use cda_model::{FlatValueMap, RecordKind, TableName, WorkOrderStore};

use crate::sections::record_kind;

/// One content row with its flattened values, ready for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredEntry {
    pub content_id: String,
    pub document_id: String,
    pub section_code: Option<String>,
    pub section_title: Option<String>,
    /// `Patient/<patient_id>` of the entry's document.
    pub subject: Option<String>,
    pub values: FlatValueMap,
}

impl StoredEntry {
    pub fn new(content_id: impl Into<String>, values: FlatValueMap) -> Self {
        Self {
            content_id: content_id.into(),
            values,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_section(mut self, code: &str, title: &str) -> Self {
        self.section_code = Some(code.to_string());
        self.section_title = Some(title.to_string());
        self
    }

    #[must_use]
    pub fn with_subject(mut self, patient_id: &str) -> Self {
        self.subject = Some(format!("Patient/{patient_id}"));
        self
    }

    pub fn kind(&self) -> RecordKind {
        record_kind(self.section_code.as_deref().unwrap_or_default())
    }
}

/// Groups value rows by content id, in content-row order.
pub fn stored_entries(store: &WorkOrderStore) -> Vec<StoredEntry> {
    let patients: BTreeMap<&str, &str> = store
        .table(TableName::Patients)
        .iter()
        .filter_map(|row| Some((row.text("document_id")?, row.text("patient_id")?)))
        .collect();

    let mut values: BTreeMap<&str, FlatValueMap> = BTreeMap::new();
    for row in store.table(TableName::Values) {
        let (Some(content_id), Some(path), Some(value)) =
            (row.text("content_id"), row.text("key_path"), row.text("value"))
        else {
            continue;
        };
        values.entry(content_id).or_default().insert(path, value);
    }

    store
        .table(TableName::Contents)
        .iter()
        .filter_map(|row| {
            let content_id = row.text("content_id")?;
            let document_id = row.text("document_id").unwrap_or_default();
            Some(StoredEntry {
                content_id: content_id.to_string(),
                document_id: document_id.to_string(),
                section_code: row.text("section_code").map(str::to_string),
                section_title: row.text("section_title").map(str::to_string),
                subject: patients
                    .get(document_id)
                    .map(|patient_id| format!("Patient/{patient_id}")),
                values: values.remove(content_id).unwrap_or_default(),
            })
        })
        .collect()
}
