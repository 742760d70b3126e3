//! Converting stored entries with per-entry failure isolation.

use cda_model::{
    ClinicalRecord, HasIdentifier, MappingError, MappingTemplates, RecordBundle, RecordKind,
    WorkOrderStore,
};
use tracing::{debug, info, info_span, warn};

use crate::build::build_record;
use crate::stored::{StoredEntry, stored_entries};

/// An entry that produced no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub content_id: String,
    pub section_code: Option<String>,
    pub kind: RecordKind,
    pub error: MappingError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversionOutcome {
    pub records: Vec<ClinicalRecord>,
    pub skipped: Vec<SkippedEntry>,
}

impl ConversionOutcome {
    pub fn has_skipped(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn bundle(&self) -> RecordBundle {
        RecordBundle::collection(self.records.iter().cloned())
    }

    pub fn into_bundle(self) -> RecordBundle {
        RecordBundle::collection(self.records)
    }
}

/// Converts one entry with the template of its section's record kind.
pub fn convert_entry(
    entry: &StoredEntry,
    templates: &MappingTemplates,
) -> Result<ClinicalRecord, MappingError> {
    let kind = entry.kind();
    let template = templates
        .get(kind)
        .ok_or(MappingError::MissingTemplate { kind })?;
    build_record(kind, entry, template)
}

/// Converts every entry; failures are recorded and the rest still convert.
pub fn convert_entries<'a>(
    entries: impl IntoIterator<Item = &'a StoredEntry>,
    templates: &MappingTemplates,
) -> ConversionOutcome {
    let mut outcome = ConversionOutcome::default();
    for entry in entries {
        match convert_entry(entry, templates) {
            Ok(record) => {
                debug!(
                    content_id = %entry.content_id,
                    resource_type = record.resource_type(),
                    id = record.id(),
                    "converted entry"
                );
                outcome.records.push(record);
            }
            Err(error) => {
                warn!(
                    content_id = %entry.content_id,
                    section_code = entry.section_code.as_deref().unwrap_or_default(),
                    %error,
                    "skipping entry"
                );
                outcome.skipped.push(SkippedEntry {
                    content_id: entry.content_id.clone(),
                    section_code: entry.section_code.clone(),
                    kind: entry.kind(),
                    error,
                });
            }
        }
    }
    outcome
}

/// Converts every entry held in the store.
pub fn convert_store(store: &WorkOrderStore, templates: &MappingTemplates) -> ConversionOutcome {
    let span = info_span!("convert_store");
    let _guard = span.enter();

    let entries = stored_entries(store);
    let outcome = convert_entries(&entries, templates);
    info!(
        entries = entries.len(),
        records = outcome.records.len(),
        skipped = outcome.skipped.len(),
        "conversion complete"
    );
    outcome
}
