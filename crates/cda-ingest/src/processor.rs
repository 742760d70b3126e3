//! Ingestion of whole documents into a [`WorkOrderStore`].

use std::path::{Path, PathBuf};

use tracing::{debug, info, info_span, warn};

use cda_model::table::{new_id, timestamp};
use cda_model::{DocumentExtraction, Row, TableName, TreeNode, WorkOrderStore};

use crate::elevate::elevate;
use crate::error::{IngestError, Result};
use crate::flatten::flatten;
use crate::organize::organize_document;

/// Counts for one ingested document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedDocument {
    pub file_name: String,
    pub document_id: String,
    pub authors: usize,
    pub sections: usize,
    pub entries: usize,
    pub values: usize,
}

/// A document that could not be ingested.
#[derive(Debug)]
pub struct DocumentFailure {
    pub file_name: String,
    pub error: IngestError,
}

/// Outcome of a batch. Failures never stop the remaining documents.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub ingested: Vec<IngestedDocument>,
    pub failures: Vec<DocumentFailure>,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Appends extraction results to the tables of the store's current work unit.
pub struct DocumentIngestor<'a> {
    store: &'a mut WorkOrderStore,
}

impl<'a> DocumentIngestor<'a> {
    pub fn new(store: &'a mut WorkOrderStore) -> Self {
        Self { store }
    }

    /// Ingests one document. The document is fully extracted before any row
    /// is appended, so a failing document leaves the store untouched.
    pub fn ingest(&mut self, file_name: &str, bytes: &[u8]) -> Result<IngestedDocument> {
        let work_unit_id = self
            .store
            .current_work_unit()
            .ok_or(IngestError::NoActiveWorkUnit)?
            .to_string();
        let _span = info_span!("ingest_document", file = file_name).entered();

        let extraction = organize_document(bytes).map_err(|source| IngestError::Extract {
            file_name: file_name.to_string(),
            source,
        })?;
        let ingested = self.append_extraction(&work_unit_id, file_name, &extraction);
        info!(
            document_id = %ingested.document_id,
            sections = ingested.sections,
            entries = ingested.entries,
            values = ingested.values,
            "document ingested"
        );
        Ok(ingested)
    }

    pub fn ingest_path(&mut self, path: &Path) -> Result<IngestedDocument> {
        let bytes = std::fs::read(path).map_err(|error| IngestError::io(path, error))?;
        self.ingest(&display_name(path), &bytes)
    }

    /// Ingests every file independently and reports per-file failures.
    pub fn ingest_batch(&mut self, paths: &[PathBuf]) -> BatchReport {
        let mut report = BatchReport::default();
        for path in paths {
            match self.ingest_path(path) {
                Ok(ingested) => report.ingested.push(ingested),
                Err(error) => {
                    let file_name = display_name(path);
                    warn!(file = %file_name, %error, "document skipped");
                    report.failures.push(DocumentFailure { file_name, error });
                }
            }
        }
        info!(
            ingested = report.ingested.len(),
            failed = report.failures.len(),
            "batch ingested"
        );
        report
    }

    fn append_extraction(
        &mut self,
        work_unit_id: &str,
        file_name: &str,
        extraction: &DocumentExtraction,
    ) -> IngestedDocument {
        let document_id = new_id();
        self.store.append(
            TableName::Documents,
            Row::new()
                .with("document_id", document_id.as_str())
                .with("work_unit_id", work_unit_id)
                .with("file_name", file_name)
                .with("created_at", timestamp())
                .with("validated", true),
        );

        let patient = &extraction.patient;
        self.store.append(
            TableName::Patients,
            Row::new()
                .with("patient_id", new_id())
                .with("document_id", document_id.as_str())
                .with("given_name", patient.given_name.as_str())
                .with("family_name", patient.family_name.as_str())
                .with("gender", patient.gender.as_str())
                .with("birth_date", patient.birth_date.as_str())
                .with("identifier", patient.identifier.as_str())
                .with("identifier_root", patient.identifier_root.as_str()),
        );

        for author in &extraction.authors {
            self.store.append(
                TableName::Authors,
                Row::new()
                    .with("author_id", new_id())
                    .with("document_id", document_id.as_str())
                    .with("given_name", author.given_name.as_str())
                    .with("family_name", author.family_name.as_str())
                    .with("organization", author.organization.as_str())
                    .with("author_identifier", author.identifier.as_str())
                    .with("authored_at", author.authored_at.as_str()),
            );
        }

        let mut entries = 0;
        let mut values = 0;
        for (key, section) in extraction.sections.iter() {
            for entry in &section.entries {
                let content_id = new_id();
                self.store.append(
                    TableName::Contents,
                    Row::new()
                        .with("content_id", content_id.as_str())
                        .with("document_id", document_id.as_str())
                        .with("section_code", section.meta.code_value())
                        .with("section_title", section.meta.title.as_deref())
                        .with("code_system", section.meta.code_system())
                        .with("code_system_name", section.meta.code_system_name())
                        .with("section_type", section_type(entry)),
                );

                let flattened = flatten(&elevate(entry.clone()));
                debug!(section = %key, %content_id, values = flattened.len(), "entry flattened");
                values += flattened.len();
                for (path, value) in flattened {
                    self.store.append(
                        TableName::Values,
                        Row::new()
                            .with("value_id", new_id())
                            .with("document_id", document_id.as_str())
                            .with("content_id", content_id.as_str())
                            .with("key_path", path)
                            .with("value", value),
                    );
                }
                entries += 1;
            }
        }

        IngestedDocument {
            file_name: file_name.to_string(),
            document_id,
            authors: extraction.authors.len(),
            sections: extraction.sections.len(),
            entries,
            values,
        }
    }
}

/// `classCode` of the entry's first child element.
fn section_type(entry: &TreeNode) -> Option<&str> {
    entry
        .first_child()
        .and_then(|(_, child)| child.attribute("classCode"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
