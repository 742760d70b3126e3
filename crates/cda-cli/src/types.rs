use std::path::PathBuf;

use cda_ingest::{DocumentFailure, IngestedDocument};
use cda_map::SkippedEntry;
use cda_model::TableName;

/// What `extract` did, for the summary table.
#[derive(Debug)]
pub struct ExtractResult {
    pub work_unit_id: String,
    pub documents: Vec<IngestedDocument>,
    pub failures: Vec<DocumentFailure>,
    pub table_rows: Vec<(TableName, usize)>,
    pub output: Option<PathBuf>,
    pub csv_files: Vec<PathBuf>,
}

impl ExtractResult {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// What `convert` did, for the summary table.
#[derive(Debug)]
pub struct ConvertResult {
    pub extract: ExtractResult,
    /// Converted record count per resource type.
    pub records: Vec<(&'static str, usize)>,
    pub skipped: Vec<SkippedEntry>,
}

impl ConvertResult {
    pub fn has_errors(&self) -> bool {
        self.extract.has_errors() || !self.skipped.is_empty()
    }
}
