use std::path::PathBuf;

use cda_model::ExtractError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("no active work unit; create one before ingesting documents")]
    NoActiveWorkUnit,

    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract {file_name}: {source}")]
    Extract {
        file_name: String,
        #[source]
        source: ExtractError,
    },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
