pub mod elevate;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod organize;
pub mod processor;

pub use elevate::elevate;
pub use error::{IngestError, Result};
pub use extract::{extract, extract_element, parse, validate};
pub use flatten::{DEFAULT_SEPARATOR, flatten, flatten_with_separator};
pub use organize::{navigate, organize, organize_document};
pub use processor::{BatchReport, DocumentFailure, DocumentIngestor, IngestedDocument};
