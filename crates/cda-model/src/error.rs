use thiserror::Error;

use crate::record::RecordKind;

/// Failure to turn raw bytes into an element tree. Aborts one document only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("malformed document: {message}")]
    Parse { message: String },
    #[error("document is missing required element `{element}`")]
    Validation { element: &'static str },
}

/// Failure to build a record from one stored entry. Skips that entry only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("no mapping template for record kind `{kind}`")]
    MissingTemplate { kind: RecordKind },
    #[error("`{value}` is not a valid {field} code for {kind}")]
    InvalidCode {
        kind: RecordKind,
        field: &'static str,
        value: String,
    },
    #[error("field `{field}` does not hold a valid date/time")]
    InvalidDateTime { field: String, value: String },
    #[error("required field `{field}` has no value")]
    MissingField { field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("unknown table `{0}`")]
    UnknownTable(String),
}
