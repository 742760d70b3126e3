#![deny(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Flag(bool),
    Text(String),
    Missing,
}

impl CellValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Rendering used for flat exports: flags as `true`/`false`, missing as empty.
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Flag(flag) => flag.to_string(),
            CellValue::Text(text) => text.clone(),
            CellValue::Missing => String::new(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Flag(value)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Missing, Into::into)
    }
}

/// One free-form row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    cells: BTreeMap<String, CellValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<CellValue>) {
        self.cells.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.cells.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(CellValue::as_text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.cells.iter().map(|(field, value)| (field.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Column names of each table, in export order.
pub mod columns {
    pub const WORK_UNITS: &[&str] = &["work_unit_id", "name", "created_at"];
    pub const DOCUMENTS: &[&str] = &[
        "document_id",
        "work_unit_id",
        "file_name",
        "created_at",
        "validated",
    ];
    pub const PATIENTS: &[&str] = &[
        "patient_id",
        "document_id",
        "given_name",
        "family_name",
        "gender",
        "birth_date",
        "identifier",
        "identifier_root",
    ];
    pub const AUTHORS: &[&str] = &[
        "author_id",
        "document_id",
        "given_name",
        "family_name",
        "organization",
        "author_identifier",
        "authored_at",
    ];
    pub const CONTENTS: &[&str] = &[
        "content_id",
        "document_id",
        "section_code",
        "section_title",
        "code_system",
        "code_system_name",
        "section_type",
    ];
    pub const VALUES: &[&str] = &["value_id", "document_id", "content_id", "key_path", "value"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableName {
    WorkUnits,
    Documents,
    Patients,
    Authors,
    Contents,
    Values,
}

impl TableName {
    pub const ALL: [TableName; 6] = [
        TableName::WorkUnits,
        TableName::Documents,
        TableName::Patients,
        TableName::Authors,
        TableName::Contents,
        TableName::Values,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableName::WorkUnits => "work_units",
            TableName::Documents => "documents",
            TableName::Patients => "patients",
            TableName::Authors => "authors",
            TableName::Contents => "contents",
            TableName::Values => "values",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            TableName::WorkUnits => columns::WORK_UNITS,
            TableName::Documents => columns::DOCUMENTS,
            TableName::Patients => columns::PATIENTS,
            TableName::Authors => columns::AUTHORS,
            TableName::Contents => columns::CONTENTS,
            TableName::Values => columns::VALUES,
        }
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableName {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| StoreError::UnknownTable(s.to_string()))
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// In-memory, append-only store of the six work-order tables.
///
/// No internal locking: one writer at a time.
#[derive(Debug, Clone)]
pub struct WorkOrderStore {
    tables: BTreeMap<TableName, Vec<Row>>,
    current_work_unit: Option<String>,
}

impl Default for WorkOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkOrderStore {
    pub fn new() -> Self {
        Self {
            tables: TableName::ALL
                .into_iter()
                .map(|table| (table, Vec::new()))
                .collect(),
            current_work_unit: None,
        }
    }

    /// Records a new work unit and makes it the current one.
    pub fn create_work_unit(&mut self, name: &str) -> String {
        let id = new_id();
        self.append(
            TableName::WorkUnits,
            Row::new()
                .with("work_unit_id", id.as_str())
                .with("name", name)
                .with("created_at", timestamp()),
        );
        self.current_work_unit = Some(id.clone());
        id
    }

    pub fn current_work_unit(&self) -> Option<&str> {
        self.current_work_unit.as_deref()
    }

    pub fn append(&mut self, table: TableName, row: Row) {
        self.tables.entry(table).or_default().push(row);
    }

    pub fn table(&self, table: TableName) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn table_named(&self, name: &str) -> Result<&[Row], StoreError> {
        Ok(self.table(name.parse()?))
    }

    /// Total rows across all tables.
    pub fn row_count(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tables: self.tables.clone(),
        }
    }
}

/// A full copy of every table, keyed by table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    tables: BTreeMap<TableName, Vec<Row>>,
}

impl StoreSnapshot {
    pub fn table(&self, table: TableName) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableName, &[Row])> {
        self.tables
            .iter()
            .map(|(table, rows)| (*table, rows.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn work_unit_becomes_current() {
        let mut store = WorkOrderStore::new();
        assert!(store.current_work_unit().is_none());

        let id = store.create_work_unit("import");
        assert_eq!(store.current_work_unit(), Some(id.as_str()));
        let rows = store.table(TableName::WorkUnits);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("name"), Some("import"));
        assert_eq!(rows[0].text("work_unit_id"), Some(id.as_str()));
    }

    #[test]
    fn table_names_parse() {
        assert_eq!("values".parse::<TableName>(), Ok(TableName::Values));
        assert_eq!(
            "werte".parse::<TableName>(),
            Err(StoreError::UnknownTable("werte".to_string()))
        );
        let store = WorkOrderStore::new();
        assert!(store.table_named("contents").expect("known table").is_empty());
    }

    #[test]
    fn snapshot_serializes_rows_by_table() {
        let mut store = WorkOrderStore::new();
        store.append(
            TableName::Documents,
            Row::new()
                .with("file_name", "a.xml")
                .with("validated", true)
                .with("work_unit_id", None::<String>),
        );
        let json = serde_json::to_value(store.snapshot()).expect("serialize snapshot");
        let document = &json["documents"][0];
        assert_eq!(document["file_name"], "a.xml");
        assert_eq!(document["validated"], true);
        assert!(document["work_unit_id"].is_null());
        assert_eq!(json["values"].as_array().map(Vec::len), Some(0));
    }
}
