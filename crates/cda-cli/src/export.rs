//! Writing the work-order tables out as JSON or one CSV file per table.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cda_model::{CellValue, Row, StoreSnapshot, TableName, WorkOrderStore};

/// Writes one table as CSV, columns in their fixed order.
///
/// A row without a value for a column gets an empty field; fields outside
/// the fixed layout are not written.
pub fn write_table_csv<W: Write>(writer: W, table: TableName, rows: &[Row]) -> Result<()> {
    let columns = table.columns();
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns)
        .with_context(|| format!("write {table} header"))?;
    for row in rows {
        csv.write_record(
            columns
                .iter()
                .map(|column| row.get(column).map(CellValue::to_field).unwrap_or_default()),
        )
        .with_context(|| format!("write {table} row"))?;
    }
    csv.flush().with_context(|| format!("flush {table}"))?;
    Ok(())
}

/// Writes `<table>.csv` for every table into `dir`, creating it if needed.
pub fn export_csv(store: &WorkOrderStore, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let mut written = Vec::with_capacity(TableName::ALL.len());
    for table in TableName::ALL {
        let path = dir.join(format!("{table}.csv"));
        let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
        write_table_csv(BufWriter::new(file), table, store.table(table))?;
        written.push(path);
    }
    Ok(written)
}

pub fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// JSON rendering of a snapshot, keyed by table name.
pub fn snapshot_json(snapshot: &StoreSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("serialize table snapshot")
}
