use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::{debug, info, info_span};

use cda_ingest::DocumentIngestor;
use cda_map::sections::SECTION_KINDS;
use cda_map::{convert_store, default_templates, load_templates};
use cda_model::{HasIdentifier, MappingError, MappingTemplates, TableName, WorkOrderStore};
use cda_cli::export::{export_csv, snapshot_json, write_json};
use cda_cli::logging::redact_value;

use crate::cli::{ConvertArgs, ExtractArgs};
use crate::summary::apply_table_style;
use crate::types::{ConvertResult, ExtractResult};

pub fn run_sections() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Section code", "Record kind", "Resource type"]);
    apply_table_style(&mut table);
    for (code, kind) in SECTION_KINDS {
        table.add_row(vec![
            (*code).to_string(),
            kind.to_string(),
            kind.resource_type().to_string(),
        ]);
    }
    table.add_row(vec![
        "(any other)".to_string(),
        cda_model::RecordKind::Observation.to_string(),
        "Observation".to_string(),
    ]);
    println!("{table}");
    Ok(())
}

pub fn run_extract(args: &ExtractArgs) -> Result<ExtractResult> {
    let mut store = WorkOrderStore::new();
    let mut result = ingest_files(&mut store, &args.files, &args.work_unit);

    let snapshot = store.snapshot();
    match &args.output {
        Some(path) => {
            write_json(&snapshot, path)?;
            result.output = Some(path.clone());
        }
        None => write_stdout(&snapshot_json(&snapshot)?)?,
    }
    if let Some(dir) = &args.csv_dir {
        result.csv_files = export_csv(&store, dir)?;
    }
    Ok(result)
}

pub fn run_convert(args: &ConvertArgs) -> Result<ConvertResult> {
    let templates = load_mapping_templates(args.templates.as_deref())?;
    let mut store = WorkOrderStore::new();
    let mut extract = ingest_files(&mut store, &args.files, "convert");

    let outcome = convert_store(&store, &templates);
    for skipped in &outcome.skipped {
        if let MappingError::InvalidDateTime { field, value } = &skipped.error {
            debug!(
                content_id = %skipped.content_id,
                field = %field,
                value = redact_value(value),
                "rejected date/time value"
            );
        }
    }

    let mut records: BTreeMap<&'static str, usize> = BTreeMap::new();
    for record in &outcome.records {
        *records.entry(record.resource_type()).or_default() += 1;
    }

    let skipped = outcome.skipped.clone();
    let bundle = outcome.into_bundle();
    match &args.output {
        Some(path) => {
            write_json(&bundle, path)?;
            extract.output = Some(path.clone());
        }
        None => write_stdout(
            &serde_json::to_string_pretty(&bundle).context("serialize record bundle")?,
        )?,
    }

    Ok(ConvertResult {
        extract,
        records: records.into_iter().collect(),
        skipped,
    })
}

fn load_mapping_templates(path: Option<&Path>) -> Result<MappingTemplates> {
    match path {
        Some(path) => {
            load_templates(path).with_context(|| format!("load templates {}", path.display()))
        }
        None => default_templates().context("load built-in templates"),
    }
}

fn ingest_files(store: &mut WorkOrderStore, files: &[PathBuf], work_unit: &str) -> ExtractResult {
    let span = info_span!("work_unit", name = work_unit);
    let _guard = span.enter();

    let work_unit_id = store.create_work_unit(work_unit);
    info!(work_unit_id = %work_unit_id, files = files.len(), "work unit created");
    let report = DocumentIngestor::new(store).ingest_batch(files);

    ExtractResult {
        work_unit_id,
        documents: report.ingested,
        failures: report.failures,
        table_rows: TableName::ALL
            .into_iter()
            .map(|table| (table, store.table(table).len()))
            .collect(),
        output: None,
        csv_files: Vec::new(),
    }
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}").context("write to stdout")?;
    Ok(())
}
