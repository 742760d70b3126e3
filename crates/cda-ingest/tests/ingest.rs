use std::collections::BTreeSet;
use std::path::PathBuf;

use cda_ingest::{DocumentIngestor, IngestError, elevate, flatten, organize_document};
use cda_model::{ExtractError, TableName, WorkOrderStore};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Vec<u8> {
    std::fs::read(fixture(name)).expect("read fixture")
}

#[test]
fn organizes_top_level_sections_only() {
    let extraction = organize_document(&read_fixture("sample_ccd.xml")).expect("extract");
    let keys: Vec<_> = extraction.sections.keys().collect();
    assert_eq!(
        keys,
        vec![
            "10160-0_Medications Administered",
            "29762-2_Social History",
            "8716-3_Vital Signs",
            "48765-2_Allergies",
            "11450-4_Problems",
            "30954-2_Results",
        ]
    );
    assert_eq!(extraction.sections.entry_count(), 7);

    let medications = extraction
        .sections
        .get("10160-0_Medications Administered")
        .expect("medications");
    assert_eq!(medications.entries.len(), 1);
    assert_eq!(medications.meta.code_system_name(), Some("LOINC"));
}

#[test]
fn reads_patient_and_author_metadata() {
    let extraction = organize_document(&read_fixture("sample_ccd.xml")).expect("extract");
    let patient = &extraction.patient;
    assert_eq!(patient.given_name, "Isabella");
    assert_eq!(patient.family_name, "Jones");
    assert_eq!(patient.gender, "F");
    assert_eq!(patient.birth_date, "19750501");
    assert_eq!(patient.identifier, "998991");
    assert_eq!(patient.identifier_root, "2.16.840.1.113883.19.5.99999.2");

    assert_eq!(extraction.authors.len(), 1);
    let author = &extraction.authors[0];
    assert_eq!(author.given_name, "Henry");
    assert_eq!(author.family_name, "Seven");
    assert_eq!(author.organization, "Community Health and Hospitals");
    assert_eq!(author.identifier, "5555555555");
    assert_eq!(author.authored_at, "20200615103000-0500");
}

#[test]
fn flattened_social_history_entry() {
    let extraction = organize_document(&read_fixture("sample_ccd.xml")).expect("extract");
    let section = extraction
        .sections
        .get("29762-2_Social History")
        .expect("social history");
    let values = flatten(&elevate(section.entries[0].clone()));
    insta::assert_json_snapshot!(values, @r#"
    {
      "@typeCode": "DRIV",
      "observation.code@code": "72166-2",
      "observation.code@codeSystem": "2.16.840.1.113883.6.1",
      "observation.code@displayName": "Tobacco smoking status",
      "observation.effectiveTime.high@value": "20200105",
      "observation.effectiveTime.low@value": "20200101",
      "observation.statusCode@code": "completed",
      "observation.value@code": "8517006",
      "observation.value@codeSystem": "2.16.840.1.113883.6.96",
      "observation.value@displayName": "Former smoker",
      "observation.value@type": "CD",
      "observation@classCode": "OBS",
      "observation@moodCode": "EVN"
    }
    "#);
}

#[test]
fn ingestion_fills_every_table() {
    let mut store = WorkOrderStore::new();
    let work_unit_id = store.create_work_unit("sample import");
    let ingested = DocumentIngestor::new(&mut store)
        .ingest_path(&fixture("sample_ccd.xml"))
        .expect("ingest");

    assert_eq!(ingested.file_name, "sample_ccd.xml");
    assert_eq!(ingested.sections, 6);
    assert_eq!(ingested.entries, 7);

    let documents = store.table(TableName::Documents);
    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].text("work_unit_id"), Some(work_unit_id.as_str()));
    assert_eq!(documents[0].text("document_id"), Some(ingested.document_id.as_str()));

    let patients = store.table(TableName::Patients);
    assert_eq!(patients.len(), 1);
    assert_eq!(patients[0].text("family_name"), Some("Jones"));
    assert_eq!(store.table(TableName::Authors).len(), 1);

    let contents = store.table(TableName::Contents);
    assert_eq!(contents.len(), 7);
    assert_eq!(contents[0].text("section_code"), Some("10160-0"));
    assert_eq!(contents[0].text("section_type"), Some("SBADM"));
    assert_eq!(contents[0].text("code_system"), Some("2.16.840.1.113883.6.1"));

    let values = store.table(TableName::Values);
    assert_eq!(values.len(), ingested.values);
    let content_ids: BTreeSet<_> = contents.iter().filter_map(|row| row.text("content_id")).collect();
    assert_eq!(content_ids.len(), contents.len());
    assert!(
        values
            .iter()
            .all(|row| row.text("content_id").is_some_and(|id| content_ids.contains(id)))
    );
}

#[test]
fn nested_section_entries_are_not_enumerated() {
    let mut store = WorkOrderStore::new();
    store.create_work_unit("nested");
    DocumentIngestor::new(&mut store)
        .ingest_path(&fixture("sample_ccd.xml"))
        .expect("ingest");

    let values = store.table(TableName::Values);
    assert!(!values.iter().any(|row| row.text("value") == Some("nested-only")));
    let contents = store.table(TableName::Contents);
    assert!(!contents.iter().any(|row| row.text("section_code") == Some("X-NESTED")));
}

#[test]
fn missing_structured_body_appends_no_rows() {
    let mut store = WorkOrderStore::new();
    store.create_work_unit("broken");
    let rows_before = store.row_count();

    let error = DocumentIngestor::new(&mut store)
        .ingest("missing_body.xml", &read_fixture("missing_body.xml"))
        .expect_err("validation must fail");
    assert!(matches!(
        error,
        IngestError::Extract {
            source: ExtractError::Validation {
                element: "structuredBody"
            },
            ..
        }
    ));
    assert_eq!(store.row_count(), rows_before);
}

#[test]
fn ingestion_requires_a_work_unit() {
    let mut store = WorkOrderStore::new();
    let error = DocumentIngestor::new(&mut store)
        .ingest("sample_ccd.xml", &read_fixture("sample_ccd.xml"))
        .expect_err("no work unit");
    assert!(matches!(error, IngestError::NoActiveWorkUnit));
    assert_eq!(store.row_count(), 0);
}

#[test]
fn batch_isolates_failing_documents() {
    let mut store = WorkOrderStore::new();
    store.create_work_unit("batch");
    let paths = vec![
        fixture("missing_body.xml"),
        fixture("does_not_exist.xml"),
        fixture("sample_ccd.xml"),
    ];
    let report = DocumentIngestor::new(&mut store).ingest_batch(&paths);

    assert_eq!(report.ingested.len(), 1);
    assert_eq!(report.failures.len(), 2);
    assert!(report.has_failures());
    assert!(matches!(report.failures[1].error, IngestError::Io { .. }));
    assert_eq!(store.table(TableName::Documents).len(), 1);
}
