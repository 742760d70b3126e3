use std::path::PathBuf;

use cda_ingest::DocumentIngestor;
use cda_map::{
    StoredEntry, convert_entries, convert_entry, convert_store, default_templates,
};
use cda_model::record::AllergyIntoleranceType;
use cda_model::{
    ClinicalRecord, FieldPaths, FlatValueMap, MappingError, MappingTemplates, RecordKind,
    ResourceTemplate, WorkOrderStore,
};
use serde_json::json;

fn sample_document() -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../cda-ingest/tests/fixtures/sample_ccd.xml");
    std::fs::read(path).expect("read sample document")
}

fn ingested_store() -> WorkOrderStore {
    let mut store = WorkOrderStore::new();
    store.create_work_unit("conversion");
    DocumentIngestor::new(&mut store)
        .ingest("sample_ccd.xml", &sample_document())
        .expect("ingest sample");
    store
}

/// Ingests a one-section document and returns its store.
fn ingest_section(section: &str) -> WorkOrderStore {
    let document = format!(
        r#"<ClinicalDocument xmlns="urn:hl7-org:v3" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <recordTarget><patientRole><id extension="4711" root="2.16.840.1.113883.19.5"/></patientRole></recordTarget>
  <author><time value="20200615"/></author>
  <component><structuredBody><component>{section}</component></structuredBody></component>
</ClinicalDocument>"#
    );
    let mut store = WorkOrderStore::new();
    store.create_work_unit("conversion");
    DocumentIngestor::new(&mut store)
        .ingest("section.xml", document.as_bytes())
        .expect("ingest document");
    store
}

fn entry(content_id: &str, section_code: &str, values: &[(&str, &str)]) -> StoredEntry {
    let values: FlatValueMap = values.iter().copied().collect();
    StoredEntry::new(content_id, values)
        .with_section(section_code, "Section")
        .with_subject("p1")
}

#[test]
fn sample_document_converts_every_entry() {
    let store = ingested_store();
    let templates = default_templates().expect("templates");
    let outcome = convert_store(&store, &templates);

    assert!(!outcome.has_skipped(), "skipped: {:?}", outcome.skipped);
    let types: Vec<_> = outcome
        .bundle()
        .entry
        .iter()
        .map(|entry| entry.full_url.split('/').next().unwrap_or_default().to_string())
        .collect();
    assert_eq!(
        types,
        vec![
            "MedicationAdministration",
            "Observation",
            "Observation",
            "Observation",
            "AllergyIntolerance",
            "Condition",
            "Observation",
        ]
    );

    let ClinicalRecord::MedicationAdministration(medication) = &outcome.records[0] else {
        panic!("expected a medication administration");
    };
    assert!(medication.id.starts_with("med-"));
    assert!(medication.subject.reference.starts_with("Patient/"));
    assert_eq!(medication.effective_date_time.as_deref(), Some("2020-03-01"));
    let dosage = medication.dosage.as_ref().expect("dosage");
    assert_eq!(dosage.dose.as_ref().map(|dose| dose.value), Some(1.0));
    assert!(dosage.route.is_some());

    let ClinicalRecord::Observation(blood_pressure) = &outcome.records[3] else {
        panic!("expected an observation");
    };
    assert!(blood_pressure.id.starts_with("vital-"));
    let ratio = blood_pressure.value_ratio.as_ref().expect("ratio");
    assert_eq!(ratio.numerator.value, 120.0);
    assert_eq!(ratio.denominator.value, 80.0);
    assert_eq!(ratio.numerator.unit.as_deref(), Some("mm[Hg]"));

    let ClinicalRecord::AllergyIntolerance(allergy) = &outcome.records[4] else {
        panic!("expected an allergy");
    };
    assert_eq!(allergy.kind, Some(AllergyIntoleranceType::Allergy));
    assert_eq!(allergy.reaction[0].description, "Hives after penicillin");

    let ClinicalRecord::Condition(condition) = &outcome.records[5] else {
        panic!("expected a condition");
    };
    let onset = condition.onset_period.as_ref().expect("onset");
    assert_eq!(onset.start.as_deref(), Some("2018-03-12"));
    let code = condition.code.as_ref().expect("code");
    assert_eq!(code.coding[0].system.as_deref(), Some("http://snomed.info/sct"));
}

#[test]
fn social_history_period_comes_through_unchanged() {
    let templates = default_templates().expect("templates");
    let entry = entry(
        "c-social",
        "29762-2",
        &[
            ("observation.effectiveTime.low@value", "2020-01-01"),
            ("observation.effectiveTime.high@value", "2020-01-05"),
        ],
    );
    let outcome = convert_entries([&entry], &templates);
    assert_eq!(outcome.records.len(), 1);

    let json = serde_json::to_value(&outcome.records[0]).expect("serialize");
    assert_eq!(
        json,
        json!({
            "resourceType": "Observation",
            "id": "obs-c-social",
            "meta": {
                "profile": [
                    "http://hl7.org/fhir/us/core/StructureDefinition/us-core-observation-social-history"
                ]
            },
            "status": "final",
            "category": [{
                "coding": [{
                    "system": "http://terminology.hl7.org/CodeSystem/observation-category",
                    "code": "social-history",
                    "display": "Social History"
                }]
            }],
            "code": { "text": "Section" },
            "subject": { "reference": "Patient/p1" },
            "effectivePeriod": { "start": "2020-01-01", "end": "2020-01-05" }
        })
    );
}

#[test]
fn failing_entry_is_skipped_while_siblings_convert() {
    let templates = default_templates().expect("templates");
    let entries = [
        entry("c-1", "8716-3", &[("observation.value@value", "72")]),
        // a quantity vital sign without a value
        entry("c-2", "8716-3", &[("observation.code@code", "8867-4")]),
        entry(
            "c-3",
            "29762-2",
            &[("observation.effectiveTime.low@value", "sometime in spring")],
        ),
        entry("c-4", "30954-2", &[("observation.value@value", "high")]),
    ];

    let outcome = convert_entries(&entries, &templates);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.skipped.len(), 2);

    assert_eq!(outcome.skipped[0].content_id, "c-2");
    assert_eq!(outcome.skipped[0].kind, RecordKind::VitalSigns);
    assert_eq!(
        outcome.skipped[0].error,
        MappingError::MissingField {
            field: "value.value".to_string()
        }
    );
    assert_eq!(outcome.skipped[1].content_id, "c-3");
    assert!(matches!(
        outcome.skipped[1].error,
        MappingError::InvalidDateTime { ref field, .. } if field == "effective.low"
    ));

    let ClinicalRecord::Observation(generic) = &outcome.records[1] else {
        panic!("expected an observation");
    };
    assert_eq!(generic.value_string.as_deref(), Some("high"));
    assert_eq!(generic.value_quantity, None);
}

#[test]
fn missing_template_skips_only_that_kind() {
    let mut templates = MappingTemplates::new();
    templates.insert(
        RecordKind::Observation,
        ResourceTemplate::default()
            .with_field("value.value", FieldPaths::new(["observation.value@value"])),
    );

    let condition = entry("c-1", "11450-4", &[]);
    assert_eq!(
        convert_entry(&condition, &templates),
        Err(MappingError::MissingTemplate {
            kind: RecordKind::Condition
        })
    );
    let result = entry("c-2", "30954-2", &[("observation.value@value", "98")]);
    assert!(convert_entry(&result, &templates).is_ok());
}

#[test]
fn invalid_template_status_is_rejected() {
    let mut templates = MappingTemplates::new();
    templates.insert(
        RecordKind::Condition,
        ResourceTemplate {
            status: Some("chronic".to_string()),
            ..ResourceTemplate::default()
        },
    );
    let condition = entry("c-1", "11450-4", &[]);
    assert_eq!(
        convert_entry(&condition, &templates),
        Err(MappingError::InvalidCode {
            kind: RecordKind::Condition,
            field: "status",
            value: "chronic".to_string()
        })
    );
}

#[test]
fn unparseable_ratio_parts_degrade_to_zero() {
    let templates = default_templates().expect("templates");
    let entry = entry(
        "c-bp",
        "8716-3",
        &[
            ("observation.value@type", "RTO_PQ_PQ"),
            ("observation.value.numerator@value", "120"),
            ("observation.value.denominator@value", "n/a"),
        ],
    );
    let ClinicalRecord::Observation(observation) =
        convert_entry(&entry, &templates).expect("convert")
    else {
        panic!("expected an observation");
    };
    let ratio = observation.value_ratio.expect("ratio");
    assert_eq!(ratio.numerator.value, 120.0);
    assert_eq!(ratio.denominator.value, 0.0);
}

#[test]
fn social_history_period_survives_the_document_pipeline() {
    let store = ingest_section(
        r#"<section>
  <code code="29762-2" codeSystem="2.16.840.1.113883.6.1" displayName="Social History"/>
  <title>Social History</title>
  <entry typeCode="DRIV">
    <observation classCode="OBS" moodCode="EVN">
      <code code="72166-2" codeSystem="2.16.840.1.113883.6.1"/>
      <effectiveTime>
        <low value="2020-01-01"/>
        <high value="2020-01-05"/>
      </effectiveTime>
    </observation>
  </entry>
</section>"#,
    );
    let templates = default_templates().expect("templates");
    let outcome = convert_store(&store, &templates);

    assert!(!outcome.has_skipped(), "skipped: {:?}", outcome.skipped);
    assert_eq!(outcome.records.len(), 1);
    let ClinicalRecord::Observation(observation) = &outcome.records[0] else {
        panic!("expected an observation");
    };
    let period = observation.effective_period.as_ref().expect("period");
    assert_eq!(period.start.as_deref(), Some("2020-01-01"));
    assert_eq!(period.end.as_deref(), Some("2020-01-05"));
    assert_eq!(observation.effective_date_time, None);
    // social history codes keep an absent display
    assert_eq!(observation.code.coding[0].code.as_deref(), Some("72166-2"));
    assert_eq!(observation.code.coding[0].display, None);
}

#[test]
fn vital_signs_organizer_reads_its_first_component() {
    let store = ingest_section(
        r#"<section>
  <code code="8716-3" codeSystem="2.16.840.1.113883.6.1" displayName="Vital signs"/>
  <title>Vital Signs</title>
  <entry typeCode="DRIV">
    <organizer classCode="CLUSTER" moodCode="EVN">
      <code code="46680005" codeSystem="2.16.840.1.113883.6.96" displayName="Vital signs"/>
      <statusCode code="completed"/>
      <effectiveTime value="20200615"/>
      <component>
        <observation classCode="OBS" moodCode="EVN">
          <code code="8867-4" codeSystem="2.16.840.1.113883.6.1" displayName="Heart rate"/>
          <effectiveTime value="20200615"/>
          <value xsi:type="PQ" value="72" unit="/min"/>
        </observation>
      </component>
      <component>
        <observation classCode="OBS" moodCode="EVN">
          <code code="9279-1" codeSystem="2.16.840.1.113883.6.1" displayName="Respiratory rate"/>
          <effectiveTime value="20200615"/>
          <value xsi:type="PQ" value="16" unit="/min"/>
        </observation>
      </component>
    </organizer>
  </entry>
</section>"#,
    );
    let templates = default_templates().expect("templates");
    let outcome = convert_store(&store, &templates);

    assert!(!outcome.has_skipped(), "skipped: {:?}", outcome.skipped);
    assert_eq!(outcome.records.len(), 1);
    let ClinicalRecord::Observation(observation) = &outcome.records[0] else {
        panic!("expected an observation");
    };
    assert!(observation.id.starts_with("vital-"));
    assert_eq!(observation.code.coding[0].code.as_deref(), Some("8867-4"));
    assert_eq!(observation.effective_date_time.as_deref(), Some("2020-06-15"));
    let quantity = observation.value_quantity.as_ref().expect("quantity");
    assert_eq!(quantity.value, 72.0);
    assert_eq!(quantity.unit.as_deref(), Some("/min"));
}

#[test]
fn observation_rooted_problem_keeps_its_dates() {
    let templates = default_templates().expect("templates");
    let entry = entry(
        "c-problem",
        "11450-4",
        &[
            ("observation.value@code", "38341003"),
            ("observation.effectiveTime.low@value", "20180312"),
            ("observation.effectiveTime@value", "20180312"),
        ],
    );
    let ClinicalRecord::Condition(condition) =
        convert_entry(&entry, &templates).expect("convert")
    else {
        panic!("expected a condition");
    };
    let onset = condition.onset_period.as_ref().expect("onset");
    assert_eq!(onset.start.as_deref(), Some("2018-03-12"));
    assert_eq!(onset.end, None);
    assert_eq!(condition.recorded_date.as_deref(), Some("2018-03-12"));
}

#[test]
fn codes_without_a_system_get_fallback_systems() {
    let templates = default_templates().expect("templates");
    let result = entry(
        "c-result",
        "30954-2",
        &[
            ("observation.code@code", "panel"),
            ("observation.value@code", "POS"),
        ],
    );
    let ClinicalRecord::Observation(observation) =
        convert_entry(&result, &templates).expect("convert result")
    else {
        panic!("expected an observation");
    };
    assert_eq!(
        observation.code.coding[0].system.as_deref(),
        Some("http://terminology.hl7.org/CodeSystem/observation-category")
    );
    // generic observations borrow the section label
    assert_eq!(observation.code.coding[0].display.as_deref(), Some("Section"));
    let value = observation.value_codeable_concept.as_ref().expect("coded value");
    assert_eq!(
        value.coding[0].system.as_deref(),
        Some("http://terminology.hl7.org/CodeSystem/v3-NullFlavor")
    );

    let problem = entry("c-problem", "11450-4", &[("observation.value@code", "UNK")]);
    let ClinicalRecord::Condition(condition) =
        convert_entry(&problem, &templates).expect("convert problem")
    else {
        panic!("expected a condition");
    };
    let code = condition.code.as_ref().expect("code");
    assert_eq!(
        code.coding[0].system.as_deref(),
        Some("http://terminology.hl7.org/CodeSystem/v3-NullFlavor")
    );

    let allergy = entry("c-allergy", "48765-2", &[("observation.value@code", "7980")]);
    let ClinicalRecord::AllergyIntolerance(allergy) =
        convert_entry(&allergy, &templates).expect("convert allergy")
    else {
        panic!("expected an allergy");
    };
    let code = allergy.code.as_ref().expect("allergen");
    assert_eq!(
        code.coding[0].system.as_deref(),
        Some("http://terminology.hl7.org/CodeSystem/v3-NullFlavor")
    );
}
