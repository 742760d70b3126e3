use cda_model::MappingError;
use cda_model::record::{CodeableConcept, Coding, Condition};

use super::{EntryContext, status_concept};

const DEFAULT_STATUS: &str = "active";
const CLINICAL_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-clinical";
const VERIFICATION_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-ver-status";
const CATEGORY_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/condition-category";
const CLINICAL_STATUSES: &[(&str, &str)] = &[
    ("active", "Active"),
    ("recurrence", "Recurrence"),
    ("relapse", "Relapse"),
    ("inactive", "Inactive"),
    ("remission", "Remission"),
    ("resolved", "Resolved"),
];

pub(super) fn build(context: &EntryContext<'_>) -> Result<Condition, MappingError> {
    let status_code = context.status(DEFAULT_STATUS);
    let clinical_status = status_concept(CLINICAL_STATUSES, CLINICAL_SYSTEM, &status_code)
        .ok_or_else(|| context.invalid_status(status_code))?;

    Ok(Condition {
        id: context.id.clone(),
        meta: context.meta(),
        clinical_status,
        verification_status: CodeableConcept::from_coding(Coding::new(
            VERIFICATION_SYSTEM,
            "confirmed",
            "Confirmed",
        )),
        category: vec![CodeableConcept::from_coding(Coding::new(
            CATEGORY_SYSTEM,
            "problem-list-item",
            "Problem List Item",
        ))],
        code: context.concept("code"),
        subject: context.subject.clone(),
        onset_period: context.period("onset.start", "onset.end")?,
        recorded_date: context.resolver.date_time("recorded")?,
    })
}
