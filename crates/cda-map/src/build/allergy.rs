use cda_model::MappingError;
use cda_model::record::{
    AllergyIntolerance, AllergyIntoleranceCategory, AllergyIntoleranceType, CodeableConcept,
    Coding, Reaction,
};

use super::{EntryContext, status_concept};

const DEFAULT_STATUS: &str = "active";
const CLINICAL_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/allergyintolerance-clinical";
const VERIFICATION_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/allergyintolerance-verification";
const CLINICAL_STATUSES: &[(&str, &str)] = &[
    ("active", "Active"),
    ("inactive", "Inactive"),
    ("resolved", "Resolved"),
];

pub(super) fn build(context: &EntryContext<'_>) -> Result<AllergyIntolerance, MappingError> {
    let status_code = context.status(DEFAULT_STATUS);
    let clinical_status = status_concept(CLINICAL_STATUSES, CLINICAL_SYSTEM, &status_code)
        .ok_or_else(|| context.invalid_status(status_code))?;
    let verification_status =
        CodeableConcept::from_coding(Coding::new(VERIFICATION_SYSTEM, "confirmed", "Confirmed"));

    let resolver = &context.resolver;
    let kind = resolver.text("type").as_deref().and_then(allergy_type);
    let category = resolver
        .text("category")
        .as_deref()
        .and_then(allergy_category)
        .into_iter()
        .collect();
    let reaction = resolver
        .text("reaction.description")
        .map(|description| Reaction { description })
        .into_iter()
        .collect();

    Ok(AllergyIntolerance {
        id: context.id.clone(),
        meta: context.meta(),
        clinical_status,
        verification_status,
        kind,
        category,
        code: context.concept("allergen"),
        patient: context.subject.clone(),
        reaction,
    })
}

/// Free-text classification, e.g. "Drug intolerance".
fn allergy_type(text: &str) -> Option<AllergyIntoleranceType> {
    let text = text.to_lowercase();
    if text.contains("intolerance") {
        Some(AllergyIntoleranceType::Intolerance)
    } else if text.contains("allerg") {
        Some(AllergyIntoleranceType::Allergy)
    } else {
        None
    }
}

fn allergy_category(text: &str) -> Option<AllergyIntoleranceCategory> {
    let text = text.to_lowercase();
    [
        ("food", AllergyIntoleranceCategory::Food),
        ("drug", AllergyIntoleranceCategory::Medication),
        ("medication", AllergyIntoleranceCategory::Medication),
        ("environment", AllergyIntoleranceCategory::Environment),
        ("biologic", AllergyIntoleranceCategory::Biologic),
    ]
    .into_iter()
    .find_map(|(needle, category)| text.contains(needle).then_some(category))
}
