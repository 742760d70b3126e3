//! Per-kind record builders.
//!
//! Each builder reads named template fields through a [`Resolver`] and
//! assembles one typed record. Optional sub-parts are omitted when their
//! defining field resolves to nothing.

mod allergy;
mod condition;
mod medication;
mod observation;

use cda_model::record::{CodeableConcept, Coding, Meta, Period, Reference};
use cda_model::registry::code_system_uri;
use cda_model::{ClinicalRecord, MappingError, RecordKind, ResourceTemplate};

use crate::resolver::Resolver;
use crate::stored::StoredEntry;

/// Builds the record for one stored entry.
pub fn build_record(
    kind: RecordKind,
    entry: &StoredEntry,
    template: &ResourceTemplate,
) -> Result<ClinicalRecord, MappingError> {
    let context = EntryContext::new(kind, entry, template)?;
    let record = match kind {
        RecordKind::MedicationAdministration => {
            ClinicalRecord::MedicationAdministration(medication::build(&context)?)
        }
        RecordKind::SocialHistory | RecordKind::VitalSigns | RecordKind::Observation => {
            ClinicalRecord::Observation(observation::build(&context)?)
        }
        RecordKind::AllergyIntolerance => {
            ClinicalRecord::AllergyIntolerance(allergy::build(&context)?)
        }
        RecordKind::Condition => ClinicalRecord::Condition(condition::build(&context)?),
    };
    Ok(record)
}

/// Everything a builder needs about the entry it converts.
pub(crate) struct EntryContext<'a> {
    kind: RecordKind,
    id: String,
    subject: Reference,
    label: &'a str,
    template: &'a ResourceTemplate,
    resolver: Resolver<'a>,
}

impl<'a> EntryContext<'a> {
    fn new(
        kind: RecordKind,
        entry: &'a StoredEntry,
        template: &'a ResourceTemplate,
    ) -> Result<Self, MappingError> {
        let subject = entry
            .subject
            .as_deref()
            .map(Reference::new)
            .ok_or_else(|| MappingError::MissingField {
                field: "subject".to_string(),
            })?;
        let label = entry
            .section_title
            .as_deref()
            .or(entry.section_code.as_deref())
            .unwrap_or_default();
        Ok(Self {
            kind,
            id: format!("{}{}", kind.id_prefix(), entry.content_id),
            subject,
            label,
            template,
            resolver: Resolver::new(&entry.values, template),
        })
    }

    /// Template status, or `fallback` when the template declares none.
    fn status(&self, fallback: &'static str) -> String {
        self.template
            .status
            .clone()
            .unwrap_or_else(|| fallback.to_string())
    }

    fn invalid_status(&self, value: String) -> MappingError {
        MappingError::InvalidCode {
            kind: self.kind,
            field: "status",
            value,
        }
    }

    fn meta(&self) -> Option<Meta> {
        Meta::with_profile(self.template.profile.as_deref())
    }

    /// `<group>.code`, `<group>.display` and `<group>.system` as a coding.
    /// Nothing unless the code itself resolves.
    fn coding(&self, group: &str) -> Option<Coding> {
        let code = self.resolver.text(&format!("{group}.code"))?;
        Some(Coding {
            system: self
                .resolver
                .text(&format!("{group}.system"))
                .map(|system| code_system_uri(&system).to_string()),
            code: Some(code),
            display: self.resolver.text(&format!("{group}.display")),
        })
    }

    fn concept(&self, group: &str) -> Option<CodeableConcept> {
        self.coding(group).map(CodeableConcept::from_coding)
    }

    /// A period from two bound fields, or nothing when both are absent.
    fn period(&self, start: &str, end: &str) -> Result<Option<Period>, MappingError> {
        Ok(Period::non_empty(
            self.resolver.date_time(start)?,
            self.resolver.date_time(end)?,
        ))
    }
}

/// Looks `code` up in a status vocabulary of `(code, display)` pairs.
fn status_concept(
    vocabulary: &[(&str, &str)],
    system: &str,
    code: &str,
) -> Option<CodeableConcept> {
    vocabulary
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(code, display)| CodeableConcept::from_coding(Coding::new(system, code, display)))
}
