//! Section code to record kind lookup.

use cda_model::RecordKind;

/// Fixed lookup table. Codes not listed convert as generic observations.
pub const SECTION_KINDS: &[(&str, RecordKind)] = &[
    ("10160-0", RecordKind::MedicationAdministration),
    ("29762-2", RecordKind::SocialHistory),
    ("8716-3", RecordKind::VitalSigns),
    ("Allergies", RecordKind::AllergyIntolerance),
    ("48765-2", RecordKind::AllergyIntolerance),
    ("Problems", RecordKind::Condition),
    ("11450-4", RecordKind::Condition),
];

pub fn record_kind(section_code: &str) -> RecordKind {
    SECTION_KINDS
        .iter()
        .find(|(code, _)| *code == section_code)
        .map_or(RecordKind::Observation, |(_, kind)| *kind)
}
