//! Typed clinical records, shaped after FHIR R4 resources.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The output shape chosen for a section code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    MedicationAdministration,
    SocialHistory,
    VitalSigns,
    Observation,
    AllergyIntolerance,
    Condition,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::MedicationAdministration,
        RecordKind::SocialHistory,
        RecordKind::VitalSigns,
        RecordKind::Observation,
        RecordKind::AllergyIntolerance,
        RecordKind::Condition,
    ];

    /// Top-level key of this kind in a template file.
    pub fn template_key(self) -> &'static str {
        match self {
            RecordKind::MedicationAdministration => "medication_administration",
            RecordKind::SocialHistory => "social_history",
            RecordKind::VitalSigns => "vital_signs",
            RecordKind::Observation => "observation",
            RecordKind::AllergyIntolerance => "allergy_intolerance",
            RecordKind::Condition => "condition",
        }
    }

    pub fn from_template_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.template_key() == key)
    }

    pub fn resource_type(self) -> &'static str {
        match self {
            RecordKind::MedicationAdministration => "MedicationAdministration",
            RecordKind::SocialHistory | RecordKind::VitalSigns | RecordKind::Observation => {
                "Observation"
            }
            RecordKind::AllergyIntolerance => "AllergyIntolerance",
            RecordKind::Condition => "Condition",
        }
    }

    pub fn id_prefix(self) -> &'static str {
        match self {
            RecordKind::MedicationAdministration => "med-",
            RecordKind::SocialHistory | RecordKind::Observation => "obs-",
            RecordKind::VitalSigns => "vital-",
            RecordKind::AllergyIntolerance => "allergy-",
            RecordKind::Condition => "cond-",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template_key())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: &str, code: &str, display: &str) -> Self {
        Self {
            system: Some(system.to_string()),
            code: Some(code.to_string()),
            display: Some(display.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_coding(coding: Coding) -> Self {
        Self {
            coding: vec![coding],
            text: None,
        }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Quantity {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    pub numerator: Quantity,
    pub denominator: Quantity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

impl Period {
    /// A period with neither bound carries nothing.
    pub fn non_empty(start: Option<String>, end: Option<String>) -> Option<Self> {
        (start.is_some() || end.is_some()).then_some(Self { start, end })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,
}

impl Meta {
    pub fn with_profile(profile: Option<&str>) -> Option<Self> {
        profile.map(|profile| Self {
            profile: vec![profile.to_string()],
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dosage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MedicationAdministrationStatus {
    InProgress,
    NotDone,
    OnHold,
    Completed,
    EnteredInError,
    Stopped,
    Unknown,
}

impl MedicationAdministrationStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "in-progress" => Some(Self::InProgress),
            "not-done" => Some(Self::NotDone),
            "on-hold" => Some(Self::OnHold),
            "completed" => Some(Self::Completed),
            "entered-in-error" => Some(Self::EnteredInError),
            "stopped" => Some(Self::Stopped),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    Registered,
    Preliminary,
    Final,
    Amended,
    Corrected,
    Cancelled,
    EnteredInError,
    Unknown,
}

impl ObservationStatus {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "registered" => Some(Self::Registered),
            "preliminary" => Some(Self::Preliminary),
            "final" => Some(Self::Final),
            "amended" => Some(Self::Amended),
            "corrected" => Some(Self::Corrected),
            "cancelled" => Some(Self::Cancelled),
            "entered-in-error" => Some(Self::EnteredInError),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdministration {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub status: MedicationAdministrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medication_codeable_concept: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dosage: Option<Dosage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub status: ObservationStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    pub code: CodeableConcept,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_quantity: Option<Quantity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_ratio: Option<Ratio>,
}

impl Observation {
    /// An observation with only its identity, status, code and subject set.
    pub fn new(
        id: String,
        status: ObservationStatus,
        code: CodeableConcept,
        subject: Reference,
    ) -> Self {
        Self {
            id,
            meta: None,
            status,
            category: Vec::new(),
            code,
            subject,
            effective_date_time: None,
            effective_period: None,
            value_quantity: None,
            value_codeable_concept: None,
            value_string: None,
            value_ratio: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergyIntoleranceType {
    Allergy,
    Intolerance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllergyIntoleranceCategory {
    Food,
    Medication,
    Environment,
    Biologic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllergyIntolerance {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub clinical_status: CodeableConcept,
    pub verification_status: CodeableConcept,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<AllergyIntoleranceType>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<AllergyIntoleranceCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub patient: Reference,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reaction: Vec<Reaction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    pub clinical_status: CodeableConcept,
    pub verification_status: CodeableConcept,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,
    pub subject: Reference,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_period: Option<Period>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recorded_date: Option<String>,
}

/// Records that can be addressed inside a bundle.
pub trait HasIdentifier {
    fn id(&self) -> &str;
    fn resource_type(&self) -> &'static str;

    /// `ResourceType/id`.
    fn full_url(&self) -> String {
        format!("{}/{}", self.resource_type(), self.id())
    }
}

macro_rules! impl_has_identifier {
    ($($record:ident),* $(,)?) => {
        $(
            impl HasIdentifier for $record {
                fn id(&self) -> &str {
                    &self.id
                }

                fn resource_type(&self) -> &'static str {
                    stringify!($record)
                }
            }
        )*
    };
}

impl_has_identifier!(
    MedicationAdministration,
    Observation,
    AllergyIntolerance,
    Condition
);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum ClinicalRecord {
    MedicationAdministration(MedicationAdministration),
    Observation(Observation),
    AllergyIntolerance(AllergyIntolerance),
    Condition(Condition),
}

impl ClinicalRecord {
    fn inner(&self) -> &dyn HasIdentifier {
        match self {
            ClinicalRecord::MedicationAdministration(record) => record,
            ClinicalRecord::Observation(record) => record,
            ClinicalRecord::AllergyIntolerance(record) => record,
            ClinicalRecord::Condition(record) => record,
        }
    }
}

impl HasIdentifier for ClinicalRecord {
    fn id(&self) -> &str {
        self.inner().id()
    }

    fn resource_type(&self) -> &'static str {
        self.inner().resource_type()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: ClinicalRecord,
}

/// A `collection` bundle of converted records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordBundle {
    pub resource_type: String,
    #[serde(rename = "type")]
    pub bundle_type: String,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

impl RecordBundle {
    pub fn collection(records: impl IntoIterator<Item = ClinicalRecord>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            bundle_type: "collection".to_string(),
            entry: records
                .into_iter()
                .map(|resource| BundleEntry {
                    full_url: resource.full_url(),
                    resource,
                })
                .collect(),
        }
    }
}
