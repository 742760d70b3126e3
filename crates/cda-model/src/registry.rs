//! Fixed namespace, code-system and navigation tables.

/// A namespace prefix accepted in navigation paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Namespace {
    pub prefix: &'static str,
    pub uri: &'static str,
}

pub const CDA_NAMESPACE: &str = "urn:hl7-org:v3";
pub const SDTC_NAMESPACE: &str = "urn:hl7-org:sdtc";

pub const NAMESPACES: &[Namespace] = &[
    Namespace {
        prefix: "cda",
        uri: CDA_NAMESPACE,
    },
    Namespace {
        prefix: "sdtc",
        uri: SDTC_NAMESPACE,
    },
];

pub fn namespace_uri(prefix: &str) -> Option<&'static str> {
    NAMESPACES
        .iter()
        .find(|namespace| namespace.prefix == prefix)
        .map(|namespace| namespace.uri)
}

/// A known terminology, by OID and canonical URI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSystem {
    pub name: &'static str,
    pub oid: &'static str,
    pub uri: &'static str,
}

pub const LOINC: CodeSystem = CodeSystem {
    name: "LOINC",
    oid: "2.16.840.1.113883.6.1",
    uri: "http://loinc.org",
};

pub const SNOMED_CT: CodeSystem = CodeSystem {
    name: "SNOMED-CT",
    oid: "2.16.840.1.113883.6.96",
    uri: "http://snomed.info/sct",
};

pub const HL7_GENDER: CodeSystem = CodeSystem {
    name: "HL7Gender",
    oid: "2.16.840.1.113883.5.1",
    uri: "http://terminology.hl7.org/CodeSystem/v3-AdministrativeGender",
};

pub const CODE_SYSTEMS: &[CodeSystem] = &[LOINC, SNOMED_CT, HL7_GENDER];

pub fn code_system_by_oid(oid: &str) -> Option<&'static CodeSystem> {
    CODE_SYSTEMS.iter().find(|system| system.oid == oid)
}

/// Translates a known OID into its canonical URI. Anything else passes
/// through unchanged.
pub fn code_system_uri(value: &str) -> &str {
    code_system_by_oid(value).map_or(value, |system| system.uri)
}

/// Elements a document must contain, in the CDA namespace.
pub const REQUIRED_ELEMENTS: &[&str] = &["patientRole", "author", "structuredBody"];

/// A navigation path: slash-separated `prefix:localName` steps plus an
/// optional attribute to read from the element reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub steps: &'static str,
    pub attribute: Option<&'static str>,
}

impl FieldPath {
    const fn text(steps: &'static str) -> Self {
        Self {
            steps,
            attribute: None,
        }
    }

    const fn attribute(steps: &'static str, attribute: &'static str) -> Self {
        Self {
            steps,
            attribute: Some(attribute),
        }
    }
}

/// Paths relative to a `patientRole` element.
pub mod patient {
    use super::FieldPath;

    pub const ROLE: &str = "patientRole";
    pub const GIVEN_NAME: FieldPath = FieldPath::text("./cda:patient/cda:name/cda:given");
    pub const FAMILY_NAME: FieldPath = FieldPath::text("./cda:patient/cda:name/cda:family");
    pub const GENDER: FieldPath =
        FieldPath::attribute("./cda:patient/cda:administrativeGenderCode", "code");
    pub const BIRTH_DATE: FieldPath = FieldPath::attribute("./cda:patient/cda:birthTime", "value");
    pub const IDENTIFIER: FieldPath = FieldPath::attribute("./cda:id", "extension");
    pub const IDENTIFIER_ROOT: FieldPath = FieldPath::attribute("./cda:id", "root");
}

/// Paths relative to an `author` element.
pub mod author {
    use super::FieldPath;

    pub const ELEMENT: &str = "author";
    pub const GIVEN_NAME: FieldPath =
        FieldPath::text("./cda:assignedAuthor/cda:assignedPerson/cda:name/cda:given");
    pub const FAMILY_NAME: FieldPath =
        FieldPath::text("./cda:assignedAuthor/cda:assignedPerson/cda:name/cda:family");
    pub const ORGANIZATION: FieldPath =
        FieldPath::text("./cda:assignedAuthor/cda:representedOrganization/cda:name");
    pub const IDENTIFIER: FieldPath = FieldPath::attribute("./cda:assignedAuthor/cda:id", "extension");
    pub const TIME: FieldPath = FieldPath::attribute("./cda:time", "value");
}
