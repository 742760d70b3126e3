//! Document-level organisation: patient and author metadata via fixed
//! navigation paths, and top-level sections with their entries.

use roxmltree::{Document, Node};
use tracing::warn;

use cda_model::registry::{FieldPath, author, namespace_uri, patient};
use cda_model::{
    AuthorRecord, DocumentExtraction, ExtractError, PatientRecord, Section, SectionMeta, Sections,
};

use crate::extract::{collect_attributes, extract_element, is_cda_element, parse, validate};

const SECTION: &str = "section";
const ENTRY: &str = "entry";

/// Parses, validates and organises one document.
pub fn organize_document(bytes: &[u8]) -> Result<DocumentExtraction, ExtractError> {
    let document = parse(bytes)?;
    validate(&document)?;
    Ok(organize(&document))
}

pub fn organize(document: &Document<'_>) -> DocumentExtraction {
    let root = document.root_element();
    let patient = root
        .descendants()
        .find(|node| is_cda_element(*node, patient::ROLE))
        .map(read_patient)
        .unwrap_or_default();
    let authors = root
        .descendants()
        .filter(|node| is_cda_element(*node, author::ELEMENT))
        .map(read_author)
        .collect();
    DocumentExtraction {
        patient,
        authors,
        sections: collect_sections(root),
    }
}

/// Reads one field from `start`.
///
/// Each step moves to the first matching descendant in document order; a
/// leading `.` step stays on `start`. Returns the trimmed attribute value
/// when an attribute is requested, otherwise the trimmed text content.
/// Any failure yields an empty string, which callers cannot tell apart
/// from a value that is genuinely empty.
pub fn navigate(start: Node<'_, '_>, path: &FieldPath) -> String {
    let Some(node) = resolve(start, path.steps) else {
        return String::new();
    };
    match path.attribute {
        Some(name) => node.attribute(name).map(str::trim).unwrap_or_default().to_string(),
        None => text_content(node).trim().to_string(),
    }
}

fn resolve<'a, 'input>(start: Node<'a, 'input>, steps: &str) -> Option<Node<'a, 'input>> {
    let mut current = start;
    for (index, step) in steps.split('/').enumerate() {
        if index == 0 && step == "." {
            continue;
        }
        let (namespace, local_name) = match step.split_once(':') {
            Some((prefix, local_name)) => (Some(namespace_uri(prefix)?), local_name),
            None => (None, step),
        };
        if local_name.is_empty() {
            return None;
        }
        current = current.descendants().skip(1).find(|node| {
            node.is_element()
                && node.tag_name().name() == local_name
                && namespace.is_none_or(|uri| node.tag_name().namespace() == Some(uri))
        })?;
    }
    Some(current)
}

fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|text| text.text())
        .collect()
}

fn read_patient(role: Node<'_, '_>) -> PatientRecord {
    PatientRecord {
        given_name: navigate(role, &patient::GIVEN_NAME),
        family_name: navigate(role, &patient::FAMILY_NAME),
        gender: navigate(role, &patient::GENDER),
        birth_date: navigate(role, &patient::BIRTH_DATE),
        identifier: navigate(role, &patient::IDENTIFIER),
        identifier_root: navigate(role, &patient::IDENTIFIER_ROOT),
    }
}

fn read_author(element: Node<'_, '_>) -> AuthorRecord {
    AuthorRecord {
        given_name: navigate(element, &author::GIVEN_NAME),
        family_name: navigate(element, &author::FAMILY_NAME),
        organization: navigate(element, &author::ORGANIZATION),
        identifier: navigate(element, &author::IDENTIFIER),
        authored_at: navigate(element, &author::TIME),
    }
}

fn collect_sections(root: Node<'_, '_>) -> Sections {
    let mut sections = Sections::new();
    let top_level = root
        .descendants()
        .filter(|node| is_cda_element(*node, SECTION))
        .filter(|node| {
            !node
                .ancestors()
                .skip(1)
                .any(|ancestor| is_cda_element(ancestor, SECTION))
        });
    for element in top_level {
        let meta = SectionMeta {
            code: first_descendant(element, "code").map(collect_attributes),
            title: first_descendant(element, "title")
                .map(|title| text_content(title).trim().to_string()),
        };
        let entries = element
            .children()
            .filter(|child| is_cda_element(*child, ENTRY))
            .map(extract_element)
            .collect();
        let key = meta.key();
        if sections.insert(key.clone(), Section { meta, entries }).is_some() {
            warn!(section = %key, "duplicate section key; earlier section replaced");
        }
    }
    sections
}

fn first_descendant<'a, 'input>(
    node: Node<'a, 'input>,
    local_name: &str,
) -> Option<Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .find(|candidate| is_cda_element(*candidate, local_name))
}
