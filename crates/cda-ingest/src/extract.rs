//! Structural extraction of raw XML into [`TreeNode`]s.

use roxmltree::{Document, Node, ParsingOptions};

use cda_model::registry::{CDA_NAMESPACE, REQUIRED_ELEMENTS};
use cda_model::{Attributes, Children, ExtractError, TreeNode};

/// Parses raw bytes into a DOM. Non-UTF-8 input and malformed XML are
/// both parse failures.
pub fn parse(bytes: &[u8]) -> Result<Document<'_>, ExtractError> {
    let text = std::str::from_utf8(bytes).map_err(|error| ExtractError::Parse {
        message: format!("input is not valid UTF-8: {error}"),
    })?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    Document::parse_with_options(text, options).map_err(|error| ExtractError::Parse {
        message: error.to_string(),
    })
}

/// Checks that every required structural element is present in the CDA
/// namespace.
pub fn validate(document: &Document<'_>) -> Result<(), ExtractError> {
    for &element in REQUIRED_ELEMENTS {
        let present = document
            .descendants()
            .any(|node| is_cda_element(node, element));
        if !present {
            return Err(ExtractError::Validation { element });
        }
    }
    Ok(())
}

/// Parses, validates and extracts the whole document into one tree.
pub fn extract(bytes: &[u8]) -> Result<TreeNode, ExtractError> {
    let document = parse(bytes)?;
    validate(&document)?;
    Ok(extract_element(document.root_element()))
}

/// Builds the tree for one element and everything below it.
pub fn extract_element(node: Node<'_, '_>) -> TreeNode {
    let mut children = Children::new();
    for child in node.children().filter(Node::is_element) {
        children.insert(child.tag_name().name(), extract_element(child));
    }
    TreeNode::from_parts(collect_attributes(node), sole_text(node), children)
}

/// Attributes by local name. Namespace declarations are not attributes.
pub fn collect_attributes(node: Node<'_, '_>) -> Attributes {
    node.attributes()
        .map(|attribute| (attribute.name().to_string(), attribute.value().to_string()))
        .collect()
}

// Text only counts when it is the element's one and only DOM child.
fn sole_text(node: Node<'_, '_>) -> Option<String> {
    let mut children = node.children();
    match (children.next(), children.next()) {
        (Some(only), None) if only.is_text() => only
            .text()
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

pub(crate) fn is_cda_element(node: Node<'_, '_>, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node.tag_name().namespace() == Some(CDA_NAMESPACE)
}

#[cfg(test)]
mod tests {
    use cda_model::Slot;

    use super::*;

    fn element(xml: &str) -> TreeNode {
        let document = parse(xml.as_bytes()).expect("parse");
        extract_element(document.root_element())
    }

    #[test]
    fn prefixes_are_stripped_from_tags_and_attributes() {
        let node = element(
            r#"<cda:value xmlns:cda="urn:hl7-org:v3"
                 xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                 xsi:type="PQ" value="120" unit="mm[Hg]"><cda:translation code="x"/></cda:value>"#,
        );
        let attributes = node.attributes().expect("attributes");
        assert_eq!(attributes.get("type").map(String::as_str), Some("PQ"));
        assert_eq!(attributes.len(), 3);
        assert!(node.child("translation").is_some());
    }

    #[test]
    fn text_requires_a_single_text_child() {
        assert_eq!(element("<title>  Vital Signs \n</title>").text(), Some("Vital Signs"));
        assert_eq!(element("<title>   </title>").text(), None);
        assert_eq!(element("<p>before <b>bold</b> after</p>").text(), None);
        assert_eq!(element("<p><!-- note -->kept?</p>").text(), None);
    }

    #[test]
    fn mixed_content_keeps_only_children() {
        let node = element("<p>before <b>bold</b> after</p>");
        let bold = node.child("b").and_then(Slot::first).expect("b");
        assert_eq!(bold.text(), Some("bold"));
    }

    #[test]
    fn empty_elements_are_present() {
        let node = element(r#"<entry><observation/></entry>"#);
        let observation = node.child("observation").and_then(Slot::first).expect("observation");
        assert!(observation.is_empty());
    }

    #[test]
    fn repeated_tags_become_lists_in_order() {
        let node = element(r#"<entry><id root="a"/><code/><id root="b"/></entry>"#);
        let ids = node.child("id").expect("ids");
        assert_eq!(ids.len(), 2);
        let roots: Vec<_> = ids.nodes().iter().filter_map(|id| id.attribute("root")).collect();
        assert_eq!(roots, vec!["a", "b"]);
    }

    #[test]
    fn malformed_and_non_utf8_input_fail_to_parse() {
        assert!(matches!(parse(b"<open>"), Err(ExtractError::Parse { .. })));
        assert!(matches!(parse(&[0x3c, 0xff, 0xfe]), Err(ExtractError::Parse { .. })));
    }

    #[test]
    fn required_elements_must_use_the_cda_namespace() {
        let xml = r#"<ClinicalDocument><patientRole/><author/><structuredBody/></ClinicalDocument>"#;
        assert_eq!(
            extract(xml.as_bytes()),
            Err(ExtractError::Validation {
                element: "patientRole"
            })
        );
    }
}
