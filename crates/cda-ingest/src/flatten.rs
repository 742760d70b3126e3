//! Flattening of elevated trees into key-path/value maps.
//!
//! Path grammar:
//! - element segments are joined with the separator (`.` by default)
//! - list members carry their index: `id[0]`, `id[1]`
//! - attributes: `parent@name`, or `@name` at the root
//! - text: `parent/text()`, or the empty key at the root

use cda_model::{FlatValueMap, NodeField, Slot, TreeNode};

pub const DEFAULT_SEPARATOR: &str = ".";

pub fn flatten(node: &TreeNode) -> FlatValueMap {
    flatten_with_separator(node, DEFAULT_SEPARATOR)
}

pub fn flatten_with_separator(node: &TreeNode, separator: &str) -> FlatValueMap {
    let mut values = FlatValueMap::new();
    flatten_node(node, "", separator, &mut values);
    values
}

fn flatten_node(node: &TreeNode, parent: &str, separator: &str, values: &mut FlatValueMap) {
    for field in node.fields() {
        match field {
            NodeField::Attributes(attributes) => {
                for (name, value) in attributes {
                    values.insert(format!("{parent}@{name}"), value.as_str());
                }
            }
            NodeField::Text(text) => {
                let path = if parent.is_empty() {
                    String::new()
                } else {
                    format!("{parent}/text()")
                };
                values.insert(path, text.as_str());
            }
            NodeField::Children(children) => {
                for (tag, slot) in children.iter() {
                    flatten_slot(tag, slot, parent, separator, values);
                }
            }
            NodeField::Element { tag, slot } => flatten_slot(tag, slot, parent, separator, values),
        }
    }
}

fn flatten_slot(tag: &str, slot: &Slot, parent: &str, separator: &str, values: &mut FlatValueMap) {
    match slot {
        Slot::Single(node) => {
            flatten_node(node, &join(parent, tag, separator), separator, values);
        }
        Slot::List(nodes) => {
            for (index, node) in nodes.iter().enumerate() {
                let segment = format!("{tag}[{index}]");
                flatten_node(node, &join(parent, &segment, separator), separator, values);
            }
        }
    }
}

fn join(parent: &str, segment: &str, separator: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{separator}{segment}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elevate::elevate;

    #[test]
    fn root_text_uses_the_empty_key() {
        let values = flatten(&TreeNode::new().with_attribute("unit", "kg").with_text("70"));
        assert_eq!(values.get(""), Some("70"));
        assert_eq!(values.get("@unit"), Some("kg"));
    }

    #[test]
    fn siblings_sharing_a_tag_are_indexed_in_order() {
        let node = TreeNode::new().with_child(
            "observation",
            TreeNode::new()
                .with_child("id", TreeNode::new().with_attribute("root", "first"))
                .with_child("id", TreeNode::new().with_attribute("root", "second"))
                .with_child("code", TreeNode::new().with_attribute("code", "x")),
        );
        let values = flatten(&elevate(node));
        assert_eq!(values.get("observation.id[0]@root"), Some("first"));
        assert_eq!(values.get("observation.id[1]@root"), Some("second"));
        assert_eq!(values.get("observation.code@code"), Some("x"));
    }

    #[test]
    fn custom_separator_joins_segments() {
        let node = TreeNode::new().with_child(
            "effectiveTime",
            TreeNode::new().with_child("low", TreeNode::new().with_attribute("value", "2020")),
        );
        let values = flatten_with_separator(&node, "/");
        assert_eq!(values.get("effectiveTime/low@value"), Some("2020"));
    }

    #[test]
    fn empty_nodes_produce_no_entries() {
        let node = TreeNode::new().with_child("observation", TreeNode::new());
        assert!(flatten(&node).is_empty());
    }

    #[test]
    fn nested_text_gets_a_text_suffix() {
        let node = TreeNode::new()
            .with_child("text", TreeNode::new().with_text("Penicillin rash"))
            .with_child("code", TreeNode::new());
        let values = flatten(&node);
        assert_eq!(values.get("text/text()"), Some("Penicillin rash"));
        assert_eq!(values.len(), 1);
    }
}
