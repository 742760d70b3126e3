use proptest::prelude::*;

use cda_ingest::{elevate, flatten};
use cda_model::{Attributes, Children, NodeField, TreeNode};

fn tag() -> impl Strategy<Value = String> {
    prop::sample::select(vec![
        "observation",
        "code",
        "value",
        "id",
        "effectiveTime",
        "low",
        "high",
        "entryRelationship",
    ])
    .prop_map(str::to_string)
}

fn attributes() -> impl Strategy<Value = Attributes> {
    prop::collection::btree_map("[a-z][a-zA-Z]{0,7}", "[a-zA-Z0-9 .:-]{0,12}", 0..4)
}

fn tree() -> impl Strategy<Value = TreeNode> {
    let leaf = (attributes(), prop::option::of("[a-zA-Z0-9]{1,8}"))
        .prop_map(|(attributes, text)| TreeNode::from_parts(attributes, text, Children::new()));
    leaf.prop_recursive(5, 64, 4, |inner| {
        (attributes(), prop::collection::vec((tag(), inner), 0..5)).prop_map(
            |(attributes, children)| {
                let mut map = Children::new();
                for (tag, child) in children {
                    map.insert(tag, child);
                }
                TreeNode::from_parts(attributes, None, map)
            },
        )
    })
}

#[derive(Default)]
struct Counts {
    attributes: usize,
    texts: usize,
}

fn count(node: &TreeNode, counts: &mut Counts) {
    for field in node.fields() {
        match field {
            NodeField::Attributes(attributes) => counts.attributes += attributes.len(),
            NodeField::Text(_) => counts.texts += 1,
            NodeField::Children(children) => {
                for (_, slot) in children.iter() {
                    for child in slot.nodes() {
                        count(child, counts);
                    }
                }
            }
            NodeField::Element { slot, .. } => {
                for child in slot.nodes() {
                    count(child, counts);
                }
            }
        }
    }
}

proptest! {
    #[test]
    fn flatten_is_pure(node in tree()) {
        let elevated = elevate(node);
        prop_assert_eq!(flatten(&elevated), flatten(&elevated));
    }

    #[test]
    fn elevation_is_idempotent(node in tree()) {
        let once = elevate(node);
        prop_assert_eq!(elevate(once.clone()), once);
    }

    #[test]
    fn every_attribute_has_exactly_one_key(node in tree()) {
        let elevated = elevate(node);
        let mut counts = Counts::default();
        count(&elevated, &mut counts);

        let values = flatten(&elevated);
        let attribute_keys = values.keys().filter(|key| key.contains('@')).count();
        prop_assert_eq!(attribute_keys, counts.attributes);
        prop_assert_eq!(values.len(), counts.attributes + counts.texts);
    }

    #[test]
    fn elevation_does_not_change_flattened_paths(node in tree()) {
        let plain = flatten(&node);
        prop_assert_eq!(flatten(&elevate(node)), plain);
    }
}
