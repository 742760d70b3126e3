//! Collapses single-entry children wrappers.

use cda_model::{NodeField, Slot, TreeNode};

/// Replaces every children map holding exactly one tag with that tag as a
/// direct [`NodeField::Element`], at every depth. Running it on its own
/// output changes nothing.
pub fn elevate(node: TreeNode) -> TreeNode {
    TreeNode::from_fields(node.into_fields().into_iter().map(elevate_field).collect())
}

fn elevate_field(field: NodeField) -> NodeField {
    match field {
        NodeField::Children(children) => {
            let entries: Vec<(String, Slot)> = children
                .into_iter()
                .map(|(tag, slot)| (tag, slot.map(elevate)))
                .collect();
            match <[(String, Slot); 1]>::try_from(entries) {
                Ok([(tag, slot)]) => NodeField::Element { tag, slot },
                Err(entries) => NodeField::Children(entries.into_iter().collect()),
            }
        }
        NodeField::Element { tag, slot } => NodeField::Element {
            tag,
            slot: slot.map(elevate),
        },
        field @ (NodeField::Attributes(_) | NodeField::Text(_)) => field,
    }
}
