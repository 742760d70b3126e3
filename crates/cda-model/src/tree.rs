//! Generic element tree.
//!
//! Every XML element is captured as a [`TreeNode`] made of explicit
//! [`NodeField`]s. The structural extractor only ever produces
//! `Attributes`, `Text` and `Children`; the elevator additionally produces
//! `Element` when it collapses a single-entry children map.

#![deny(unsafe_code)]

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Namespace-stripped attribute name to value.
pub type Attributes = BTreeMap<String, String>;

/// A tag slot: one node, or an ordered list once the tag repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    Single(TreeNode),
    List(Vec<TreeNode>),
}

impl Slot {
    /// Adds another node under the same tag, promoting a single node to a list.
    pub fn push(&mut self, node: TreeNode) {
        let previous = std::mem::replace(self, Slot::List(Vec::new()));
        *self = match previous {
            Slot::Single(first) => Slot::List(vec![first, node]),
            Slot::List(mut nodes) => {
                nodes.push(node);
                Slot::List(nodes)
            }
        };
    }

    /// All nodes in the slot, in document order.
    pub fn nodes(&self) -> &[TreeNode] {
        match self {
            Slot::Single(node) => std::slice::from_ref(node),
            Slot::List(nodes) => nodes,
        }
    }

    pub fn first(&self) -> Option<&TreeNode> {
        self.nodes().first()
    }

    pub fn len(&self) -> usize {
        self.nodes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes().is_empty()
    }

    /// Applies `f` to every node, keeping the slot shape.
    #[must_use]
    pub fn map(self, mut f: impl FnMut(TreeNode) -> TreeNode) -> Slot {
        match self {
            Slot::Single(node) => Slot::Single(f(node)),
            Slot::List(nodes) => Slot::List(nodes.into_iter().map(f).collect()),
        }
    }
}

/// Child elements keyed by tag, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Children {
    entries: Vec<(String, Slot)>,
}

impl Children {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a child node. The first occurrence of a tag is stored as a
    /// single node; the second promotes the slot to a list.
    pub fn insert(&mut self, tag: impl Into<String>, node: TreeNode) {
        let tag = tag.into();
        if let Some((_, slot)) = self.entries.iter_mut().find(|(name, _)| *name == tag) {
            slot.push(node);
        } else {
            self.entries.push((tag, Slot::Single(node)));
        }
    }

    pub fn get(&self, tag: &str) -> Option<&Slot> {
        self.entries
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, slot)| slot)
    }

    pub fn first(&self) -> Option<(&str, &Slot)> {
        self.entries
            .first()
            .map(|(name, slot)| (name.as_str(), slot))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slot)> {
        self.entries.iter().map(|(name, slot)| (name.as_str(), slot))
    }
}

impl IntoIterator for Children {
    type Item = (String, Slot);
    type IntoIter = std::vec::IntoIter<(String, Slot)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, Slot)> for Children {
    fn from_iter<I: IntoIterator<Item = (String, Slot)>>(iter: I) -> Self {
        let mut children = Children::new();
        for (tag, slot) in iter {
            match slot {
                Slot::Single(node) => children.insert(tag, node),
                Slot::List(nodes) => {
                    for node in nodes {
                        children.insert(tag.clone(), node);
                    }
                }
            }
        }
        children
    }
}

/// One field of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeField {
    Attributes(Attributes),
    Text(String),
    Children(Children),
    /// A single child slot lifted out of its children wrapper by the elevator.
    Element { tag: String, slot: Slot },
}

/// One extracted element.
///
/// A node with no fields is still a node: an empty element is present,
/// not absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeNode {
    fields: Vec<NodeField>,
}

impl TreeNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a node from the three extraction parts. Empty parts are omitted.
    pub fn from_parts(attributes: Attributes, text: Option<String>, children: Children) -> Self {
        let mut fields = Vec::with_capacity(3);
        if !attributes.is_empty() {
            fields.push(NodeField::Attributes(attributes));
        }
        if let Some(text) = text {
            fields.push(NodeField::Text(text));
        }
        if !children.is_empty() {
            fields.push(NodeField::Children(children));
        }
        Self { fields }
    }

    pub fn from_fields(fields: Vec<NodeField>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        if let Some(attributes) = self.attributes_mut() {
            attributes.insert(name, value);
        } else {
            self.fields
                .insert(0, NodeField::Attributes(Attributes::from([(name, value)])));
        }
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.fields.retain(|field| !matches!(field, NodeField::Text(_)));
        let position = usize::from(self.attributes().is_some());
        self.fields.insert(position, NodeField::Text(text.into()));
        self
    }

    #[must_use]
    pub fn with_child(mut self, tag: impl Into<String>, child: TreeNode) -> Self {
        if let Some(children) = self.children_mut() {
            children.insert(tag, child);
        } else {
            let mut children = Children::new();
            children.insert(tag, child);
            self.fields.push(NodeField::Children(children));
        }
        self
    }

    fn attributes_mut(&mut self) -> Option<&mut Attributes> {
        self.fields.iter_mut().find_map(|field| match field {
            NodeField::Attributes(attributes) => Some(attributes),
            _ => None,
        })
    }

    fn children_mut(&mut self) -> Option<&mut Children> {
        self.fields.iter_mut().find_map(|field| match field {
            NodeField::Children(children) => Some(children),
            _ => None,
        })
    }

    pub fn fields(&self) -> &[NodeField] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<NodeField> {
        self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        self.fields.iter().find_map(|field| match field {
            NodeField::Attributes(attributes) => Some(attributes),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes()
            .and_then(|attributes| attributes.get(name))
            .map(String::as_str)
    }

    pub fn text(&self) -> Option<&str> {
        self.fields.iter().find_map(|field| match field {
            NodeField::Text(text) => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn children(&self) -> Option<&Children> {
        self.fields.iter().find_map(|field| match field {
            NodeField::Children(children) => Some(children),
            _ => None,
        })
    }

    /// Looks a child tag up in either the children map or an elevated element.
    pub fn child(&self, tag: &str) -> Option<&Slot> {
        self.fields.iter().find_map(|field| match field {
            NodeField::Children(children) => children.get(tag),
            NodeField::Element { tag: name, slot } if name == tag => Some(slot),
            _ => None,
        })
    }

    /// The first child element in document order, with its tag.
    pub fn first_child(&self) -> Option<(&str, &TreeNode)> {
        self.fields.iter().find_map(|field| match field {
            NodeField::Children(children) => children
                .first()
                .and_then(|(tag, slot)| slot.first().map(|node| (tag, node))),
            NodeField::Element { tag, slot } => slot.first().map(|node| (tag.as_str(), node)),
            _ => None,
        })
    }
}

struct SlotRef<'a>(&'a Slot);

impl Serialize for SlotRef<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Slot::Single(node) => node.serialize(serializer),
            Slot::List(nodes) => nodes.serialize(serializer),
        }
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SlotRef(self).serialize(serializer)
    }
}

impl Serialize for Children {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (tag, slot) in &self.entries {
            map.serialize_entry(tag, &SlotRef(slot))?;
        }
        map.end()
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            match field {
                NodeField::Attributes(attributes) => map.serialize_entry("attributes", attributes)?,
                NodeField::Text(text) => map.serialize_entry("text", text)?,
                NodeField::Children(children) => map.serialize_entry("children", children)?,
                NodeField::Element { tag, slot } => map.serialize_entry(tag, &SlotRef(slot))?,
            }
        }
        map.end()
    }
}
