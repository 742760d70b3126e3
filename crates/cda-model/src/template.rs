//! Declarative mapping templates.
//!
//! A template file holds one [`ResourceTemplate`] per record kind. Each
//! template carries a tree of field groups whose leaves list candidate
//! flattened paths, tried in order, plus an optional default.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::RecordKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldPaths {
    pub paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl FieldPaths {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemplateNode {
    Field(FieldPaths),
    Group(BTreeMap<String, TemplateNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceTemplate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, TemplateNode>,
}

impl ResourceTemplate {
    /// Looks a leaf up by its dotted name, e.g. `dosage.value`.
    pub fn field(&self, name: &str) -> Option<&FieldPaths> {
        let mut segments = name.split('.');
        let mut node = self.fields.get(segments.next()?)?;
        for segment in segments {
            match node {
                TemplateNode::Group(group) => node = group.get(segment)?,
                TemplateNode::Field(_) => return None,
            }
        }
        match node {
            TemplateNode::Field(field) => Some(field),
            TemplateNode::Group(_) => None,
        }
    }

    /// Every leaf with its dotted name, in name order.
    pub fn leaves(&self) -> Vec<(String, &FieldPaths)> {
        let mut leaves = Vec::new();
        for (name, node) in &self.fields {
            collect_leaves(name.clone(), node, &mut leaves);
        }
        leaves
    }

    #[must_use]
    pub fn with_field(mut self, name: &str, field: FieldPaths) -> Self {
        let segments: Vec<&str> = name.split('.').collect();
        insert_field(&mut self.fields, &segments, field);
        self
    }
}

fn collect_leaves<'a>(
    prefix: String,
    node: &'a TemplateNode,
    leaves: &mut Vec<(String, &'a FieldPaths)>,
) {
    match node {
        TemplateNode::Field(field) => leaves.push((prefix, field)),
        TemplateNode::Group(group) => {
            for (name, child) in group {
                collect_leaves(format!("{prefix}.{name}"), child, leaves);
            }
        }
    }
}

fn insert_field(group: &mut BTreeMap<String, TemplateNode>, segments: &[&str], field: FieldPaths) {
    match segments {
        [] => {}
        [last] => {
            group.insert((*last).to_string(), TemplateNode::Field(field));
        }
        [first, rest @ ..] => {
            let node = group
                .entry((*first).to_string())
                .or_insert_with(|| TemplateNode::Group(BTreeMap::new()));
            if let TemplateNode::Field(_) = node {
                *node = TemplateNode::Group(BTreeMap::new());
            }
            if let TemplateNode::Group(child) = node {
                insert_field(child, rest, field);
            }
        }
    }
}

/// Templates keyed by record kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingTemplates(BTreeMap<String, ResourceTemplate>);

impl MappingTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, kind: RecordKind) -> Option<&ResourceTemplate> {
        self.0.get(kind.template_key())
    }

    pub fn insert(&mut self, kind: RecordKind, template: ResourceTemplate) {
        self.0.insert(kind.template_key().to_string(), template);
    }

    /// Raw top-level keys, including any that name no known kind.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceTemplate)> {
        self.0.iter().map(|(key, template)| (key.as_str(), template))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
