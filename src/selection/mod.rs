//! Selection module — requested-field trees to member paths.
//!
//! A GraphQL field's selection describes the *transport* shape: paginated
//! fields wrap the entity one or two levels down (`items { ... }`,
//! `edges { node { ... } }`). The extractor walks the tree and emits dotted
//! paths named after data members, eliding those envelope levels.

pub mod document;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ProjectionConfig;
use crate::projection::PathSet;

pub use document::{operation_paths, parse_operation};

/// One requested field and its sub-selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Data member backing this field when it differs from the field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    /// Sibling members the field's resolver needs fetched alongside it.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FieldNode>,
}

impl FieldNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_children(mut self, children: Vec<FieldNode>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: FieldNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_property_name(mut self, property: impl Into<String>) -> Self {
        self.property_name = Some(property.into());
        self
    }

    pub fn with_required_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// The member name this field selects.
    pub fn select_name(&self) -> &str {
        self.property_name.as_deref().unwrap_or(&self.name)
    }

    pub fn alias_or_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Flattens requested-field trees into member paths.
#[derive(Debug, Clone)]
pub struct SelectionPathExtractor {
    config: ProjectionConfig,
    strip_envelopes: bool,
}

impl Default for SelectionPathExtractor {
    fn default() -> Self {
        Self::new(&ProjectionConfig::default())
    }
}

impl SelectionPathExtractor {
    pub fn new(config: &ProjectionConfig) -> Self {
        Self {
            config: config.clone(),
            strip_envelopes: true,
        }
    }

    /// Turn envelope elision on or off.
    pub fn strip_envelopes(mut self, strip: bool) -> Self {
        self.strip_envelopes = strip;
        self
    }

    pub fn is_envelope(&self, field: &FieldNode) -> bool {
        self.strip_envelopes && self.config.is_envelope(&field.name)
    }

    /// Paths requested below `root`, relative to the root's element type.
    ///
    /// The root itself is the field being resolved, so neither its name nor
    /// its required fields are emitted.
    pub fn extract(&self, root: &FieldNode) -> PathSet {
        let mut paths = PathSet::new();
        self.walk(&root.children, None, &mut paths);
        trace!(root = %root.name, paths = paths.len(), "extracted selection paths");
        paths
    }

    /// Paths for a list of top-level fields, each included by name.
    pub fn extract_all(&self, fields: &[FieldNode]) -> PathSet {
        let mut paths = PathSet::new();
        self.walk(fields, None, &mut paths);
        paths
    }

    fn walk(&self, fields: &[FieldNode], prefix: Option<&str>, out: &mut PathSet) {
        for field in fields {
            let mut field_prefix = prefix.map(str::to_string);

            if !self.is_envelope(field) {
                let path = join(prefix, field.select_name());
                out.insert(&path);
                for required in &field.required_fields {
                    out.insert(&join(prefix, required));
                }
                field_prefix = Some(path);
            }

            if field.has_children() {
                self.walk(&field.children, field_prefix.as_deref(), out);
            }
        }
    }
}

fn join(prefix: Option<&str>, name: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}.{}", prefix, name),
        None => name.to_string(),
    }
}
