//! GraphQL documents to requested-field trees.
//!
//! Fragments are flattened in place: inline fragments contribute their
//! fields to the enclosing selection and named spreads are expanded from the
//! document's fragment definitions, each expanded once. Repeated fields with
//! the same response key are merged, so fragment fan-out cannot blow up the
//! tree.

use async_graphql_parser::types::{ExecutableDocument, FragmentDefinition, Selection, SelectionSet};
use async_graphql_parser::Positioned;
use std::collections::{HashMap, HashSet};

use crate::error::{ProjectionError, Result};
use crate::projection::PathSet;

use super::{FieldNode, SelectionPathExtractor};

/// Parse `query` and return the top-level fields of the chosen operation.
///
/// With no `operation_name` the document must hold exactly one operation.
pub fn parse_operation(query: &str, operation_name: Option<&str>) -> Result<Vec<FieldNode>> {
    let document = async_graphql_parser::parse_query(query)
        .map_err(|e| ProjectionError::Document(e.to_string()))?;
    fields_of_operation(&document, operation_name)
}

/// Every path selected anywhere in the operation, top-level fields included
/// and no envelope elision.
pub fn operation_paths(query: &str, operation_name: Option<&str>) -> Result<PathSet> {
    let fields = parse_operation(query, operation_name)?;
    Ok(SelectionPathExtractor::default()
        .strip_envelopes(false)
        .extract_all(&fields))
}

/// Nesting limit for fields, inline fragments and spreads combined.
const MAX_SELECTION_DEPTH: usize = 64;

fn fields_of_operation(
    document: &ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<Vec<FieldNode>> {
    let mut operations = document.operations.iter();
    let (_, operation) = match operation_name {
        Some(wanted) => operations
            .find(|(name, _)| name.map_or(false, |n| n.as_str() == wanted))
            .ok_or_else(|| ProjectionError::Document(format!("unknown operation '{}'", wanted)))?,
        None => {
            let first = operations
                .next()
                .ok_or_else(|| ProjectionError::Document("document has no operations".to_string()))?;
            if operations.next().is_some() {
                return Err(ProjectionError::Document(
                    "operation name required when the document has several operations".to_string(),
                ));
            }
            first
        }
    };

    let fragments: HashMap<&str, &FragmentDefinition> = document
        .fragments
        .iter()
        .map(|(name, fragment)| (name.as_str(), &fragment.node))
        .collect();

    let mut collector = Collector {
        fragments,
        expanded: HashMap::new(),
        expanding: HashSet::new(),
    };
    collector.collect(&operation.node.selection_set, 0)
}

struct Collector<'d> {
    fragments: HashMap<&'d str, &'d FragmentDefinition>,
    /// Merged fields of each fragment already expanded.
    expanded: HashMap<&'d str, Vec<FieldNode>>,
    /// Spreads currently being expanded, to stop fragment cycles.
    expanding: HashSet<&'d str>,
}

impl<'d> Collector<'d> {
    fn collect(&mut self, set: &'d Positioned<SelectionSet>, depth: usize) -> Result<Vec<FieldNode>> {
        if depth > MAX_SELECTION_DEPTH {
            return Err(ProjectionError::Document(format!(
                "selection nested deeper than {} levels",
                MAX_SELECTION_DEPTH
            )));
        }

        let mut fields = Vec::new();

        for item in &set.node.items {
            match &item.node {
                Selection::Field(field) => {
                    let field = &field.node;
                    let node = FieldNode {
                        name: field.name.node.to_string(),
                        alias: field.alias.as_ref().map(|a| a.node.to_string()),
                        children: self.collect(&field.selection_set, depth + 1)?,
                        ..Default::default()
                    };
                    merge_field(&mut fields, node);
                }
                Selection::InlineFragment(fragment) => {
                    for node in self.collect(&fragment.node.selection_set, depth + 1)? {
                        merge_field(&mut fields, node);
                    }
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.node.fragment_name.node.as_str();
                    for node in self.expand(name, depth + 1)? {
                        merge_field(&mut fields, node);
                    }
                }
            }
        }

        Ok(fields)
    }

    fn expand(&mut self, name: &'d str, depth: usize) -> Result<Vec<FieldNode>> {
        if let Some(fields) = self.expanded.get(name) {
            return Ok(fields.clone());
        }

        let fragment = self
            .fragments
            .get(name)
            .copied()
            .ok_or_else(|| ProjectionError::Document(format!("unknown fragment '{}'", name)))?;
        if !self.expanding.insert(name) {
            return Err(ProjectionError::Document(format!(
                "fragment '{}' spreads itself",
                name
            )));
        }
        let fields = self.collect(&fragment.selection_set, depth);
        self.expanding.remove(name);

        let fields = fields?;
        self.expanded.insert(name, fields.clone());
        Ok(fields)
    }
}

/// Add `node` to `fields`, merging its children into an earlier field with
/// the same response key and name.
fn merge_field(fields: &mut Vec<FieldNode>, node: FieldNode) {
    let existing = fields
        .iter_mut()
        .find(|f| f.name == node.name && f.alias_or_name() == node.alias_or_name());
    match existing {
        Some(existing) => {
            for child in node.children {
                merge_field(&mut existing.children, child);
            }
        }
        None => fields.push(node),
    }
}
