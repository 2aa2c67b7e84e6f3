//! In-memory query sequence.
//!
//! Holds rows and a list of pending select stages; nothing is evaluated
//! until `execute`.

use std::sync::Arc;
use tracing::trace;

use crate::error::Result;
use crate::projection::{Evaluator, Projection};
use crate::schema::TypeRegistry;
use crate::value::Value;

use super::SelectQuery;

#[derive(Debug)]
pub struct InMemoryQuery {
    registry: Arc<TypeRegistry>,
    element_type: String,
    rows: Vec<Value>,
    stages: Vec<Projection>,
}

impl InMemoryQuery {
    pub fn new(registry: Arc<TypeRegistry>, element_type: impl Into<String>, rows: Vec<Value>) -> Self {
        Self {
            registry,
            element_type: element_type.into(),
            rows,
            stages: Vec::new(),
        }
    }

    pub fn element_type(&self) -> &str {
        &self.element_type
    }

    /// Select stages applied so far, in order.
    pub fn stages(&self) -> &[Projection] {
        &self.stages
    }

    /// Run every stage over every row, preserving row order.
    pub fn execute(self) -> Result<Vec<Value>> {
        let evaluator = Evaluator::new(&self.registry);
        let mut rows = self.rows;

        for stage in &self.stages {
            trace!(stage = %stage, rows = rows.len(), "applying select stage");
            rows = rows
                .iter()
                .map(|row| evaluator.apply(stage, row))
                .collect::<Result<Vec<_>>>()?;
        }

        Ok(rows)
    }
}

impl SelectQuery for InMemoryQuery {
    fn select(mut self, projection: Projection) -> Self {
        self.stages.push(projection);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionCompiler;
    use crate::schema::{ScalarKind, TypeDescriptor, TypeRef};
    use crate::value::Record;

    #[test]
    fn test_stages_compose_in_order() {
        let registry = Arc::new(
            TypeRegistry::new(vec![TypeDescriptor::new("Tag")
                .member("Id", TypeRef::Scalar(ScalarKind::Int))
                .member("Label", TypeRef::Scalar(ScalarKind::String))])
            .unwrap(),
        );
        let compiler = ProjectionCompiler::new(registry.clone());
        let rows: Vec<Value> = (1..=3)
            .map(|i| Record::new("Tag").with("Id", i as i64).with("Label", format!("t{}", i)).into())
            .collect();

        let query = InMemoryQuery::new(registry, "Tag", rows)
            .select(compiler.compile_str("Tag", "id, label").unwrap())
            .select(compiler.compile_str("Tag", "label").unwrap());
        assert_eq!(query.element_type(), "Tag");

        let out = query.execute().unwrap();
        let labels: Vec<&str> = out
            .iter()
            .filter_map(|row| row.member("Label").and_then(Value::as_str))
            .collect();
        assert_eq!(labels, vec!["t1", "t2", "t3"]);
        // Second stage dropped the id
        assert!(out.iter().all(|row| row.member("Id") == Some(&Value::Int(0))));
    }
}
