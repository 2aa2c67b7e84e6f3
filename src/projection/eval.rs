//! In-memory backend: evaluate a projection over `Value`s.
//!
//! This is the reference interpretation of the IR. Remote backends translate
//! the same tree into their own select syntax instead.

use crate::error::{ProjectionError, Result};
use crate::schema::TypeRegistry;
use crate::value::{Record, Value};

use super::ast::{Expr, Materialize};
use super::Projection;

pub struct Evaluator<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Evaluator<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    /// Run `projection` against one source element.
    pub fn apply(&self, projection: &Projection, input: &Value) -> Result<Value> {
        let mut scope = vec![(projection.param.as_str(), input.clone())];
        self.eval(&projection.body, &mut scope)
    }

    fn eval<'e>(&self, expr: &'e Expr, scope: &mut Vec<(&'e str, Value)>) -> Result<Value> {
        match expr {
            Expr::Param { name, .. } => scope
                .iter()
                .rev()
                .find(|(bound, _)| bound == name)
                .map(|(_, value)| value.clone())
                .ok_or_else(|| ProjectionError::evaluation(format!("unbound parameter '{}'", name))),

            Expr::Read { source, member, .. } => match self.eval(source, scope)? {
                Value::Object(record) => record.get(member).cloned().ok_or_else(|| {
                    ProjectionError::evaluation(format!(
                        "{} has no member '{}'",
                        record.type_name, member
                    ))
                }),
                Value::Null => Err(ProjectionError::evaluation(format!(
                    "null reference reading '{}'",
                    member
                ))),
                other => Err(ProjectionError::evaluation(format!(
                    "cannot read '{}' from {:?}",
                    member, other
                ))),
            },

            Expr::Construct { ty, bindings } => {
                let descriptor = self.registry.require(ty)?;
                let mut record = Record::with_defaults(descriptor);
                for binding in bindings {
                    let value = self.eval(&binding.value, scope)?;
                    record.set(&binding.member, value);
                }
                Ok(Value::Object(record))
            }

            Expr::MapSequence {
                source,
                param,
                body,
                ..
            } => {
                let items = self.items(source, scope)?;
                let mut mapped = Vec::with_capacity(items.len());
                for item in items {
                    scope.push((param.as_str(), item));
                    let result = self.eval(body, scope);
                    scope.pop();
                    mapped.push(result?);
                }
                Ok(Value::Sequence(mapped))
            }

            Expr::Reshape { source, into, .. } => {
                let items = self.items(source, scope)?;
                Ok(match into {
                    Materialize::Array => Value::Array(items),
                    Materialize::List => Value::List(items),
                })
            }

            Expr::NullGuard {
                probe,
                fallback,
                value,
            } => {
                if self.eval(probe, scope)?.is_null() {
                    Ok(Value::default_for(fallback))
                } else {
                    self.eval(value, scope)
                }
            }
        }
    }

    fn items<'e>(&self, source: &'e Expr, scope: &mut Vec<(&'e str, Value)>) -> Result<Vec<Value>> {
        let value = self.eval(source, scope)?;
        match value {
            Value::Array(items) | Value::List(items) | Value::Sequence(items) => Ok(items),
            other => Err(ProjectionError::evaluation(format!(
                "expected a collection, found {:?}",
                other
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionCompiler;
    use crate::schema::{ScalarKind, TypeDescriptor, TypeRef};
    use std::sync::Arc;

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(
            TypeRegistry::new(vec![
                TypeDescriptor::new("Team")
                    .member("Id", TypeRef::Scalar(ScalarKind::Int))
                    .member("Name", TypeRef::Scalar(ScalarKind::String))
                    .member("Members", TypeRef::array_of(TypeRef::object("Person")))
                    .member("Lead", TypeRef::nullable(TypeRef::object("Person"))),
                TypeDescriptor::new("Person")
                    .member("Name", TypeRef::Scalar(ScalarKind::String))
                    .member("Age", TypeRef::Scalar(ScalarKind::Int)),
            ])
            .unwrap(),
        )
    }

    fn person(name: &str, age: i64) -> Value {
        Record::new("Person").with("Name", name).with("Age", age).into()
    }

    fn team() -> Value {
        Record::new("Team")
            .with("Id", 7i64)
            .with("Name", "core")
            .with(
                "Members",
                Value::Array(vec![person("ada", 36), Value::Null, person("bob", 41)]),
            )
            .with("Lead", Value::Null)
            .into()
    }

    #[test]
    fn test_apply_projects_requested_members() {
        let registry = registry();
        let compiler = ProjectionCompiler::new(registry.clone());
        let projection = compiler.compile_str("Team", "name, members.name, lead.name").unwrap();

        let out = Evaluator::new(&registry).apply(&projection, &team()).unwrap();

        assert_eq!(out.member("Id"), Some(&Value::Int(0)), "unrequested value type at default");
        assert_eq!(out.member("Name").and_then(Value::as_str), Some("core"));
        assert_eq!(out.member("Lead"), Some(&Value::Null));

        let Some(Value::Array(members)) = out.member("Members") else {
            panic!("array member should stay an array: {:?}", out.member("Members"));
        };
        assert_eq!(members.len(), 3);
        assert_eq!(members[0].member("Name").and_then(Value::as_str), Some("ada"));
        assert_eq!(members[0].member("Age"), Some(&Value::Int(0)));
        assert_eq!(members[1], Value::Null, "null elements stay null");
        assert_eq!(members[2].member("Name").and_then(Value::as_str), Some("bob"));
    }

    #[test]
    fn test_read_on_non_record_fails() {
        let registry = registry();
        let compiler = ProjectionCompiler::new(registry.clone());
        let projection = compiler.compile_str("Team", "id").unwrap();

        let err = Evaluator::new(&registry)
            .apply(&projection, &Value::Int(3))
            .unwrap_err();
        assert!(matches!(err, ProjectionError::Evaluation(_)));
    }

    #[test]
    fn test_missing_member_fails() {
        let registry = registry();
        let compiler = ProjectionCompiler::new(registry.clone());
        let projection = compiler.compile_str("Team", "id").unwrap();

        let partial: Value = Record::new("Team").with("Name", "core").into();
        let err = Evaluator::new(&registry).apply(&projection, &partial).unwrap_err();
        assert!(err.to_string().contains("no member 'Id'"));
    }
}
