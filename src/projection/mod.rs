//! Projection module — compile member paths into a select expression.
//!
//! ```ignore
//! let compiler = ProjectionCompiler::new(registry.clone());
//! let projection = compiler.compile_str("Company", "name, employees.name")?;
//! // |e| Company { Name: ..., Employees: e.Employees.map(|e1| Employee { Name: ... }).to_list() }
//! println!("{}", projection);
//! ```

pub mod ast;
pub mod compiler;
pub mod eval;
pub mod path;
pub mod shape;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use ast::{Binding, Expr, Materialize};
pub use compiler::ProjectionCompiler;
pub use eval::Evaluator;
pub use path::{MemberPath, PathSet};
pub use shape::CollectionShape;

/// A compiled projection: a one-parameter lambda from `source_type` to a
/// freshly constructed `source_type`.
///
/// Built per request and handed to a query backend; never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub source_type: String,
    pub param: String,
    pub body: Expr,
}

impl Projection {
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "|{}| {}", self.param, self.body)
    }
}
