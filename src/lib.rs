//! # selectpush
//!
//! Push GraphQL field selections down into data-access projections.
//!
//! A GraphQL request names the fields it wants; the data layer should fetch
//! only the members backing those fields. selectpush turns the requested-field
//! tree of a resolver into dotted member paths, compiles the paths into a
//! projection expression over a registered element type, and folds that
//! projection into a query sequence as a select stage.
//!
//! ## Key Features
//!
//! - **Minimal**: members no path names stay at their default
//! - **Null-safe**: null reference members and elements project to null
//! - **Shape-preserving**: array members come back as arrays, lists as lists
//! - **Pagination-aware**: `edges`/`items`/`node` envelopes are elided
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use selectpush::{ProjectionCompiler, TypeRegistry};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::load(Path::new("types.toml")).unwrap());
//! let compiler = ProjectionCompiler::new(registry);
//!
//! let projection = compiler.compile_str("Company", "name, employees.name").unwrap();
//! println!("{}", projection);
//! ```

pub mod config;
pub mod error;
pub mod projection;
pub mod query;
pub mod schema;
pub mod selection;
pub mod value;

// Re-exports for convenience
pub use config::ProjectionConfig;
pub use error::{ProjectionError, Result};

pub use projection::{Evaluator, Expr, MemberPath, PathSet, Projection, ProjectionCompiler};
pub use query::{project, InMemoryQuery, SelectAppender, SelectQuery};
pub use schema::{CollectionKind, MemberEntry, ScalarKind, TypeDescriptor, TypeRef, TypeRegistry};
pub use selection::{operation_paths, parse_operation, FieldNode, SelectionPathExtractor};
pub use value::{Record, Value};
