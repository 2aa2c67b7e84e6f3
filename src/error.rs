//! Error types for selectpush.

use thiserror::Error;

/// Everything that can fail while loading types, compiling or applying a projection.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// A collection member whose declared shape cannot be rebuilt from a mapped sequence.
    #[error("Not implemented transformation for type '{type_name}'")]
    UnsupportedProjectionShape { type_name: String },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Invalid type reference '{input}': {message}")]
    InvalidTypeRef { input: String, message: String },

    #[error("Duplicate type: {0}")]
    DuplicateType(String),

    #[error("GraphQL document error: {0}")]
    Document(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProjectionError {
    pub fn unsupported_shape(type_name: impl Into<String>) -> Self {
        ProjectionError::UnsupportedProjectionShape {
            type_name: type_name.into(),
        }
    }

    pub fn evaluation(msg: impl Into<String>) -> Self {
        ProjectionError::Evaluation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ProjectionError>;
