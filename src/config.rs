//! Configuration for path extraction and projection compilation.
//!
//! ```toml
//! envelope_names = ["edges", "items", "node"]
//! strip_envelopes_always = true
//! log_unresolved = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ProjectionError, Result};

/// Field names that wrap pagination results rather than name data members.
pub const DEFAULT_ENVELOPE_NAMES: &[&str] = &["edges", "items", "node"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    /// Envelope node names, matched case-insensitively.
    pub envelope_names: Vec<String>,
    /// Elide envelope nodes even when the field is not a connection.
    pub strip_envelopes_always: bool,
    /// Report dropped path segments at `warn` instead of `debug`.
    /// Unresolved paths are dropped either way.
    pub log_unresolved: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            envelope_names: DEFAULT_ENVELOPE_NAMES.iter().map(|s| s.to_string()).collect(),
            strip_envelopes_always: true,
            log_unresolved: false,
        }
    }
}

impl ProjectionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ProjectionError::Config(e.to_string()))
    }

    pub fn is_envelope(&self, name: &str) -> bool {
        self.envelope_names
            .iter()
            .any(|envelope| envelope.eq_ignore_ascii_case(name))
    }
}
