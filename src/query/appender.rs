//! SelectAppender — requested-field tree to select stage in one call.

use std::sync::Arc;
use tracing::debug;

use crate::config::ProjectionConfig;
use crate::error::Result;
use crate::projection::{PathSet, ProjectionCompiler};
use crate::schema::TypeRegistry;
use crate::selection::{FieldNode, SelectionPathExtractor};

use super::{project, SelectQuery};

pub struct SelectAppender {
    registry: Arc<TypeRegistry>,
    config: ProjectionConfig,
    compiler: ProjectionCompiler,
}

impl SelectAppender {
    pub fn new(registry: Arc<TypeRegistry>, config: ProjectionConfig) -> Self {
        let compiler = ProjectionCompiler::with_config(registry.clone(), &config);
        Self {
            registry,
            config,
            compiler,
        }
    }

    pub fn config(&self) -> &ProjectionConfig {
        &self.config
    }

    pub fn compiler(&self) -> &ProjectionCompiler {
        &self.compiler
    }

    /// Paths `root` requests from `element_type`, mandatory keys included.
    ///
    /// `keys` of `None` falls back to the keys registered for the type.
    pub fn selection_paths(
        &self,
        root: &FieldNode,
        keys: Option<&[String]>,
        element_type: &str,
        is_connection: bool,
    ) -> PathSet {
        let mut paths = self.extractor(is_connection).extract(root);
        for key in self.keys(keys, element_type) {
            paths.insert(key);
        }
        paths
    }

    /// Fold the selection below `root` into `query` as a select stage.
    ///
    /// A root without sub-selections leaves the query untouched.
    pub fn add_select<Q: SelectQuery>(
        &self,
        query: Q,
        element_type: &str,
        root: &FieldNode,
        keys: Option<&[String]>,
        is_connection: bool,
    ) -> Result<Q> {
        if !root.has_children() {
            debug!(field = %root.name, "no sub-selection, query left unprojected");
            return Ok(query);
        }

        let paths = self.extractor(is_connection).extract(root);
        let keys = self.keys(keys, element_type);
        project(&self.compiler, query, element_type, &paths, keys)
    }

    fn extractor(&self, is_connection: bool) -> SelectionPathExtractor {
        SelectionPathExtractor::new(&self.config)
            .strip_envelopes(is_connection || self.config.strip_envelopes_always)
    }

    fn keys<'a>(&'a self, keys: Option<&'a [String]>, element_type: &str) -> &'a [String] {
        match keys {
            Some(keys) if !keys.is_empty() => keys,
            _ => self.registry.keys(element_type),
        }
    }
}
