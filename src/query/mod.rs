//! Query module — folding projections into query sequences.
//!
//! ## Core API
//!
//! ```ignore
//! // Paths already known
//! let query = project(&compiler, query, "Company", &paths, &["Id"])?;
//!
//! // From the requested-field tree of the field being resolved
//! let query = appender.add_select(query, "Company", &field, None, true)?;
//! ```
//!
//! Neither runs the query. Execution stays with whoever owns the sequence.

pub mod appender;
pub mod memory;

pub use appender::SelectAppender;
pub use memory::InMemoryQuery;

use tracing::debug;

use crate::error::Result;
use crate::projection::{PathSet, Projection, ProjectionCompiler};

/// A not-yet-executed query sequence that accepts a select stage.
pub trait SelectQuery: Sized {
    /// Append `projection` as a select stage and return the new sequence.
    fn select(self, projection: Projection) -> Self;
}

/// Union `mandatory` into `paths`, compile a projection of `target_type`
/// and fold it into `query`.
pub fn project<Q, S>(
    compiler: &ProjectionCompiler,
    query: Q,
    target_type: &str,
    paths: &PathSet,
    mandatory: &[S],
) -> Result<Q>
where
    Q: SelectQuery,
    S: AsRef<str>,
{
    let mut paths = paths.clone();
    for path in mandatory {
        paths.insert(path.as_ref());
    }

    let projection = compiler.compile(target_type, &paths)?;
    debug!(target_type, paths = paths.len(), projection = %projection, "select stage added");

    Ok(query.select(projection))
}
