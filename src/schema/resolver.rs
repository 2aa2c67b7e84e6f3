//! Member resolver — cached, case-insensitive member lookup.
//!
//! The first lookup of a `(type, segment)` pair scans the type's declared
//! members; the outcome (hit or miss) is stored and every later lookup of the
//! same pair returns the same `Arc<MemberEntry>` without scanning again.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::trace;

use super::type_ref::TypeRef;

/// Resolved identity of a declared member.
///
/// `name` is the canonical casing: projections read it from the source and
/// bind it on the constructed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub declaring_type: String,
    pub name: String,
    pub ty: TypeRef,
    /// Declaration position within the declaring type.
    pub index: usize,
}

/// Concurrent get-or-insert cache from `(type, segment)` to a member entry.
#[derive(Debug, Default)]
pub struct MemberResolver {
    cache: DashMap<(String, String), Option<Arc<MemberEntry>>>,
}

impl MemberResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `segment` against the members of `type_name`.
    ///
    /// A racing first lookup may scan twice; only one result is stored and
    /// every caller gets that one.
    pub fn resolve(
        &self,
        type_name: &str,
        members: &[Arc<MemberEntry>],
        segment: &str,
    ) -> Option<Arc<MemberEntry>> {
        let key = (type_name.to_string(), segment.to_string());
        if let Some(hit) = self.cache.get(&key) {
            return hit.value().clone();
        }

        let found = search(members, segment);
        trace!(type_name, segment, found = found.is_some(), "member lookup");

        self.cache.entry(key).or_insert(found).value().clone()
    }

    /// Number of cached lookups, hits and misses alike.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

/// Exact-case match wins, otherwise the first case-insensitive match in
/// declaration order.
fn search(members: &[Arc<MemberEntry>], segment: &str) -> Option<Arc<MemberEntry>> {
    members
        .iter()
        .find(|m| m.name == segment)
        .or_else(|| members.iter().find(|m| m.name.eq_ignore_ascii_case(segment)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::type_ref::ScalarKind;

    fn entries(names: &[&str]) -> Vec<Arc<MemberEntry>> {
        names
            .iter()
            .enumerate()
            .map(|(index, name)| {
                Arc::new(MemberEntry {
                    declaring_type: "Thing".to_string(),
                    name: name.to_string(),
                    ty: TypeRef::Scalar(ScalarKind::Int),
                    index,
                })
            })
            .collect()
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let members = entries(&["Id", "Name"]);
        let resolver = MemberResolver::new();

        let entry = resolver.resolve("Thing", &members, "nAmE").unwrap();
        assert_eq!(entry.name, "Name");
        assert_eq!(entry.index, 1);
    }

    #[test]
    fn test_repeated_lookup_returns_same_entry() {
        let members = entries(&["Id", "Name"]);
        let resolver = MemberResolver::new();

        let first = resolver.resolve("Thing", &members, "name").unwrap();
        let second = resolver.resolve("Thing", &members, "name").unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Different casing hits a different cache slot but the same member
        let other = resolver.resolve("Thing", &members, "NAME").unwrap();
        assert!(Arc::ptr_eq(&first, &other));
    }

    #[test]
    fn test_miss_is_cached() {
        let members = entries(&["Id"]);
        let resolver = MemberResolver::new();

        assert!(resolver.resolve("Thing", &members, "missing").is_none());
        assert_eq!(resolver.cached_len(), 1);

        // A later lookup does not rescan, even with different members
        let more = entries(&["Id", "missing"]);
        assert!(resolver.resolve("Thing", &more, "missing").is_none());
        assert_eq!(resolver.cached_len(), 1);
    }

    #[test]
    fn test_exact_case_wins_collision() {
        let members = entries(&["value", "Value"]);
        let resolver = MemberResolver::new();

        assert_eq!(resolver.resolve("Thing", &members, "Value").unwrap().index, 1);
        assert_eq!(resolver.resolve("Thing", &members, "value").unwrap().index, 0);
        // No exact match: declaration order decides
        assert_eq!(resolver.resolve("Thing", &members, "VALUE").unwrap().index, 0);
    }
}
