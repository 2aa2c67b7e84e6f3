//! Member paths and path sets.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Dotted member path, e.g. `employees.manager.name`.
///
/// Never empty. Segments keep the caller's casing; matching against members
/// is case-insensitive and happens during compilation, where a member whose
/// name matches exactly wins over a case-folded one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberPath {
    segments: Vec<String>,
}

impl MemberPath {
    /// Parse a dotted path. Blank segments are skipped; `None` when nothing
    /// is left.
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<String> = path
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment(&self, depth: usize) -> Option<&str> {
        self.segments.get(depth).map(String::as_str)
    }

    /// Whether the path continues past `depth`.
    pub fn continues_after(&self, depth: usize) -> bool {
        depth + 1 < self.segments.len()
    }
}

impl fmt::Display for MemberPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// A deduplicated set of member paths, in insertion order.
///
/// Paths are compared as written. `name` and `Name` are both kept; the
/// compiler folds them together when they resolve to the same member.
#[derive(Debug, Clone, Default)]
pub struct PathSet {
    paths: Vec<MemberPath>,
    seen: HashSet<MemberPath>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list such as `"name, employees.name"`.
    pub fn parse_list(list: &str) -> Self {
        list.split(',').collect()
    }

    /// Insert a dotted path. Returns `false` for blank or duplicate paths.
    pub fn insert(&mut self, path: &str) -> bool {
        match MemberPath::parse(path) {
            Some(path) => self.insert_path(path),
            None => false,
        }
    }

    pub fn insert_path(&mut self, path: MemberPath) -> bool {
        if self.seen.insert(path.clone()) {
            self.paths.push(path);
            true
        } else {
            false
        }
    }

    pub fn union(&mut self, other: &PathSet) {
        for path in &other.paths {
            self.insert_path(path.clone());
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        MemberPath::parse(path).map_or(false, |p| self.seen.contains(&p))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MemberPath> {
        self.paths.iter()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Paths as dotted strings, in insertion order.
    pub fn to_strings(&self) -> Vec<String> {
        self.paths.iter().map(ToString::to_string).collect()
    }
}

impl<S: AsRef<str>> FromIterator<S> for PathSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = PathSet::new();
        for path in iter {
            set.insert(path.as_ref());
        }
        set
    }
}

impl<S: AsRef<str>> Extend<S> for PathSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for path in iter {
            self.insert(path.as_ref());
        }
    }
}

/// Paths sharing one segment at a given depth.
#[derive(Debug)]
pub struct SegmentGroup<'a> {
    pub segment: &'a str,
    pub paths: Vec<&'a MemberPath>,
}

/// Group `paths` by their exact segment at `depth`.
///
/// Groups come out in first-seen order and each keeps its paths in input
/// order. Paths too short to have a segment at `depth` are skipped.
pub fn group_by_segment<'a>(paths: &[&'a MemberPath], depth: usize) -> Vec<SegmentGroup<'a>> {
    let mut groups: IndexMap<&'a str, SegmentGroup<'a>> = IndexMap::new();

    for &path in paths {
        let Some(segment) = path.segment(depth) else {
            continue;
        };
        groups
            .entry(segment)
            .or_insert_with(|| SegmentGroup {
                segment,
                paths: Vec::new(),
            })
            .paths
            .push(path);
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_path() {
        let path = MemberPath::parse("company.employees.name").unwrap();
        assert_eq!(path.segments(), &["company", "employees", "name"]);
        assert_eq!(path.to_string(), "company.employees.name");

        assert_eq!(MemberPath::parse(" a . b ").unwrap().segments(), &["a", "b"]);
        assert!(MemberPath::parse("").is_none());
        assert!(MemberPath::parse("..").is_none());
    }

    #[test]
    fn test_set_dedupes_exact_paths() {
        let mut set = PathSet::new();
        assert!(set.insert("Employees.Name"));
        assert!(!set.insert(" Employees . Name "));
        assert!(!set.insert(""));
        assert!(set.insert("employees.name"), "other casing is a distinct path");
        assert_eq!(set.len(), 2);
        assert!(set.contains("employees.name"));
        assert!(!set.contains("EMPLOYEES.NAME"));
        assert_eq!(set.to_strings(), vec!["Employees.Name", "employees.name"]);
    }

    #[test]
    fn test_parse_list_trims() {
        let set = PathSet::parse_list("name, employees.name ,, employees.manager.name");
        assert_eq!(
            set.to_strings(),
            vec!["name", "employees.name", "employees.manager.name"]
        );
    }

    #[test]
    fn test_group_is_stable_partition() {
        let set: PathSet = ["name", "employees.name", "Employees.manager.name", "id"]
            .into_iter()
            .collect();
        let paths: Vec<&MemberPath> = set.iter().collect();

        let groups = group_by_segment(&paths, 0);
        let keys: Vec<&str> = groups.iter().map(|g| g.segment).collect();
        assert_eq!(keys, vec!["name", "employees", "Employees", "id"]);
        assert_eq!(groups[1].paths[0].to_string(), "employees.name");
        assert_eq!(groups[2].paths[0].to_string(), "Employees.manager.name");

        // Second level only sees the continuing paths
        let continuing: Vec<&MemberPath> = groups[1]
            .paths
            .iter()
            .chain(groups[2].paths.iter())
            .copied()
            .collect();
        let nested = group_by_segment(&continuing, 1);
        let keys: Vec<&str> = nested.iter().map(|g| g.segment).collect();
        assert_eq!(keys, vec!["name", "manager"]);
    }
}
