//! Schema module — registered element types and their members.
//!
//! Projections never inspect values to discover members. Every type a query
//! can touch is registered up front with its members in declaration order
//! and its key members, and lookups go through the cached [`MemberResolver`].
//!
//! Registries can be built in code or loaded from a file:
//!
//! ```toml
//! [[types]]
//! name = "Company"
//! keys = ["Id"]
//! members = [
//!     { name = "Id", type = "int" },
//!     { name = "Name", type = "string" },
//!     { name = "Employees", type = "List<Employee>" },
//! ]
//! ```

pub mod resolver;
pub mod type_ref;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::error::{ProjectionError, Result};

pub use resolver::{MemberEntry, MemberResolver};
pub use type_ref::{CollectionKind, ScalarKind, TypeRef};

/// A declared member of a registered type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
}

/// A registered record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
    /// Identity members that every projection of this type must fetch.
    #[serde(default)]
    pub keys: Vec<String>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            keys: Vec::new(),
        }
    }

    pub fn member(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        self.members.push(MemberDescriptor {
            name: name.into(),
            ty,
        });
        self
    }

    /// Add a member from its textual type, e.g. `"List<Employee>"`.
    pub fn key(mut self, name: impl Into<String>) -> Self {
        self.keys.push(name.into());
        self
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

struct RegisteredType {
    descriptor: TypeDescriptor,
    entries: Vec<Arc<MemberEntry>>,
}

/// The set of types projections are compiled against.
///
/// Shared across requests behind an `Arc`; the member cache inside is safe
/// to populate concurrently.
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
    resolver: MemberResolver,
}

impl TypeRegistry {
    /// Register `types`, checking names are unique and every referenced
    /// object type is itself registered.
    pub fn new(types: Vec<TypeDescriptor>) -> Result<Self> {
        let mut registered = IndexMap::with_capacity(types.len());

        for descriptor in types {
            if type_ref::is_keyword(&descriptor.name) {
                return Err(ProjectionError::InvalidTypeRef {
                    input: descriptor.name,
                    message: "type name is a built-in type keyword".to_string(),
                });
            }
            if registered.contains_key(&descriptor.name) {
                return Err(ProjectionError::DuplicateType(descriptor.name));
            }
            let entries = descriptor
                .members
                .iter()
                .enumerate()
                .map(|(index, member)| {
                    Arc::new(MemberEntry {
                        declaring_type: descriptor.name.clone(),
                        name: member.name.clone(),
                        ty: member.ty.clone(),
                        index,
                    })
                })
                .collect();
            registered.insert(
                descriptor.name.clone(),
                RegisteredType {
                    descriptor,
                    entries,
                },
            );
        }

        for ty in registered.values() {
            for member in &ty.descriptor.members {
                for name in member.ty.referenced_objects() {
                    if !registered.contains_key(name) {
                        return Err(ProjectionError::UnknownType(format!(
                            "{} (referenced by {}.{})",
                            name, ty.descriptor.name, member.name
                        )));
                    }
                }
            }
        }

        debug!(types = registered.len(), "type registry built");

        Ok(Self {
            types: registered,
            resolver: MemberResolver::new(),
        })
    }

    /// Load a registry file. The format follows the extension:
    /// `.toml`, `.yaml`/`.yml`, or `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(ProjectionError::Config(format!(
                "unsupported registry format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegistryFile =
            toml::from_str(content).map_err(|e| ProjectionError::Config(e.to_string()))?;
        Self::new(file.types)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: RegistryFile =
            serde_yaml::from_str(content).map_err(|e| ProjectionError::Config(e.to_string()))?;
        Self::new(file.types)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: RegistryFile = serde_json::from_str(content)?;
        Self::new(file.types)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name).map(|t| &t.descriptor)
    }

    pub fn require(&self, name: &str) -> Result<&TypeDescriptor> {
        self.get(name)
            .ok_or_else(|| ProjectionError::UnknownType(name.to_string()))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.types.values().map(|t| &t.descriptor)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Resolve a path segment against a registered type. Unknown types and
    /// unmatched segments both come back as `None`.
    pub fn resolve(&self, type_name: &str, segment: &str) -> Option<Arc<MemberEntry>> {
        let ty = self.types.get(type_name)?;
        self.resolver.resolve(type_name, &ty.entries, segment)
    }

    /// Key members declared for `type_name`.
    pub fn keys(&self, type_name: &str) -> &[String] {
        self.get(type_name).map(|d| d.keys.as_slice()).unwrap_or(&[])
    }

    pub fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("types", &self.types.keys().collect::<Vec<_>>())
            .field("cached_lookups", &self.resolver.cached_len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = r#"
[[types]]
name = "Company"
keys = ["Id"]
members = [
    { name = "Id", type = "int" },
    { name = "Name", type = "string" },
    { name = "Employees", type = "List<Employee>" },
]

[[types]]
name = "Employee"
members = [
    { name = "Name", type = "string" },
    { name = "Manager", type = "Employee?" },
]
"#;

    #[test]
    fn test_load_toml_registry() {
        let registry = TypeRegistry::from_toml_str(REGISTRY).unwrap();
        assert_eq!(registry.len(), 2);

        let company = registry.get("Company").unwrap();
        assert_eq!(company.members.len(), 3);
        assert_eq!(company.keys, vec!["Id".to_string()]);
        assert_eq!(
            company.members[2].ty,
            TypeRef::list_of(TypeRef::object("Employee"))
        );
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let result = TypeRegistry::new(vec![TypeDescriptor::new("Company")
            .member("Owner", TypeRef::object("Person"))]);
        assert!(matches!(result, Err(ProjectionError::UnknownType(_))));
    }

    #[test]
    fn test_keyword_type_name_rejected() {
        let content = r#"
[[types]]
name = "Order"
members = [{ name = "Placed", type = "Timestamp" }]

[[types]]
name = "Timestamp"
members = [{ name = "Seconds", type = "int" }]
"#;
        let err = TypeRegistry::from_toml_str(content).unwrap_err();
        match err {
            ProjectionError::InvalidTypeRef { input, .. } => assert_eq!(input, "Timestamp"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let result = TypeRegistry::new(vec![
            TypeDescriptor::new("Company"),
            TypeDescriptor::new("Company"),
        ]);
        assert!(matches!(result, Err(ProjectionError::DuplicateType(_))));
    }

    #[test]
    fn test_resolve_through_registry() {
        let registry = TypeRegistry::from_toml_str(REGISTRY).unwrap();

        let entry = registry.resolve("Employee", "manager").unwrap();
        assert_eq!(entry.name, "Manager");
        assert_eq!(entry.declaring_type, "Employee");

        assert!(registry.resolve("Employee", "salary").is_none());
        assert!(registry.resolve("Nobody", "name").is_none());
    }

    #[test]
    fn test_load_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("types.toml");
        fs::write(&toml_path, REGISTRY).unwrap();
        assert_eq!(TypeRegistry::load(&toml_path).unwrap().len(), 2);

        let yaml_path = dir.path().join("types.yaml");
        fs::write(
            &yaml_path,
            "types:\n  - name: Tag\n    members:\n      - { name: Label, type: string }\n",
        )
        .unwrap();
        assert_eq!(TypeRegistry::load(&yaml_path).unwrap().len(), 1);

        let txt_path = dir.path().join("types.txt");
        fs::write(&txt_path, "").unwrap();
        assert!(matches!(
            TypeRegistry::load(&txt_path),
            Err(ProjectionError::Config(_))
        ));
    }
}
