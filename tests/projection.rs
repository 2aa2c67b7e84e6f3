//! End-to-end: registry file + GraphQL document + JSON rows -> projected rows.

use selectpush::{
    parse_operation, InMemoryQuery, Projection, ProjectionCompiler, ProjectionConfig,
    SelectAppender, TypeRef, TypeRegistry, Value,
};
use std::fs;
use std::sync::Arc;

const REGISTRY_TOML: &str = r#"
[[types]]
name = "Company"
keys = ["Id"]
members = [
    { name = "Id", type = "int" },
    { name = "Name", type = "string" },
    { name = "Founded", type = "datetime" },
    { name = "Employees", type = "List<Employee>" },
]

[[types]]
name = "Employee"
members = [
    { name = "Id", type = "uuid" },
    { name = "Name", type = "string" },
    { name = "Manager", type = "Employee?" },
]
"#;

const REGISTRY_YAML: &str = r#"
types:
  - name: Company
    keys: [Id]
    members:
      - { name: Id, type: int }
      - { name: Name, type: string }
      - { name: Founded, type: datetime }
      - { name: Employees, type: "List<Employee>" }
  - name: Employee
    members:
      - { name: Id, type: uuid }
      - { name: Name, type: string }
      - { name: Manager, type: "Employee?" }
"#;

const ROWS: &str = r#"[
    {
        "id": 1,
        "name": "acme",
        "founded": "1999-04-01T00:00:00Z",
        "employees": [
            { "id": "6f1c1c4e-1111-4c2a-9b7e-0d4f3e2a1b01", "name": "ada",
              "manager": { "id": "6f1c1c4e-2222-4c2a-9b7e-0d4f3e2a1b01", "name": "grace" } },
            { "id": "6f1c1c4e-3333-4c2a-9b7e-0d4f3e2a1b01", "name": "bob", "manager": null }
        ]
    },
    { "id": 2, "name": "globex", "founded": "2004-09-30T12:00:00Z", "employees": [] }
]"#;

fn load_registry() -> Arc<TypeRegistry> {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("types.toml");
    fs::write(&path, REGISTRY_TOML).unwrap();
    Arc::new(TypeRegistry::load(&path).expect("registry should load"))
}

fn load_rows(registry: &TypeRegistry) -> Vec<Value> {
    let json: serde_json::Value = serde_json::from_str(ROWS).unwrap();
    json.as_array()
        .unwrap()
        .iter()
        .map(|row| Value::from_json(registry, &TypeRef::object("Company"), row).unwrap())
        .collect()
}

#[test]
fn test_connection_query_end_to_end() {
    let registry = load_registry();
    let rows = load_rows(&registry);

    let document = r#"
        query {
            companies(first: 10) {
                edges {
                    cursor
                    node {
                        name
                        employees { name manager { name } }
                    }
                }
            }
        }
    "#;
    let fields = parse_operation(document, None).unwrap();
    let appender = SelectAppender::new(registry.clone(), ProjectionConfig::default());

    let query = InMemoryQuery::new(registry.clone(), "Company", rows);
    let query = appender
        .add_select(query, "Company", &fields[0], None, true)
        .unwrap();
    let out = serde_json::to_value(query.execute().unwrap()).unwrap();

    let expected = serde_json::json!([
        {
            "Id": 1,
            "Name": "acme",
            "Founded": "1970-01-01T00:00:00Z",
            "Employees": [
                {
                    "Id": "00000000-0000-0000-0000-000000000000",
                    "Name": "ada",
                    "Manager": {
                        "Id": "00000000-0000-0000-0000-000000000000",
                        "Name": "grace",
                        "Manager": null
                    }
                },
                {
                    "Id": "00000000-0000-0000-0000-000000000000",
                    "Name": "bob",
                    "Manager": null
                }
            ]
        },
        {
            "Id": 2,
            "Name": "globex",
            "Founded": "1970-01-01T00:00:00Z",
            "Employees": []
        }
    ]);
    assert_eq!(out, expected);
}

#[test]
fn test_yaml_and_toml_registries_agree() {
    let from_toml = load_registry();
    let from_yaml = TypeRegistry::from_yaml_str(REGISTRY_YAML).unwrap();

    let toml_types: Vec<_> = from_toml.types().cloned().collect();
    let yaml_types: Vec<_> = from_yaml.types().cloned().collect();
    assert_eq!(toml_types, yaml_types);
}

#[test]
fn test_projection_json_round_trips() {
    let registry = load_registry();
    let compiler = ProjectionCompiler::new(registry.clone());
    let projection = compiler
        .compile_str("Company", "name, employees.manager.name")
        .unwrap();

    let json = serde_json::to_string(&projection).unwrap();
    let back: Projection = serde_json::from_str(&json).unwrap();
    assert_eq!(back, projection);
    assert_eq!(back.to_string(), projection.to_string());
}

#[test]
fn test_unknown_member_in_query_is_dropped() {
    let registry = load_registry();
    let rows = load_rows(&registry);
    let fields = parse_operation("{ companies { name revenue { amount } } }", None).unwrap();

    let appender = SelectAppender::new(registry.clone(), ProjectionConfig::default());
    let query = InMemoryQuery::new(registry.clone(), "Company", rows);
    let out = appender
        .add_select(query, "Company", &fields[0], None, false)
        .unwrap()
        .execute()
        .unwrap();

    assert_eq!(out.len(), 2);
    assert_eq!(out[1].member("Name").and_then(Value::as_str), Some("globex"));
    assert_eq!(out[1].member("Employees"), Some(&Value::Null));
}
