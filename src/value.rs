//! In-memory values.
//!
//! The reference backend evaluates projections over these. A `Record` keeps
//! its members in declaration order so constructed records compare and
//! print predictably.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::error::{ProjectionError, Result};
use crate::schema::{CollectionKind, ScalarKind, TypeDescriptor, TypeRef, TypeRegistry};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Uuid(Uuid),
    DateTime(DateTime<Utc>),
    Object(Record),
    /// Materialized array.
    Array(Vec<Value>),
    /// Materialized mutable list.
    List(Vec<Value>),
    /// Lazy sequence, as produced by mapping over a collection.
    Sequence(Vec<Value>),
}

impl Value {
    /// Zero/default value of a declared type. Every reference type defaults
    /// to `Null`.
    pub fn default_for(ty: &TypeRef) -> Value {
        match ty {
            TypeRef::Scalar(ScalarKind::Bool) => Value::Bool(false),
            TypeRef::Scalar(ScalarKind::Int) => Value::Int(0),
            TypeRef::Scalar(ScalarKind::Float) => Value::Float(0.0),
            TypeRef::Scalar(ScalarKind::Uuid) => Value::Uuid(Uuid::nil()),
            TypeRef::Scalar(ScalarKind::DateTime) => Value::DateTime(DateTime::<Utc>::default()),
            TypeRef::Scalar(ScalarKind::String)
            | TypeRef::Object(_)
            | TypeRef::Nullable(_)
            | TypeRef::Collection(..) => Value::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Object(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of any collection value.
    pub fn as_items(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) | Value::List(items) | Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Read a member on a record; `None` for non-records and unknown members.
    pub fn member(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|r| r.get(name))
    }

    /// Convert JSON into a value of the declared type.
    ///
    /// Object members are matched like path segments (exact case first,
    /// then case-insensitively); members missing from
    /// the JSON take their default, extra JSON keys are ignored.
    pub fn from_json(registry: &TypeRegistry, ty: &TypeRef, json: &serde_json::Value) -> Result<Value> {
        use serde_json::Value as Json;

        if json.is_null() {
            return if ty.is_reference() {
                Ok(Value::Null)
            } else {
                Err(mismatch(ty, json))
            };
        }

        match ty {
            TypeRef::Nullable(inner) => Value::from_json(registry, inner, json),
            TypeRef::Scalar(kind) => match (kind, json) {
                (ScalarKind::Bool, Json::Bool(b)) => Ok(Value::Bool(*b)),
                (ScalarKind::Int, Json::Number(n)) => {
                    n.as_i64().map(Value::Int).ok_or_else(|| mismatch(ty, json))
                }
                (ScalarKind::Float, Json::Number(n)) => {
                    n.as_f64().map(Value::Float).ok_or_else(|| mismatch(ty, json))
                }
                (ScalarKind::String, Json::String(s)) => Ok(Value::String(s.clone())),
                (ScalarKind::Uuid, Json::String(s)) => Uuid::parse_str(s)
                    .map(Value::Uuid)
                    .map_err(|e| ProjectionError::InvalidValue(e.to_string())),
                (ScalarKind::DateTime, Json::String(s)) => DateTime::parse_from_rfc3339(s)
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|e| ProjectionError::InvalidValue(e.to_string())),
                _ => Err(mismatch(ty, json)),
            },
            TypeRef::Collection(kind, element) => {
                let items = json.as_array().ok_or_else(|| mismatch(ty, json))?;
                let items = items
                    .iter()
                    .map(|item| Value::from_json(registry, element, item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(match kind {
                    CollectionKind::Array => Value::Array(items),
                    CollectionKind::Enumerable => Value::Sequence(items),
                    _ => Value::List(items),
                })
            }
            TypeRef::Object(name) => {
                let descriptor = registry.require(name)?;
                let object = json.as_object().ok_or_else(|| mismatch(ty, json))?;

                let mut record = Record::with_defaults(descriptor);
                for (key, value) in object {
                    let Some(member) = registry.resolve(&descriptor.name, key) else {
                        continue;
                    };
                    record.set(&member.name, Value::from_json(registry, &member.ty, value)?);
                }
                Ok(Value::Object(record))
            }
        }
    }
}

fn mismatch(ty: &TypeRef, json: &serde_json::Value) -> ProjectionError {
    ProjectionError::InvalidValue(format!("expected {}, found {}", ty, json))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record)
    }
}

/// An instance of a registered type.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub type_name: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    /// An empty record with no members set.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: IndexMap::new(),
        }
    }

    /// A record with every declared member at its default value.
    pub fn with_defaults(descriptor: &TypeDescriptor) -> Self {
        let fields = descriptor
            .members
            .iter()
            .map(|m| (m.name.clone(), Value::default_for(&m.ty)))
            .collect();
        Self {
            type_name: descriptor.name.clone(),
            fields,
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_string(), value);
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
