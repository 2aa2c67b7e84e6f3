//! Declared member types.
//!
//! A `TypeRef` is the static shape of a member: a scalar, a registered
//! object type, a nullable wrapper, or a collection of some element type.
//! It has a compact textual form so registries can be written by hand:
//!
//! ```text
//! int            string?          Employee
//! Employee?      Employee[]       List<Employee>
//! ReadOnlyList<Employee>          Seq<int?>
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ProjectionError;

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    String,
    Uuid,
    DateTime,
}

impl ScalarKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "bool" | "boolean" => Some(ScalarKind::Bool),
            "int" | "integer" | "long" | "i32" | "i64" => Some(ScalarKind::Int),
            "float" | "double" | "decimal" | "f32" | "f64" => Some(ScalarKind::Float),
            "string" | "str" => Some(ScalarKind::String),
            "uuid" => Some(ScalarKind::Uuid),
            "datetime" | "timestamp" => Some(ScalarKind::DateTime),
            _ => None,
        }
    }

    /// Strings are references; every other scalar is a value type.
    pub fn is_reference(self) -> bool {
        matches!(self, ScalarKind::String)
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Uuid => "uuid",
            ScalarKind::DateTime => "datetime",
        };
        write!(f, "{}", s)
    }
}

/// Container kind of a collection-valued member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CollectionKind {
    /// `T[]`
    Array,
    /// `List<T>` / `Vec<T>`
    List,
    /// `ReadOnlyList<T>`
    ReadOnlyList,
    /// `Collection<T>`
    Collection,
    /// `ReadOnlyCollection<T>`
    ReadOnlyCollection,
    /// `Seq<T>`, the lazy sequence shape
    Enumerable,
    /// `Set<T>` / `HashSet<T>`
    Set,
}

impl CollectionKind {
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "list" | "vec" => Some(CollectionKind::List),
            "readonlylist" => Some(CollectionKind::ReadOnlyList),
            "collection" => Some(CollectionKind::Collection),
            "readonlycollection" => Some(CollectionKind::ReadOnlyCollection),
            "seq" | "enumerable" => Some(CollectionKind::Enumerable),
            "set" | "hashset" => Some(CollectionKind::Set),
            _ => None,
        }
    }

    fn generic_name(self) -> &'static str {
        match self {
            CollectionKind::Array => "Array",
            CollectionKind::List => "List",
            CollectionKind::ReadOnlyList => "ReadOnlyList",
            CollectionKind::Collection => "Collection",
            CollectionKind::ReadOnlyCollection => "ReadOnlyCollection",
            CollectionKind::Enumerable => "Seq",
            CollectionKind::Set => "Set",
        }
    }
}

/// Declared type of a member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    Scalar(ScalarKind),
    /// A registered object type, by name.
    Object(String),
    Nullable(Box<TypeRef>),
    Collection(CollectionKind, Box<TypeRef>),
}

impl TypeRef {
    pub fn object(name: impl Into<String>) -> Self {
        TypeRef::Object(name.into())
    }

    /// Wrap in `Nullable`; nullable of nullable collapses.
    pub fn nullable(inner: TypeRef) -> Self {
        match inner {
            TypeRef::Nullable(_) => inner,
            other => TypeRef::Nullable(Box::new(other)),
        }
    }

    pub fn collection(kind: CollectionKind, element: TypeRef) -> Self {
        TypeRef::Collection(kind, Box::new(element))
    }

    pub fn list_of(element: TypeRef) -> Self {
        TypeRef::collection(CollectionKind::List, element)
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::collection(CollectionKind::Array, element)
    }

    /// Whether a value of this type may hold the null sentinel.
    ///
    /// Value-typed scalars are the only non-reference types; a nullable
    /// wrapper around one is treated as a reference.
    pub fn is_reference(&self) -> bool {
        match self {
            TypeRef::Scalar(kind) => kind.is_reference(),
            TypeRef::Object(_) | TypeRef::Nullable(_) | TypeRef::Collection(..) => true,
        }
    }

    /// The type with any nullable wrapper removed.
    pub fn underlying(&self) -> &TypeRef {
        match self {
            TypeRef::Nullable(inner) => inner.underlying(),
            other => other,
        }
    }

    /// Name of the object type this resolves to, looking through `Nullable`.
    pub fn object_name(&self) -> Option<&str> {
        match self.underlying() {
            TypeRef::Object(name) => Some(name),
            _ => None,
        }
    }

    /// Every object type name mentioned anywhere in this type.
    pub fn referenced_objects(&self) -> Vec<&str> {
        match self {
            TypeRef::Scalar(_) => Vec::new(),
            TypeRef::Object(name) => vec![name.as_str()],
            TypeRef::Nullable(inner) | TypeRef::Collection(_, inner) => inner.referenced_objects(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{}", kind),
            TypeRef::Object(name) => write!(f, "{}", name),
            TypeRef::Nullable(inner) => write!(f, "{}?", inner),
            TypeRef::Collection(CollectionKind::Array, element) => write!(f, "{}[]", element),
            TypeRef::Collection(kind, element) => {
                write!(f, "{}<{}>", kind.generic_name(), element)
            }
        }
    }
}

impl From<TypeRef> for String {
    fn from(ty: TypeRef) -> Self {
        ty.to_string()
    }
}

/// Whether `name` is a built-in scalar or container keyword, and so cannot
/// name a registered object type.
pub fn is_keyword(name: &str) -> bool {
    ScalarKind::from_keyword(name).is_some() || CollectionKind::from_keyword(name).is_some()
}

impl TryFrom<String> for TypeRef {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for TypeRef {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser::new(s);
        let ty = parser.parse_type()?;
        parser.skip_whitespace();
        if parser.peek().is_some() {
            return Err(parser.error("unexpected trailing input"));
        }
        Ok(ty)
    }
}

struct Parser<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.char_indices().peekable(),
            input,
            pos: 0,
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn next(&mut self) -> Option<char> {
        self.chars.next().map(|(i, c)| {
            self.pos = i + c.len_utf8();
            c
        })
    }

    fn skip_whitespace(&mut self) {
        while self.peek().map_or(false, char::is_whitespace) {
            self.next();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), ProjectionError> {
        self.skip_whitespace();
        match self.next() {
            Some(c) if c == expected => Ok(()),
            _ => Err(self.error(&format!("expected '{}' at {}", expected, self.pos))),
        }
    }

    fn error(&self, msg: &str) -> ProjectionError {
        ProjectionError::InvalidTypeRef {
            input: self.input.to_string(),
            message: msg.to_string(),
        }
    }

    /// type := base ('?' | '[]')*
    fn parse_type(&mut self) -> Result<TypeRef, ProjectionError> {
        let mut ty = self.parse_base()?;

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('?') => {
                    self.next();
                    ty = TypeRef::nullable(ty);
                }
                Some('[') => {
                    self.next();
                    self.expect(']')?;
                    ty = TypeRef::array_of(ty);
                }
                _ => break,
            }
        }

        Ok(ty)
    }

    /// base := ident ('<' type '>')?
    fn parse_base(&mut self) -> Result<TypeRef, ProjectionError> {
        self.skip_whitespace();
        let ident = self.parse_ident()?;

        self.skip_whitespace();
        if self.peek() == Some('<') {
            self.next();
            let kind = CollectionKind::from_keyword(&ident)
                .ok_or_else(|| self.error(&format!("unknown collection type '{}'", ident)))?;
            let element = self.parse_type()?;
            self.expect('>')?;
            return Ok(TypeRef::collection(kind, element));
        }

        if let Some(kind) = ScalarKind::from_keyword(&ident) {
            return Ok(TypeRef::Scalar(kind));
        }
        if CollectionKind::from_keyword(&ident).is_some() {
            return Err(self.error(&format!("'{}' needs an element type", ident)));
        }
        Ok(TypeRef::Object(ident))
    }

    fn parse_ident(&mut self) -> Result<String, ProjectionError> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                ident.push(c);
                self.next();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error(&format!("expected a type name at {}", self.pos)));
        }
        Ok(ident)
    }
}
