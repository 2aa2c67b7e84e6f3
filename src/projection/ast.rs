//! Projection IR — a small algebraic expression tree.
//!
//! The compiler builds these; backends consume them. Nothing here knows how
//! a particular query engine encodes a select stage.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::schema::{MemberEntry, TypeRef};

/// Collection materialization step appended after a mapped sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Materialize {
    Array,
    List,
}

/// Projection expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Expr {
    /// A lambda parameter in scope.
    Param { name: String, ty: TypeRef },
    /// Read a member off the source.
    Read {
        source: Box<Expr>,
        member: String,
        ty: TypeRef,
    },
    /// New instance of `ty` with only these members bound; the rest stay at
    /// their defaults.
    Construct { ty: String, bindings: Vec<Binding> },
    /// Order-preserving lazy transform of every element of `source`.
    MapSequence {
        source: Box<Expr>,
        param: String,
        element: TypeRef,
        body: Box<Expr>,
    },
    /// Materialize a sequence into a concrete collection.
    Reshape {
        source: Box<Expr>,
        into: Materialize,
        element: TypeRef,
    },
    /// `probe` is null: the default of `fallback`; otherwise `value`.
    NullGuard {
        probe: Box<Expr>,
        fallback: TypeRef,
        value: Box<Expr>,
    },
}

/// One member assignment inside a `Construct`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub member: String,
    pub value: Expr,
}

impl Expr {
    pub fn param(name: impl Into<String>, ty: TypeRef) -> Expr {
        Expr::Param {
            name: name.into(),
            ty,
        }
    }

    pub fn read(source: Expr, member: &MemberEntry) -> Expr {
        Expr::Read {
            source: Box::new(source),
            member: member.name.clone(),
            ty: member.ty.clone(),
        }
    }

    pub fn map_sequence(source: Expr, param: impl Into<String>, element: TypeRef, body: Expr) -> Expr {
        Expr::MapSequence {
            source: Box::new(source),
            param: param.into(),
            element,
            body: Box::new(body),
        }
    }

    pub fn reshape(source: Expr, into: Materialize, element: TypeRef) -> Expr {
        Expr::Reshape {
            source: Box::new(source),
            into,
            element,
        }
    }

    pub fn null_guard(probe: Expr, fallback: TypeRef, value: Expr) -> Expr {
        Expr::NullGuard {
            probe: Box::new(probe),
            fallback,
            value: Box::new(value),
        }
    }

    /// Bindings of a `Construct`, empty for every other node.
    pub fn bindings(&self) -> &[Binding] {
        match self {
            Expr::Construct { bindings, .. } => bindings,
            _ => &[],
        }
    }

    /// Find the binding for `member` in a `Construct`.
    pub fn binding(&self, member: &str) -> Option<&Expr> {
        self.bindings()
            .iter()
            .find(|b| b.member == member)
            .map(|b| &b.value)
    }

    /// Total node count, handy for logging how large a projection got.
    pub fn size(&self) -> usize {
        1 + match self {
            Expr::Param { .. } => 0,
            Expr::Read { source, .. } | Expr::Reshape { source, .. } => source.size(),
            Expr::Construct { bindings, .. } => bindings.iter().map(|b| b.value.size()).sum(),
            Expr::MapSequence { source, body, .. } => source.size() + body.size(),
            Expr::NullGuard { probe, value, .. } => probe.size() + value.size(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Param { name, .. } => write!(f, "{}", name),
            Expr::Read { source, member, .. } => write!(f, "{}.{}", source, member),
            Expr::Construct { ty, bindings } => {
                write!(f, "{} {{", ty)?;
                for (i, binding) in bindings.iter().enumerate() {
                    let sep = if i == 0 { " " } else { ", " };
                    write!(f, "{}{}: {}", sep, binding.member, binding.value)?;
                }
                if bindings.is_empty() {
                    write!(f, "}}")
                } else {
                    write!(f, " }}")
                }
            }
            Expr::MapSequence {
                source, param, body, ..
            } => write!(f, "{}.map(|{}| {})", source, param, body),
            Expr::Reshape { source, into, .. } => match into {
                Materialize::Array => write!(f, "{}.to_array()", source),
                Materialize::List => write!(f, "{}.to_list()", source),
            },
            Expr::NullGuard {
                probe,
                fallback,
                value,
            } => write!(
                f,
                "if {} == null {{ default({}) }} else {{ {} }}",
                probe, fallback, value
            ),
        }
    }
}
