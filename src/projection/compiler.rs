//! Projection compiler — path sets to construction expressions.
//!
//! For a target type and a set of member paths the compiler builds
//!
//! ```text
//! |e| Company { Name: ..., Employees: ... }
//! ```
//!
//! binding only the members some path names. Members with sub-paths recurse:
//! single objects get a nested construction over the member read, collections
//! get a per-element construction mapped over the member's sequence and then
//! reshaped to the declared container. Every reference-typed member is
//! guarded so a null source yields the member's default instead of failing.

use indexmap::IndexMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::config::ProjectionConfig;
use crate::error::{ProjectionError, Result};
use crate::schema::{MemberEntry, TypeRef, TypeRegistry};

use super::ast::{Binding, Expr};
use super::path::{group_by_segment, MemberPath, PathSet};
use super::shape;
use super::Projection;

/// Root lambda parameter name. Element parameters are `e1`, `e2`, ... by depth.
const ROOT_PARAM: &str = "e";

pub struct ProjectionCompiler {
    registry: Arc<TypeRegistry>,
    log_unresolved: bool,
}

impl ProjectionCompiler {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            log_unresolved: false,
        }
    }

    pub fn with_config(registry: Arc<TypeRegistry>, config: &ProjectionConfig) -> Self {
        Self {
            registry,
            log_unresolved: config.log_unresolved,
        }
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Compile a projection of `target_type` onto itself that populates
    /// exactly the members named by `paths` (and their prefixes).
    pub fn compile(&self, target_type: &str, paths: &PathSet) -> Result<Projection> {
        let descriptor = self.registry.require(target_type)?;
        let root = Expr::param(ROOT_PARAM, TypeRef::object(&descriptor.name));
        let paths: Vec<&MemberPath> = paths.iter().collect();

        let body = self.construct(&descriptor.name, root, &paths, 0)?;
        debug!(
            target_type,
            paths = paths.len(),
            nodes = body.size(),
            "compiled projection"
        );

        Ok(Projection {
            source_type: descriptor.name.clone(),
            param: ROOT_PARAM.to_string(),
            body,
        })
    }

    /// Compile from a comma-separated member list, e.g. `"name, employees.name"`.
    pub fn compile_str(&self, target_type: &str, members: &str) -> Result<Projection> {
        self.compile(target_type, &PathSet::parse_list(members))
    }

    fn construct(
        &self,
        target: &str,
        source: Expr,
        paths: &[&MemberPath],
        depth: usize,
    ) -> Result<Expr> {
        // Segments are grouped as written; spellings that resolve to the same
        // member are folded here, keyed by declaration index.
        let mut members: IndexMap<usize, (Arc<MemberEntry>, Vec<&MemberPath>)> = IndexMap::new();

        for group in group_by_segment(paths, depth) {
            let Some(member) = self.registry.resolve(target, group.segment) else {
                self.report_unresolved(target, group.segment, &group.paths);
                continue;
            };
            members
                .entry(member.index)
                .or_insert_with(|| (member, Vec::new()))
                .1
                .extend(group.paths);
        }

        let mut bindings: Vec<(usize, Binding)> = Vec::with_capacity(members.len());

        for (_, (member, paths)) in members {
            let children: Vec<&MemberPath> = paths
                .into_iter()
                .filter(|p| p.continues_after(depth))
                .collect();

            let read = Expr::read(source.clone(), &member);
            let value = if children.is_empty() {
                read.clone()
            } else {
                self.nested(&member, read.clone(), &children, depth)?
            };

            let value = if member.ty.is_reference() {
                Expr::null_guard(read, member.ty.clone(), value)
            } else {
                value
            };

            bindings.push((
                member.index,
                Binding {
                    member: member.name.clone(),
                    value,
                },
            ));
        }

        bindings.sort_by_key(|(index, _)| *index);

        Ok(Expr::Construct {
            ty: target.to_string(),
            bindings: bindings.into_iter().map(|(_, b)| b).collect(),
        })
    }

    /// Value for a member that has requested sub-members.
    fn nested(
        &self,
        member: &MemberEntry,
        read: Expr,
        children: &[&MemberPath],
        depth: usize,
    ) -> Result<Expr> {
        if let Some(shape) = shape::classify(&member.ty) {
            let Some(element_type) = shape.element.object_name() else {
                trace!(member = %member.name, "sub-paths on a scalar collection ignored");
                return Ok(read);
            };
            let element_type = self.object_type(element_type)?;

            let param = format!("{}{}", ROOT_PARAM, depth + 1);
            let element = Expr::param(&param, shape.element.clone());
            let body = self.construct(&element_type, element.clone(), children, depth + 1)?;
            let body = if shape.element.is_reference() {
                Expr::null_guard(element, shape.element.clone(), body)
            } else {
                body
            };

            let mapped = Expr::map_sequence(read, param, shape.element.clone(), body);
            return shape::adapt(mapped, &shape.element, &member.ty);
        }

        match member.ty.object_name() {
            Some(name) => {
                let name = self.object_type(name)?;
                self.construct(&name, read, children, depth + 1)
            }
            None => {
                trace!(member = %member.name, "sub-paths on a scalar ignored");
                Ok(read)
            }
        }
    }

    fn object_type(&self, name: &str) -> Result<String> {
        self.registry
            .get(name)
            .map(|d| d.name.clone())
            .ok_or_else(|| ProjectionError::UnknownType(name.to_string()))
    }

    fn report_unresolved(&self, target: &str, segment: &str, paths: &[&MemberPath]) {
        let dropped: Vec<String> = paths.iter().map(|p| p.to_string()).collect();
        if self.log_unresolved {
            warn!(target_type = target, segment, ?dropped, "dropping unresolved member path");
        } else {
            debug!(target_type = target, segment, ?dropped, "dropping unresolved member path");
        }
    }
}
