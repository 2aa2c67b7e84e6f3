//! Collection shapes — which members are collections, and how a mapped
//! sequence gets back into the container the member declares.

use crate::error::{ProjectionError, Result};
use crate::schema::{CollectionKind, TypeRef};

use super::ast::{Expr, Materialize};

/// A collection-valued member's container kind and element type.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionShape {
    pub kind: CollectionKind,
    pub element: TypeRef,
}

/// Classify a declared type, looking through a nullable wrapper.
pub fn classify(declared: &TypeRef) -> Option<CollectionShape> {
    match declared.underlying() {
        TypeRef::Collection(kind, element) => Some(CollectionShape {
            kind: *kind,
            element: element.as_ref().clone(),
        }),
        _ => None,
    }
}

/// Fit a lazy `sequence` of `element`s to the `declared` member type.
///
/// The set of shapes is closed: arrays, lists and the list/collection
/// interfaces. Anything else fails with `UnsupportedProjectionShape`.
pub fn adapt(sequence: Expr, element: &TypeRef, declared: &TypeRef) -> Result<Expr> {
    let Some(shape) = classify(declared) else {
        return Err(ProjectionError::unsupported_shape(declared.to_string()));
    };

    match shape.kind {
        CollectionKind::Enumerable => Ok(sequence),
        CollectionKind::Array => Ok(Expr::reshape(sequence, Materialize::Array, element.clone())),
        CollectionKind::List
        | CollectionKind::Collection
        | CollectionKind::ReadOnlyList
        | CollectionKind::ReadOnlyCollection => {
            Ok(Expr::reshape(sequence, Materialize::List, element.clone()))
        }
        CollectionKind::Set => Err(ProjectionError::unsupported_shape(declared.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarKind;

    fn seq() -> Expr {
        Expr::param("items", TypeRef::collection(CollectionKind::Enumerable, employee()))
    }

    fn employee() -> TypeRef {
        TypeRef::object("Employee")
    }

    #[test]
    fn test_classify() {
        let shape = classify(&TypeRef::list_of(employee())).unwrap();
        assert_eq!(shape.kind, CollectionKind::List);
        assert_eq!(shape.element, employee());

        let shape = classify(&TypeRef::nullable(TypeRef::array_of(employee()))).unwrap();
        assert_eq!(shape.kind, CollectionKind::Array);

        assert!(classify(&employee()).is_none());
        assert!(classify(&TypeRef::Scalar(ScalarKind::String)).is_none());
    }

    #[test]
    fn test_enumerable_passes_through() {
        let declared = TypeRef::collection(CollectionKind::Enumerable, employee());
        assert_eq!(adapt(seq(), &employee(), &declared).unwrap(), seq());
    }

    #[test]
    fn test_array_materializes_to_array() {
        let out = adapt(seq(), &employee(), &TypeRef::array_of(employee())).unwrap();
        assert!(matches!(out, Expr::Reshape { into: Materialize::Array, .. }));
    }

    #[test]
    fn test_list_like_materializes_to_list() {
        for kind in [
            CollectionKind::List,
            CollectionKind::Collection,
            CollectionKind::ReadOnlyList,
            CollectionKind::ReadOnlyCollection,
        ] {
            let declared = TypeRef::collection(kind, employee());
            let out = adapt(seq(), &employee(), &declared).unwrap();
            assert!(
                matches!(out, Expr::Reshape { into: Materialize::List, .. }),
                "{:?} should materialize to a list",
                kind
            );
        }
    }

    #[test]
    fn test_set_is_unsupported() {
        let declared = TypeRef::collection(CollectionKind::Set, employee());
        let err = adapt(seq(), &employee(), &declared).unwrap_err();
        match err {
            ProjectionError::UnsupportedProjectionShape { type_name } => {
                assert_eq!(type_name, "Set<Employee>");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
