//! Type reference resolution.
//!
//! Decomposes references into leaf type and indirection prefix, and decides
//! which shape kind a declared type has.

use crate::snapshot::Snapshot;
use crate::type_ref::{ModuleRef, TypeRef};
use crate::types::{DeclaredType, Shape};
use std::collections::HashSet;
use std::fmt;

/// Closed set of shape kinds a generation target can have.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Struct-like type.
    Record,
    /// Interface-like type.
    CapabilitySet,
    /// Anything else, with a description of what was found.
    Unsupported(String),
}

impl Kind {
    /// Short identifier used in templates.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Record => "record",
            Self::CapabilitySet => "capability_set",
            Self::Unsupported(_) => "unsupported",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record => f.write_str("record"),
            Self::CapabilitySet => f.write_str("capability set"),
            Self::Unsupported(what) => write!(f, "unsupported ({what})"),
        }
    }
}

/// Splits a reference into its leaf type and indirection prefix.
///
/// The prefix concatenates `*` and `[]` markers outer to inner, so
/// `*[]*pkg.T` yields (`pkg.T`, `"*[]*"`).
#[must_use]
pub fn decompose(ty: &TypeRef) -> (&TypeRef, String) {
    let mut prefix = String::new();
    let mut current = ty;
    loop {
        match current {
            TypeRef::Pointer(inner) => {
                prefix.push('*');
                current = inner;
            }
            TypeRef::Slice(inner) => {
                prefix.push_str("[]");
                current = inner;
            }
            leaf => return (leaf, prefix),
        }
    }
}

/// Returns the leaf's bare identifier with no module qualification.
///
/// Opaque leaves are returned verbatim.
#[must_use]
pub fn canonical_name(ty: &TypeRef) -> String {
    match ty.leaf() {
        TypeRef::Named { name, .. } => name.clone(),
        other => other.to_string(),
    }
}

/// Returns the module owning the leaf type, if any.
#[must_use]
pub fn leaf_module(ty: &TypeRef) -> Option<&ModuleRef> {
    match ty.leaf() {
        TypeRef::Named { module, .. } => module.as_ref(),
        _ => None,
    }
}

/// Follows defined types declared in the same module to their underlying shape.
///
/// Chains that leave the module, go through indirection, or loop back on
/// themselves stop at the last defined type reached. Cross-module chains are
/// followed by `LocatedType::resolve_with`, which needs a loader.
#[must_use]
pub fn underlying<'a>(module: &'a Snapshot, declared: &'a DeclaredType) -> &'a Shape {
    let mut visited = HashSet::new();
    let mut current = declared;

    while visited.insert(current.name.as_str()) {
        let Shape::Defined(TypeRef::Named {
            module: Some(owner),
            name,
        }) = &current.shape
        else {
            break;
        };
        if owner.path != module.path() {
            break;
        }
        match module.lookup(name) {
            Some(next) => current = next,
            None => break,
        }
    }

    &current.shape
}

/// Returns the kind of a shape.
#[must_use]
pub fn shape_kind(shape: &Shape) -> Kind {
    match shape {
        Shape::Record(_) => Kind::Record,
        Shape::CapabilitySet(_) => Kind::CapabilitySet,
        Shape::Defined(_) => Kind::Unsupported(shape.describe()),
    }
}

/// Returns the kind of a declared type after following defined types.
#[must_use]
pub fn kind(module: &Snapshot, declared: &DeclaredType) -> Kind {
    shape_kind(underlying(module, declared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::Capabilities;
    use crate::parser::parse_module;

    fn snapshot(xml: &str) -> Snapshot {
        let module = parse_module(xml).expect("Failed to parse");
        Snapshot::project("test", Capabilities::all(), module, Vec::new(), Vec::new())
    }

    const MANIFEST: &str = r#"<module path="example.com/m" name="m">
    <record name="Person"/>
    <capabilities name="Reader"/>
    <type name="Human" underlying="Person"/>
    <type name="Mortal" underlying="Human"/>
    <type name="People" underlying="[]Person"/>
    <type name="ID" underlying="string"/>
    <type name="Loop" underlying="Loop"/>
    <type name="Remote" underlying="example.com/other.Thing"/>
</module>"#;

    #[test]
    fn test_decompose() {
        let ty = TypeRef::parse("*[]*example.com/m.Person").expect("Failed to parse");
        let (leaf, prefix) = decompose(&ty);
        assert_eq!(prefix, "*[]*");
        assert_eq!(leaf.to_string(), "example.com/m.Person");

        let plain = TypeRef::builtin("int");
        let (leaf, prefix) = decompose(&plain);
        assert_eq!(prefix, "");
        assert_eq!(leaf, &plain);
    }

    #[test]
    fn test_canonical_name() {
        let ty = TypeRef::parse("[]*example.com/m.Person").expect("Failed to parse");
        assert_eq!(canonical_name(&ty), "Person");
        assert_eq!(canonical_name(&TypeRef::builtin("error")), "error");
        assert_eq!(
            canonical_name(&TypeRef::parse("*map[string]int").expect("Failed to parse")),
            "map[string]int"
        );
    }

    #[test]
    fn test_leaf_module() {
        let ty = TypeRef::parse("*example.com/m.Person").expect("Failed to parse");
        assert_eq!(leaf_module(&ty).map(|m| m.path.as_str()), Some("example.com/m"));
        assert!(leaf_module(&TypeRef::builtin("int")).is_none());
    }

    #[test]
    fn test_kind_direct() {
        let snap = snapshot(MANIFEST);
        assert_eq!(kind(&snap, snap.lookup("Person").unwrap()), Kind::Record);
        assert_eq!(kind(&snap, snap.lookup("Reader").unwrap()), Kind::CapabilitySet);
    }

    #[test]
    fn test_kind_follows_local_chain() {
        let snap = snapshot(MANIFEST);
        assert_eq!(kind(&snap, snap.lookup("Human").unwrap()), Kind::Record);
        assert_eq!(kind(&snap, snap.lookup("Mortal").unwrap()), Kind::Record);
    }

    #[test]
    fn test_kind_unsupported() {
        let snap = snapshot(MANIFEST);
        for name in ["People", "ID", "Loop"] {
            let found = kind(&snap, snap.lookup(name).unwrap());
            assert!(
                matches!(found, Kind::Unsupported(_)),
                "{name} should be unsupported, got {found}"
            );
        }
        assert_eq!(
            kind(&snap, snap.lookup("ID").unwrap()).to_string(),
            "unsupported (defined type over string)"
        );
    }

    #[test]
    fn test_kind_stops_at_module_boundary() {
        let snap = snapshot(MANIFEST);
        let remote = snap.lookup("Remote").unwrap();
        assert_eq!(
            kind(&snap, remote).to_string(),
            "unsupported (defined type over example.com/other.Thing)"
        );
        assert!(std::ptr::eq(underlying(&snap, remote), &remote.shape));
    }

    #[test]
    fn test_kind_as_str() {
        assert_eq!(Kind::Record.as_str(), "record");
        assert_eq!(Kind::CapabilitySet.as_str(), "capability_set");
        assert_eq!(Kind::Unsupported(String::new()).as_str(), "unsupported");
    }
}
