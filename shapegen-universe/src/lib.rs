//! # Shapegen Universe
//!
//! Module manifests and the queryable type universe.
//!
//! This crate provides:
//! - XML module manifest parsing and validation
//! - Type references with pointer/slice indirection
//! - Module loaders and a capability-aware snapshot cache
//! - Type reference resolution and shape kinds
//! - Field metadata tag parsing

pub mod cache;
pub mod capabilities;
pub mod error;
pub mod loader;
pub mod parser;
pub mod resolver;
pub mod snapshot;
pub mod tag;
pub mod type_ref;
pub mod types;
pub mod validation;

pub use cache::{LocatedType, ModuleCache, Universe};
pub use capabilities::Capabilities;
pub use error::{LoadError, ParseError};
pub use loader::{DEFAULT_MANIFEST, ManifestLoader, ModuleLoader, is_local, normalize_location};
pub use parser::parse_module;
pub use resolver::{Kind, canonical_name, decompose, leaf_module};
pub use snapshot::{Diagnostic, Snapshot};
pub use tag::Tag;
pub use type_ref::{ModuleRef, TypeRef, default_short_name};
pub use types::{
    CapabilitySetShape, DeclaredType, FieldDecl, ImportDecl, MethodDecl, ModuleDef, RecordShape,
    Shape, VarDecl,
};
pub use validation::validate_module;
