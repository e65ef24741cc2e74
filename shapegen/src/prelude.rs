//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits.
//!
//! ```ignore
//! use shapegen::prelude::*;
//! ```

// Universe types
pub use shapegen_universe::{
    Capabilities, Diagnostic, Kind, LoadError, ManifestLoader, ModuleCache, ModuleLoader,
    Snapshot, Tag, TypeRef, Universe,
};

// Model types
pub use shapegen_codegen::model::{Argument, CapabilitySet, Field, Method, Record, TypeView};

// Pipeline types
pub use shapegen_codegen::{
    ArgMap, CodegenError, CommandFormatter, FormatWarning, Formatter, Generated, Generator,
    GeneratorBuilder, ModelError, NoopFormatter, TargetSelector, TemplateSource,
};
