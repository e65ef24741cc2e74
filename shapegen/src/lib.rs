//! # Shapegen
//!
//! Template-driven source generation for records and capability sets.
//!
//! Shapegen loads the module declaring a target type, exposes the type to a
//! template as a navigable model, and renders it. Types referenced by the
//! template are imported automatically: the template marks where the import
//! block goes with `imports()`, and the block is filled in once rendering
//! has seen every reference.
//!
//! ## Quick Start
//!
//! ```ignore
//! use shapegen::prelude::*;
//!
//! let generator = Generator::builder()
//!     .loader(ManifestLoader::new().root("modules"))
//!     .formatter(CommandFormatter::default())
//!     .build();
//!
//! let template = TemplateSource::read("templates/mock.tpl")?;
//! let generated = generator.generate(
//!     &TargetSelector::parse("\"example.com/app\".Reader")?,
//!     &template,
//!     "mocks/reader_mock.go",
//!     &"package=mocks".parse()?,
//! )?;
//! std::fs::write("mocks/reader_mock.go", generated.as_bytes())?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`universe`] - Module manifests, type references and the module cache
//! - [`codegen`] - Template model, import registry, renderer and pipeline

pub mod prelude;

/// Module manifests, type references and the cached type universe.
pub mod universe {
    pub use shapegen_universe::*;
}

/// Template model, rendering and the generation pipeline.
pub mod codegen {
    pub use shapegen_codegen::*;
}

// Re-export commonly used items at the crate root
pub use shapegen_codegen::{
    ArgMap, CodegenError, Generated, Generator, GeneratorBuilder, TargetSelector, TemplateSource,
};
pub use shapegen_universe::{LoadError, ManifestLoader};
