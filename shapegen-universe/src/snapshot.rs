//! Loaded module snapshots.

use crate::capabilities::Capabilities;
use crate::type_ref::ModuleRef;
use crate::types::{DeclaredType, ImportDecl, ModuleDef};
use std::fmt;
use std::path::PathBuf;

/// Non-fatal problem reported while loading a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Module path the diagnostic belongs to.
    pub module: String,
    /// Human-readable message.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(module: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.module, self.message)
    }
}

/// Immutable view of a module loaded at a given capability level.
///
/// Facets that were not requested are left empty.
#[derive(Debug, Clone)]
pub struct Snapshot {
    location: String,
    capabilities: Capabilities,
    module: ModuleDef,
    files: Vec<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl Snapshot {
    /// Projects a parsed module onto the requested capabilities.
    #[must_use]
    pub fn project(
        location: impl Into<String>,
        capabilities: Capabilities,
        mut module: ModuleDef,
        files: Vec<PathBuf>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        if !capabilities.contains(Capabilities::TYPES) {
            module.types.clear();
            module.build_type_map();
        }
        if !capabilities.contains(Capabilities::IMPORTS) {
            module.imports.clear();
        }
        if !capabilities.contains(Capabilities::MODULE) {
            module.root = None;
        }
        let files = if capabilities.contains(Capabilities::FILES) {
            files
        } else {
            Vec::new()
        };

        Self {
            location: location.into(),
            capabilities,
            module,
            files,
            diagnostics,
        }
    }

    /// Location this snapshot was loaded from (the cache key).
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Capabilities this snapshot was loaded with.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Canonical module path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.module.path
    }

    /// Short module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.module.name
    }

    /// Reference to this module for qualified type names.
    #[must_use]
    pub fn module_ref(&self) -> ModuleRef {
        self.module.module_ref()
    }

    /// Enclosing module root, if loaded with [`Capabilities::MODULE`].
    #[must_use]
    pub fn root(&self) -> Option<&str> {
        self.module.root.as_deref()
    }

    /// Prefix treated as local when organizing imports: the module root, or
    /// the module path when no root is known.
    #[must_use]
    pub fn local_prefix(&self) -> &str {
        self.root().unwrap_or(self.path())
    }

    /// Import declarations.
    #[must_use]
    pub fn imports(&self) -> &[ImportDecl] {
        &self.module.imports
    }

    /// Declared types in declaration order.
    #[must_use]
    pub fn types(&self) -> &[DeclaredType] {
        &self.module.types
    }

    /// Looks up a declared type by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&DeclaredType> {
        self.module.get_type(name)
    }

    /// Files backing the module.
    #[must_use]
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Non-fatal diagnostics reported by the loader.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
