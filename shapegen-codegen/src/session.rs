//! Generation sessions.
//!
//! A session ties one generation run together: the shared type universe, the
//! module the target type lives in, and the import registry that grows while
//! the template renders.

use crate::imports::ImportRegistry;
use parking_lot::Mutex;
use shapegen_universe::{
    Capabilities, LoadError, LocatedType, ModuleRef, Snapshot, TypeRef, Universe,
};
use std::sync::Arc;

/// State shared by every model object of one generation run.
#[derive(Debug)]
pub struct Session {
    universe: Universe,
    target: Arc<Snapshot>,
    imports: Mutex<ImportRegistry>,
}

impl Session {
    /// Creates a session generating code against `target`.
    #[must_use]
    pub fn new(universe: Universe, target: Arc<Snapshot>) -> Arc<Self> {
        let imports = Mutex::new(ImportRegistry::new(target.path()));
        Arc::new(Self {
            universe,
            target,
            imports,
        })
    }

    /// Returns the shared type universe.
    #[must_use]
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the target module snapshot.
    #[must_use]
    pub fn target(&self) -> &Arc<Snapshot> {
        &self.target
    }

    /// Renders a type reference, registering its module if external.
    pub fn type_string(&self, ty: &TypeRef) -> String {
        self.imports.lock().type_string(ty)
    }

    /// Renders a type reference with its module path quoted.
    #[must_use]
    pub fn type_canonical(&self, ty: &TypeRef) -> String {
        self.imports.lock().type_canonical(ty)
    }

    /// Registers a module known only by path and returns its alias.
    ///
    /// The module is loaded with [`Capabilities::NAME`] to learn its short
    /// name and canonical path, so a local directory registers under the
    /// path it declares.
    ///
    /// # Errors
    /// Returns `LoadError` if the module cannot be loaded.
    pub fn import(&self, path: &str) -> Result<String, LoadError> {
        if let Some(alias) = self.imports.lock().alias(path) {
            return Ok(alias.to_string());
        }

        let module = self.universe.load(path, Capabilities::NAME)?;
        let module_ref = ModuleRef::new(module.path(), module.name());
        Ok(self.imports.lock().alias_for(&module_ref))
    }

    /// Emits the import block accumulated so far.
    #[must_use]
    pub fn emit_imports(&self) -> String {
        self.imports.lock().emit()
    }

    /// Returns a copy of the import registry.
    #[must_use]
    pub fn imports(&self) -> ImportRegistry {
        self.imports.lock().clone()
    }

    /// Locates a named type, answering target-module lookups from the
    /// already loaded target snapshot.
    ///
    /// # Errors
    /// Returns `LoadError` if the owning module cannot be loaded or does not
    /// declare `name`.
    pub fn locate(&self, module: &ModuleRef, name: &str) -> Result<LocatedType, LoadError> {
        if module.path == self.target.path() {
            let declared = self
                .target
                .lookup(name)
                .cloned()
                .ok_or_else(|| LoadError::type_not_found(self.target.path(), name))?;
            return Ok(LocatedType {
                module: Arc::clone(&self.target),
                declared,
            });
        }

        self.universe.lookup(&module.path, name, Capabilities::NAME)
    }

    /// Follows defined types across modules, answering target-module steps
    /// from the target snapshot.
    #[must_use]
    pub fn resolve(&self, located: &LocatedType) -> LocatedType {
        located
            .clone()
            .resolve_with(|module, name| self.locate(module, name))
    }
}
