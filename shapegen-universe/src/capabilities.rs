//! Facets a loader is asked to populate when loading a module.

use bitflags::bitflags;

bitflags! {
    /// Set of snapshot facets requested from a [`ModuleLoader`](crate::ModuleLoader).
    ///
    /// A cached snapshot satisfies a request when its capabilities are a
    /// superset of the requested ones.
    #[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
    pub struct Capabilities: u32 {
        /// Module path and short name.
        const NAME = 1 << 0;
        /// Manifest files backing the module.
        const FILES = 1 << 1;
        /// Import declarations (path to short name).
        const IMPORTS = 1 << 2;
        /// Declared types with their shapes.
        const TYPES = 1 << 3;
        /// Enclosing module root, used as the local import prefix.
        const MODULE = 1 << 4;
    }
}

impl Capabilities {
    /// Returns true when `self` already covers every facet in `requested`.
    #[must_use]
    pub fn satisfies(self, requested: Self) -> bool {
        self.contains(requested)
    }
}
