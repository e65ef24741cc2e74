//! Import registry.
//!
//! Tracks the external modules referenced while rendering and assigns each a
//! local alias. The registry is private to one generation session.

use shapegen_universe::{ModuleRef, TypeRef, decompose};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Registry of module aliases for one generation session.
#[derive(Debug, Clone)]
pub struct ImportRegistry {
    target: String,
    aliases: BTreeMap<String, String>,
    index: usize,
}

impl ImportRegistry {
    /// Creates an empty registry for code generated against `target`.
    ///
    /// References to types declared in the target module are never qualified.
    #[must_use]
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            aliases: BTreeMap::new(),
            index: 0,
        }
    }

    /// Returns the target module path.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Returns the alias for a module, assigning one on first sight.
    ///
    /// Aliases are `<short name>_<index>` where the index grows with every
    /// newly registered module, so two modules never share an alias.
    pub fn alias_for(&mut self, module: &ModuleRef) -> String {
        if let Some(alias) = self.aliases.get(&module.path) {
            return alias.clone();
        }

        let alias = format!("{}_{}", module.name, self.index);
        self.index += 1;
        tracing::debug!("Registered import {:?} as {}", module.path, alias);
        self.aliases.insert(module.path.clone(), alias.clone());
        alias
    }

    /// Returns the alias already assigned to a module path.
    #[must_use]
    pub fn alias(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// Returns the number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns true if no module has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Renders a type reference as it should appear in generated code.
    ///
    /// Leaves owned by another module are qualified with that module's alias,
    /// registering it if needed. Target-module leaves, built-ins and opaque
    /// leaves are written bare.
    ///
    /// # Arguments
    /// * `ty` - The type reference to render
    ///
    /// # Returns
    /// The indirection prefix followed by the (possibly qualified) leaf name.
    pub fn type_string(&mut self, ty: &TypeRef) -> String {
        let (leaf, prefix) = decompose(ty);
        match leaf {
            TypeRef::Named {
                module: Some(module),
                name,
            } if module.path != self.target => {
                let alias = self.alias_for(module);
                format!("{prefix}{alias}.{name}")
            }
            TypeRef::Named { name, .. } => format!("{prefix}{name}"),
            other => format!("{prefix}{other}"),
        }
    }

    /// Renders a type reference with the owning module path quoted in place
    /// of an alias, e.g. `*"example.com/m".Person`.
    ///
    /// Does not register anything.
    #[must_use]
    pub fn type_canonical(&self, ty: &TypeRef) -> String {
        let (leaf, prefix) = decompose(ty);
        match leaf {
            TypeRef::Named {
                module: Some(module),
                name,
            } => format!("{prefix}{:?}.{name}", module.path),
            TypeRef::Named { name, .. } => format!("{prefix}{name}"),
            other => format!("{prefix}{other}"),
        }
    }

    /// Emits the import block, one entry per module sorted by path.
    #[must_use]
    pub fn emit(&self) -> String {
        let mut block = String::from("import (\n");
        for (path, alias) in &self.aliases {
            let _ = writeln!(block, "\t{alias} {path:?}");
        }
        block.push(')');
        block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(path: &str) -> ModuleRef {
        ModuleRef::from_path(path)
    }

    #[test]
    fn test_alias_is_idempotent() {
        let mut registry = ImportRegistry::new("example.com/app");
        let first = registry.alias_for(&module("example.com/money"));
        let second = registry.alias_for(&module("example.com/money"));
        assert_eq!(first, "money_0");
        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_aliases_never_collide() {
        let mut registry = ImportRegistry::new("example.com/app");
        let a = registry.alias_for(&module("example.com/a/util"));
        let b = registry.alias_for(&module("example.com/b/util"));
        assert_eq!(a, "util_0");
        assert_eq!(b, "util_1");
    }

    #[test]
    fn test_type_string_target_module_is_bare() {
        let mut registry = ImportRegistry::new("example.com/app");
        let ty = TypeRef::parse("*[]example.com/app.Person").expect("Failed to parse");
        assert_eq!(registry.type_string(&ty), "*[]Person");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_type_string_external_module() {
        let mut registry = ImportRegistry::new("example.com/app");
        let amount = TypeRef::parse("*example.com/money.Amount").expect("Failed to parse");
        let currency = TypeRef::parse("example.com/money.Currency").expect("Failed to parse");

        assert_eq!(registry.type_string(&amount), "*money_0.Amount");
        assert_eq!(registry.type_string(&currency), "money_0.Currency");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.alias("example.com/money"), Some("money_0"));
    }

    #[test]
    fn test_type_string_builtin_and_opaque() {
        let mut registry = ImportRegistry::new("example.com/app");
        assert_eq!(registry.type_string(&TypeRef::builtin("error")), "error");
        let opaque = TypeRef::parse("[]map[string]int").expect("Failed to parse");
        assert_eq!(registry.type_string(&opaque), "[]map[string]int");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_type_canonical() {
        let registry = ImportRegistry::new("example.com/app");
        let ty = TypeRef::parse("[]*example.com/money.Amount").expect("Failed to parse");
        assert_eq!(registry.type_canonical(&ty), "[]*\"example.com/money\".Amount");
        let local = TypeRef::parse("example.com/app.Person").expect("Failed to parse");
        assert_eq!(registry.type_canonical(&local), "\"example.com/app\".Person");
        assert_eq!(registry.type_canonical(&TypeRef::builtin("int")), "int");
        assert!(registry.is_empty());
    }

    #[test]
    fn test_emit_sorted_by_path() {
        let mut registry = ImportRegistry::new("example.com/app");
        registry.alias_for(&module("example.com/zeta"));
        registry.alias_for(&module("example.com/alpha"));
        assert_eq!(
            registry.emit(),
            "import (\n\talpha_1 \"example.com/alpha\"\n\tzeta_0 \"example.com/zeta\"\n)"
        );
    }

    #[test]
    fn test_emit_empty() {
        assert_eq!(ImportRegistry::new("example.com/app").emit(), "import (\n)");
    }
}
