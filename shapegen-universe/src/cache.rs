//! Type universe cache.
//!
//! Snapshots are memoized per normalized location. A hit requires the cached
//! capabilities to cover the request; otherwise the module is reloaded with
//! the union of both capability sets and the entry is replaced.

use crate::capabilities::Capabilities;
use crate::error::LoadError;
use crate::loader::{ModuleLoader, normalize_location};
use crate::resolver::{self, Kind};
use crate::snapshot::Snapshot;
use crate::type_ref::{ModuleRef, TypeRef};
use crate::types::{DeclaredType, Shape};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Cached snapshot together with the capabilities it was loaded with.
#[derive(Debug)]
struct CachedModule {
    capabilities: Capabilities,
    snapshot: Arc<Snapshot>,
}

/// Process-scoped cache of loaded module snapshots.
///
/// Readers proceed in parallel; misses and upgrades are serialized through an
/// upgradable read so a module is never loaded twice for the same request.
#[derive(Debug, Default)]
pub struct ModuleCache {
    entries: RwLock<HashMap<String, CachedModule>>,
}

impl ModuleCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Returns the capabilities cached for a location, if any.
    #[must_use]
    pub fn cached_capabilities(&self, location: &str) -> Option<Capabilities> {
        let key = normalize_location(location).ok()?;
        self.entries.read().get(&key).map(|entry| entry.capabilities)
    }

    /// Drops every cached snapshot.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Returns the cached snapshot for `location`, loading or upgrading it
    /// through `loader` when the cached capabilities do not cover the request.
    ///
    /// # Arguments
    /// * `loader` - Loader used on a miss or upgrade
    /// * `location` - Module path or local directory
    /// * `capabilities` - Facets the caller needs
    ///
    /// # Errors
    /// Returns the loader's `LoadError` unchanged. Failed loads are not cached.
    pub fn get_or_load(
        &self,
        loader: &dyn ModuleLoader,
        location: &str,
        capabilities: Capabilities,
    ) -> Result<Arc<Snapshot>, LoadError> {
        let key = normalize_location(location)?;

        if let Some(entry) = self.entries.read().get(&key)
            && entry.capabilities.satisfies(capabilities)
        {
            return Ok(Arc::clone(&entry.snapshot));
        }

        let entries = self.entries.upgradable_read();
        let wanted = match entries.get(&key) {
            Some(entry) if entry.capabilities.satisfies(capabilities) => {
                return Ok(Arc::clone(&entry.snapshot));
            }
            Some(entry) => {
                tracing::debug!(
                    "Upgrading module {:?} from {:?} to {:?}",
                    key,
                    entry.capabilities,
                    entry.capabilities | capabilities
                );
                entry.capabilities | capabilities
            }
            None => capabilities,
        };

        let snapshot = Arc::new(loader.load(&key, wanted)?);
        for diagnostic in snapshot.diagnostics() {
            tracing::warn!("{}", diagnostic);
        }

        let mut entries = RwLockUpgradableReadGuard::upgrade(entries);
        entries.insert(
            key,
            CachedModule {
                capabilities: wanted,
                snapshot: Arc::clone(&snapshot),
            },
        );
        Ok(snapshot)
    }
}

/// A declared type located in a loaded module.
#[derive(Debug, Clone)]
pub struct LocatedType {
    /// Module declaring the type.
    pub module: Arc<Snapshot>,
    /// The declared type itself.
    pub declared: DeclaredType,
}

impl LocatedType {
    /// Returns the kind of the type after following defined types within
    /// its own module. Use [`LocatedType::resolve_with`] or
    /// [`Universe::resolve`] to cross module boundaries first.
    #[must_use]
    pub fn kind(&self) -> Kind {
        resolver::kind(&self.module, &self.declared)
    }

    /// Follows a chain of defined types across modules.
    ///
    /// Each step looks up the named underlying type through `locate`. The
    /// chain stops at a record or capability set, at an underlying type that
    /// is not a plain named type, at a lookup failure, or when a
    /// `(module, name)` pair repeats.
    ///
    /// # Arguments
    /// * `locate` - Looks up a type by owning module and name
    ///
    /// # Returns
    /// The last type reached.
    #[must_use]
    pub fn resolve_with<F>(self, mut locate: F) -> LocatedType
    where
        F: FnMut(&ModuleRef, &str) -> Result<LocatedType, LoadError>,
    {
        let mut visited = HashSet::new();
        let mut current = self;

        while visited.insert((current.module.path().to_string(), current.declared.name.clone())) {
            let Shape::Defined(TypeRef::Named {
                module: Some(owner),
                name,
            }) = &current.declared.shape
            else {
                break;
            };
            match locate(owner, name) {
                Ok(next) => current = next,
                Err(err) => {
                    tracing::debug!(
                        "Stopped resolving {} at {}.{}: {}",
                        current.declared.name,
                        owner.path,
                        name,
                        err
                    );
                    break;
                }
            }
        }

        current
    }
}

/// Loader paired with a shared cache: the queryable type universe.
#[derive(Clone)]
pub struct Universe {
    loader: Arc<dyn ModuleLoader>,
    cache: Arc<ModuleCache>,
}

impl Universe {
    /// Creates a universe with a fresh cache.
    #[must_use]
    pub fn new(loader: impl ModuleLoader + 'static) -> Self {
        Self::with_cache(Arc::new(loader), Arc::new(ModuleCache::new()))
    }

    /// Creates a universe sharing an existing cache.
    #[must_use]
    pub fn with_cache(loader: Arc<dyn ModuleLoader>, cache: Arc<ModuleCache>) -> Self {
        Self { loader, cache }
    }

    /// Returns the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<ModuleCache> {
        &self.cache
    }

    /// Loads a module snapshot through the cache.
    ///
    /// # Errors
    /// Returns `LoadError` if the module cannot be loaded.
    pub fn load(&self, location: &str, capabilities: Capabilities) -> Result<Arc<Snapshot>, LoadError> {
        self.cache.get_or_load(self.loader.as_ref(), location, capabilities)
    }

    /// Loads a module with its types and looks up one declared type.
    ///
    /// # Errors
    /// Returns `LoadError::TypeNotFound` if the module does not declare `name`,
    /// or any error from loading the module.
    pub fn lookup(
        &self,
        location: &str,
        name: &str,
        capabilities: Capabilities,
    ) -> Result<LocatedType, LoadError> {
        let module = self.load(location, capabilities | Capabilities::TYPES)?;
        let declared = module
            .lookup(name)
            .cloned()
            .ok_or_else(|| LoadError::type_not_found(module.path(), name))?;
        Ok(LocatedType { module, declared })
    }

    /// Follows defined types across modules, loading each owning module with
    /// its types.
    #[must_use]
    pub fn resolve(&self, located: &LocatedType) -> LocatedType {
        located
            .clone()
            .resolve_with(|module, name| self.lookup(&module.path, name, Capabilities::NAME))
    }
}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Universe")
            .field("cached_modules", &self.cache.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_module;
    use crate::types::{ModuleDef, RecordShape};
    use parking_lot::Mutex;
    use std::sync::Barrier;
    use std::thread;

    /// Loader recording every request it serves.
    #[derive(Default)]
    struct CountingLoader {
        calls: Mutex<Vec<(String, Capabilities)>>,
    }

    impl CountingLoader {
        fn calls(&self) -> Vec<(String, Capabilities)> {
            self.calls.lock().clone()
        }
    }

    impl ModuleLoader for CountingLoader {
        fn load(&self, location: &str, capabilities: Capabilities) -> Result<Snapshot, LoadError> {
            self.calls.lock().push((location.to_string(), capabilities));
            if location == "missing" {
                return Err(LoadError::not_found(location));
            }
            let mut module = ModuleDef::new(location, "m");
            module.add_type(DeclaredType::new("Person", Shape::Record(RecordShape::default())));
            Ok(Snapshot::project(location, capabilities, module, Vec::new(), Vec::new()))
        }
    }

    #[test]
    fn test_same_request_loads_once() {
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();

        let first = cache
            .get_or_load(&loader, "example.com/m", Capabilities::NAME)
            .expect("Failed to load");
        let second = cache
            .get_or_load(&loader, "example.com/m", Capabilities::NAME)
            .expect("Failed to load");

        assert_eq!(loader.calls().len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_wider_request_upgrades_with_union() {
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();

        cache
            .get_or_load(&loader, "example.com/m", Capabilities::NAME)
            .expect("Failed to load");
        let upgraded = cache
            .get_or_load(&loader, "example.com/m", Capabilities::TYPES)
            .expect("Failed to load");

        let calls = loader.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].1, Capabilities::NAME | Capabilities::TYPES);
        assert_eq!(upgraded.capabilities(), Capabilities::NAME | Capabilities::TYPES);
        assert_eq!(cache.len(), 1);

        // Both narrower requests are now hits.
        cache
            .get_or_load(&loader, "example.com/m", Capabilities::NAME)
            .expect("Failed to load");
        cache
            .get_or_load(&loader, "example.com/m", Capabilities::TYPES)
            .expect("Failed to load");
        assert_eq!(loader.calls().len(), 2);
    }

    #[test]
    fn test_local_locations_share_entry() {
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();

        cache
            .get_or_load(&loader, "./pkg", Capabilities::NAME)
            .expect("Failed to load");
        cache
            .get_or_load(&loader, "./other/../pkg", Capabilities::NAME)
            .expect("Failed to load");

        let calls = loader.calls();
        assert_eq!(calls.len(), 1);
        assert!(std::path::Path::new(&calls[0].0).is_absolute());
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();

        assert!(cache.get_or_load(&loader, "missing", Capabilities::NAME).is_err());
        assert!(cache.get_or_load(&loader, "missing", Capabilities::NAME).is_err());
        assert_eq!(loader.calls().len(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_universe_lookup() {
        let universe = Universe::new(CountingLoader::default());

        let located = universe
            .lookup("example.com/m", "Person", Capabilities::NAME)
            .expect("Failed to look up");
        assert_eq!(located.declared.name, "Person");
        assert_eq!(located.kind(), Kind::Record);
        assert_eq!(
            universe.cache().cached_capabilities("example.com/m"),
            Some(Capabilities::NAME | Capabilities::TYPES)
        );

        let err = universe
            .lookup("example.com/m", "Nobody", Capabilities::NAME)
            .unwrap_err();
        assert!(matches!(err, LoadError::TypeNotFound { .. }));
    }

    #[test]
    fn test_concurrent_requests_load_once() {
        const THREADS: usize = 8;
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();
        let barrier = Barrier::new(THREADS);

        let snapshots: Vec<Arc<Snapshot>> = thread::scope(|scope| {
            let (cache, loader, barrier) = (&cache, &loader, &barrier);
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    scope.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_load(loader, "example.com/m", Capabilities::NAME)
                            .expect("Failed to load")
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().expect("Failed to join thread"))
                .collect()
        });

        assert_eq!(loader.calls().len(), 1);
        assert_eq!(snapshots.len(), THREADS);
        for snapshot in &snapshots[1..] {
            assert!(Arc::ptr_eq(&snapshots[0], snapshot));
        }
    }

    #[test]
    fn test_concurrent_mixed_requests_keep_union() {
        const THREADS: usize = 8;
        let loader = CountingLoader::default();
        let cache = ModuleCache::new();
        let barrier = Barrier::new(THREADS);

        thread::scope(|scope| {
            for i in 0..THREADS {
                let (cache, loader, barrier) = (&cache, &loader, &barrier);
                scope.spawn(move || {
                    let wanted = if i % 2 == 0 {
                        Capabilities::NAME
                    } else {
                        Capabilities::NAME | Capabilities::TYPES
                    };
                    barrier.wait();
                    let snapshot = cache
                        .get_or_load(loader, "example.com/m", wanted)
                        .expect("Failed to load");
                    assert!(snapshot.capabilities().satisfies(wanted));
                });
            }
        });

        assert_eq!(
            cache.cached_capabilities("example.com/m"),
            Some(Capabilities::NAME | Capabilities::TYPES)
        );
        // At most a narrow load followed by one upgrade.
        assert!(loader.calls().len() <= 2);
        assert_eq!(cache.len(), 1);
    }

    /// Loader serving manifests from memory, keyed by module path.
    struct ManifestMap(HashMap<&'static str, &'static str>);

    impl ModuleLoader for ManifestMap {
        fn load(&self, location: &str, capabilities: Capabilities) -> Result<Snapshot, LoadError> {
            let xml = self
                .0
                .get(location)
                .ok_or_else(|| LoadError::not_found(location))?;
            let module = parse_module(xml).expect("Failed to parse");
            Ok(Snapshot::project(location, capabilities, module, Vec::new(), Vec::new()))
        }
    }

    fn linked_universe() -> Universe {
        let manifests = [
            (
                "example.com/shop",
                r#"<module path="example.com/shop" name="shop">
    <type name="Price" underlying="example.com/money.Amount"/>
    <type name="Alias" underlying="example.com/money.Cost"/>
    <type name="Ghost" underlying="example.com/nowhere.Thing"/>
    <type name="Ping" underlying="example.com/pong.Pong"/>
    <type name="Tags" underlying="[]example.com/money.Amount"/>
</module>"#,
            ),
            (
                "example.com/money",
                r#"<module path="example.com/money" name="money">
    <record name="Amount">
        <field name="Units" type="int64"/>
    </record>
    <type name="Cost" underlying="Amount"/>
</module>"#,
            ),
            (
                "example.com/pong",
                r#"<module path="example.com/pong" name="pong">
    <type name="Pong" underlying="example.com/shop.Ping"/>
</module>"#,
            ),
        ];
        Universe::new(ManifestMap(manifests.into_iter().collect()))
    }

    fn resolved(universe: &Universe, name: &str) -> LocatedType {
        let located = universe
            .lookup("example.com/shop", name, Capabilities::NAME)
            .expect("Failed to look up");
        universe.resolve(&located)
    }

    #[test]
    fn test_resolve_crosses_modules() {
        let universe = linked_universe();

        let price = resolved(&universe, "Price");
        assert_eq!(price.module.path(), "example.com/money");
        assert_eq!(price.declared.name, "Amount");
        assert_eq!(price.kind(), Kind::Record);

        let alias = resolved(&universe, "Alias");
        assert_eq!(alias.declared.name, "Amount");
        assert_eq!(alias.kind(), Kind::Record);
    }

    #[test]
    fn test_resolve_stops_at_missing_module() {
        let universe = linked_universe();

        let ghost = resolved(&universe, "Ghost");
        assert_eq!(ghost.module.path(), "example.com/shop");
        assert_eq!(ghost.declared.name, "Ghost");
        assert!(matches!(ghost.kind(), Kind::Unsupported(_)));
    }

    #[test]
    fn test_resolve_stops_on_cycle() {
        let universe = linked_universe();

        let ping = resolved(&universe, "Ping");
        assert!(matches!(ping.kind(), Kind::Unsupported(_)));
        // Ping -> Pong -> Ping again, where the chain stops.
        assert_eq!(ping.module.path(), "example.com/shop");
        assert_eq!(ping.declared.name, "Ping");
        assert!(universe.cache().cached_capabilities("example.com/pong").is_some());
    }

    #[test]
    fn test_resolve_keeps_indirection() {
        let universe = linked_universe();

        let tags = resolved(&universe, "Tags");
        assert_eq!(tags.declared.name, "Tags");
        assert!(matches!(tags.kind(), Kind::Unsupported(_)));
        assert!(universe.cache().cached_capabilities("example.com/money").is_none());
    }
}
