//! Module loaders.
//!
//! A [`ModuleLoader`] turns a location into a [`Snapshot`]. The workspace
//! ships [`ManifestLoader`], which reads XML manifests from disk.

use crate::capabilities::Capabilities;
use crate::error::LoadError;
use crate::parser::parse_module;
use crate::snapshot::Snapshot;
use crate::validation::validate_module;
use std::path::{Component, Path, PathBuf};

/// Default manifest file name looked up in a module directory.
pub const DEFAULT_MANIFEST: &str = "module.xml";

/// Source of module snapshots.
///
/// Implementations must tell "not found" apart from "ambiguous" and report
/// non-fatal problems as snapshot diagnostics rather than errors.
pub trait ModuleLoader: Send + Sync {
    /// Loads the module at `location`, populating the requested facets.
    ///
    /// # Errors
    /// Returns `LoadError` if the module cannot be found, is ambiguous, or
    /// cannot be read.
    fn load(&self, location: &str, capabilities: Capabilities) -> Result<Snapshot, LoadError>;
}

/// Returns true for locations naming a directory rather than a module path:
/// `.`, `..`, paths starting with `./` or `../`, and absolute paths.
#[must_use]
pub fn is_local(location: &str) -> bool {
    location == "."
        || location == ".."
        || location.starts_with("./")
        || location.starts_with("../")
        || Path::new(location).is_absolute()
}

/// Normalizes a location for use as a cache key.
///
/// Local locations become absolute, lexically cleaned paths so that two
/// spellings of the same directory share one key. Module paths are returned
/// unchanged.
///
/// # Errors
/// Returns `LoadError::Resolve` if the current directory is unavailable.
pub fn normalize_location(location: &str) -> Result<String, LoadError> {
    if !is_local(location) {
        return Ok(location.to_string());
    }

    let path = Path::new(location);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|source| LoadError::Resolve {
                location: location.to_string(),
                source,
            })?
            .join(path)
    };

    Ok(clean(&absolute).to_string_lossy().into_owned())
}

/// Folds `.` and `..` components without touching the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}

/// Loader reading XML module manifests from the filesystem.
///
/// Local locations are module directories. Module paths are searched under
/// every configured root as `<root>/<path>/<manifest>`.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    roots: Vec<PathBuf>,
    manifest_name: String,
}

impl ManifestLoader {
    /// Creates a loader with no search roots and the default manifest name.
    #[must_use]
    pub fn new() -> Self {
        Self {
            roots: Vec::new(),
            manifest_name: DEFAULT_MANIFEST.to_string(),
        }
    }

    /// Adds a search root for module paths.
    #[must_use]
    pub fn root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.roots.push(dir.into());
        self
    }

    /// Adds several search roots.
    #[must_use]
    pub fn roots<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.roots.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Sets the manifest file name.
    #[must_use]
    pub fn manifest_name(mut self, name: impl Into<String>) -> Self {
        self.manifest_name = name.into();
        self
    }

    /// Finds the manifest file for a location.
    fn locate(&self, location: &str) -> Result<PathBuf, LoadError> {
        if is_local(location) {
            let dir = PathBuf::from(normalize_location(location)?);
            let manifest = dir.join(&self.manifest_name);
            return if manifest.is_file() {
                Ok(manifest)
            } else {
                Err(LoadError::not_found(location))
            };
        }

        let mut candidates: Vec<PathBuf> = Vec::new();
        for root in &self.roots {
            let manifest = root.join(location).join(&self.manifest_name);
            if manifest.is_file() && !candidates.contains(&manifest) {
                candidates.push(manifest);
            }
        }

        match candidates.len() {
            0 => Err(LoadError::not_found(location)),
            1 => Ok(candidates.remove(0)),
            _ => Err(LoadError::Ambiguous {
                location: location.to_string(),
                candidates,
            }),
        }
    }
}

impl Default for ManifestLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleLoader for ManifestLoader {
    fn load(&self, location: &str, capabilities: Capabilities) -> Result<Snapshot, LoadError> {
        let manifest = self.locate(location)?;
        tracing::debug!("Loading module {:?} from {}", location, manifest.display());

        let xml = std::fs::read_to_string(&manifest).map_err(|source| LoadError::Io {
            path: manifest.clone(),
            source,
        })?;
        let module = parse_module(&xml).map_err(|source| LoadError::Parse {
            path: manifest.clone(),
            source,
        })?;
        let diagnostics = validate_module(&module);

        Ok(Snapshot::project(
            location,
            capabilities,
            module,
            vec![manifest],
            diagnostics,
        ))
    }
}
