//! Generation pipeline.
//!
//! Load destination module, load target module, look up the target type,
//! dispatch on its kind, render, splice imports, format.

use crate::args::ArgMap;
use crate::error::CodegenError;
use crate::format::{FormatStage, FormatWarning, Formatter, NoopFormatter};
use crate::model::{CapabilitySet, Record};
use crate::renderer::Renderer;
use crate::selector::TargetSelector;
use crate::session::Session;
use crate::template::TemplateSource;
use minijinja::value::Value;
use shapegen_universe::{
    Capabilities, Diagnostic, Kind, LoadError, LocatedType, ManifestLoader, ModuleCache,
    ModuleLoader, Universe, is_local,
};
use std::path::Path;
use std::sync::Arc;

/// Capabilities requested for the module declaring the target type.
pub const TARGET_CAPABILITIES: Capabilities = Capabilities::NAME
    .union(Capabilities::TYPES)
    .union(Capabilities::IMPORTS)
    .union(Capabilities::MODULE);

/// Result of a generation run. Nothing is written to disk.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Generated source text.
    pub source: String,
    /// Formatting steps that failed; their input was kept.
    pub warnings: Vec<FormatWarning>,
    /// Loader diagnostics for the modules involved.
    pub diagnostics: Vec<Diagnostic>,
}

impl Generated {
    /// Returns the generated source as bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

/// Builder for [`Generator`].
pub struct GeneratorBuilder {
    loader: Option<Arc<dyn ModuleLoader>>,
    cache: Option<Arc<ModuleCache>>,
    formatter: Option<Arc<dyn Formatter>>,
}

impl GeneratorBuilder {
    /// Creates a builder using a [`ManifestLoader`] without search roots, a
    /// fresh cache and no formatting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: None,
            cache: None,
            formatter: None,
        }
    }

    /// Sets the module loader.
    #[must_use]
    pub fn loader(mut self, loader: impl ModuleLoader + 'static) -> Self {
        self.loader = Some(Arc::new(loader));
        self
    }

    /// Sets a shared module loader.
    #[must_use]
    pub fn shared_loader(mut self, loader: Arc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Shares an existing module cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<ModuleCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the formatter applied to generated source.
    #[must_use]
    pub fn formatter(mut self, formatter: impl Formatter + 'static) -> Self {
        self.formatter = Some(Arc::new(formatter));
        self
    }

    /// Builds the generator.
    #[must_use]
    pub fn build(self) -> Generator {
        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(ManifestLoader::new()));
        let cache = self.cache.unwrap_or_default();
        Generator {
            universe: Universe::with_cache(loader, cache),
            formatter: self.formatter.unwrap_or_else(|| Arc::new(NoopFormatter)),
        }
    }
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Generates source for record and capability set types from templates.
#[derive(Clone)]
pub struct Generator {
    universe: Universe,
    formatter: Arc<dyn Formatter>,
}

impl Generator {
    /// Returns a builder.
    #[must_use]
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::new()
    }

    /// Creates a generator over `loader` with no formatting.
    #[must_use]
    pub fn new(loader: impl ModuleLoader + 'static) -> Self {
        Self::builder().loader(loader).build()
    }

    /// Returns the type universe.
    #[must_use]
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Runs the generation pipeline.
    ///
    /// # Arguments
    /// * `selector` - Target type; bare names resolve in the destination module
    /// * `template` - Template to render
    /// * `output` - Output file path; its directory is the destination module
    /// * `args` - Arguments exposed to the template through `args()`
    ///
    /// # Returns
    /// The generated source with formatting warnings and loader diagnostics.
    ///
    /// # Errors
    /// Returns `CodegenError` if a module cannot be loaded, the target type is
    /// missing or of an unsupported kind, or the template fails. Formatter
    /// failures are reported as warnings instead.
    pub fn generate(
        &self,
        selector: &TargetSelector,
        template: &TemplateSource,
        output: impl AsRef<Path>,
        args: &ArgMap,
    ) -> Result<Generated, CodegenError> {
        let destination_location = destination_location(output.as_ref());
        let destination = self
            .universe
            .load(&destination_location, Capabilities::all())?;

        let target_location = selector.module.as_deref().unwrap_or(&destination_location);
        let target = self.universe.load(target_location, TARGET_CAPABILITIES)?;

        let declared = target
            .lookup(&selector.name)
            .cloned()
            .ok_or_else(|| LoadError::type_not_found(target.path(), &selector.name))?;
        let located = LocatedType {
            module: Arc::clone(&target),
            declared,
        };

        let session = Session::new(self.universe.clone(), Arc::clone(&target));
        let root = match session.resolve(&located).kind() {
            Kind::Record => Value::from_object(Record::from_located(&session, &located)?),
            Kind::CapabilitySet => {
                Value::from_object(CapabilitySet::from_located(&session, &located)?)
            }
            kind @ Kind::Unsupported(_) => {
                return Err(CodegenError::UnsupportedKind {
                    name: selector.name.clone(),
                    kind,
                });
            }
        };

        tracing::info!("Generating {} with {}", selector, template.name());
        let rendered = Renderer::new(&session, template, args).render(root)?;

        let mut warnings = Vec::new();
        let formatted = match self.formatter.format(&rendered) {
            Ok(formatted) => formatted,
            Err(err) => {
                tracing::warn!("Formatting {} failed: {}", template.name(), err);
                warnings.push(FormatWarning::new(FormatStage::Format, &err));
                rendered
            }
        };
        let source = match self.formatter.organize_imports(&formatted, target.local_prefix()) {
            Ok(organized) => organized,
            Err(err) => {
                tracing::warn!("Organizing imports for {} failed: {}", template.name(), err);
                warnings.push(FormatWarning::new(FormatStage::OrganizeImports, &err));
                formatted
            }
        };

        let mut diagnostics = destination.diagnostics().to_vec();
        if !Arc::ptr_eq(&destination, &target) {
            diagnostics.extend_from_slice(target.diagnostics());
        }

        Ok(Generated {
            source,
            warnings,
            diagnostics,
        })
    }
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("universe", &self.universe)
            .finish_non_exhaustive()
    }
}

/// Returns the local location of the directory holding `output`.
fn destination_location(output: &Path) -> String {
    let dir = output
        .parent()
        .map(|dir| dir.to_string_lossy().into_owned())
        .unwrap_or_default();
    if dir.is_empty() {
        ".".to_string()
    } else if is_local(&dir) {
        dir
    } else {
        format!("./{dir}")
    }
}
