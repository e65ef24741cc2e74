//! # Shapegen Codegen
//!
//! Template-driven source generation over records and capability sets.
//!
//! This crate provides:
//! - Template model objects for records, capability sets and their members
//! - A per-run import registry with collision-free aliases
//! - A renderer that splices the import block into a deferred placeholder
//! - Pluggable source formatting
//! - The generation pipeline tying a target type, template and output together

pub mod args;
pub mod error;
pub mod format;
pub mod generator;
pub mod imports;
pub mod model;
pub mod renderer;
pub mod selector;
pub mod session;
pub mod template;

pub use args::ArgMap;
pub use error::{CodegenError, FormatError, ModelError};
pub use format::{CommandFormatter, FormatStage, FormatWarning, Formatter, NoopFormatter};
pub use generator::{Generated, Generator, GeneratorBuilder};
pub use imports::ImportRegistry;
pub use renderer::{Renderer, export};
pub use selector::TargetSelector;
pub use session::Session;
pub use template::TemplateSource;

use shapegen_universe::ManifestLoader;
use std::path::Path;

/// Generates source for one type from a template file.
///
/// Takes its inputs in textual form, the way a command line supplies them.
///
/// # Arguments
/// * `loader` - Manifest loader used to resolve modules
/// * `selector` - Target type, `Name` or `"module/path".Name`
/// * `template` - Path to the template file
/// * `output` - Output file path; its directory is the destination module
/// * `args` - Template arguments as `key=value` pairs separated by `;`
///
/// # Returns
/// The generated source; nothing is written to `output`.
///
/// # Errors
/// Returns `CodegenError` if an input is malformed or generation fails.
pub fn generate_from_file(
    loader: ManifestLoader,
    selector: &str,
    template: &Path,
    output: &Path,
    args: &str,
) -> Result<Generated, CodegenError> {
    let selector = TargetSelector::parse(selector)?;
    let args: ArgMap = args.parse()?;
    let template = TemplateSource::read(template)?;
    Generator::new(loader).generate(&selector, &template, output, &args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{APP, write_module};

    #[test]
    fn test_generate_from_file() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        write_module(dir.path(), "example.com/app", APP);
        let template = dir.path().join("mock.tpl");
        std::fs::write(&template, "type {{ name }}{{ args().get('suffix') }} struct{}\n")
            .expect("Failed to write template");

        let generated = generate_from_file(
            ManifestLoader::new().root(dir.path()),
            "\"example.com/app\".Address",
            &template,
            Path::new("out/address_mock.go"),
            "suffix=Mock",
        );
        // Relative output resolves against the working directory, which holds no manifest.
        assert!(matches!(
            generated,
            Err(CodegenError::Load(shapegen_universe::LoadError::NotFound { .. }))
        ));

        let generated = generate_from_file(
            ManifestLoader::new().root(dir.path()),
            "\"example.com/app\".Address",
            &template,
            &dir.path().join("example.com/app/address_mock.go"),
            "suffix=Mock",
        )
        .expect("Failed to generate");
        assert_eq!(generated.source, "type AddressMock struct{}\n");
    }

    #[test]
    fn test_generate_from_file_bad_inputs() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let missing = dir.path().join("missing.tpl");
        let output = dir.path().join("out.go");

        let err = generate_from_file(ManifestLoader::new(), "\"broken", &missing, &output, "")
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidSelector { .. }));

        let err = generate_from_file(ManifestLoader::new(), "Person", &missing, &output, "novalue")
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidArgument { .. }));

        let err = generate_from_file(ManifestLoader::new(), "Person", &missing, &output, "")
            .unwrap_err();
        assert!(matches!(err, CodegenError::Io { .. }));
    }
}
