//! Template sources.

use crate::error::CodegenError;
use std::path::{Path, PathBuf};

/// A template's text together with where it came from.
///
/// The path is reported to templates through `template_path()` and used to
/// name the template in error messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateSource {
    /// Template location.
    pub path: PathBuf,
    /// Template text.
    pub source: String,
}

impl TemplateSource {
    /// Creates a template source from text already in memory.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Reads a template file.
    ///
    /// # Errors
    /// Returns `CodegenError::Io` if the file cannot be read.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, CodegenError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CodegenError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, source))
    }

    /// Returns the template path as displayed to templates.
    #[must_use]
    pub fn name(&self) -> String {
        self.path.display().to_string()
    }
}
