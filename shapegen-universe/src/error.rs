//! Error types for manifest parsing and module loading.

use std::path::PathBuf;
use thiserror::Error;

/// Error type for module manifest parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Invalid XML escape sequence in an attribute value.
    #[error("XML escape error: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Invalid manifest structure.
    #[error("invalid manifest structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl ParseError {
    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }
}

/// Error type for loading a module into the type universe.
///
/// Every variant is terminal for the generation run that triggered the load.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No module exists at the location.
    #[error("no module found for {location:?}")]
    NotFound {
        /// Requested location.
        location: String,
    },

    /// The location resolved to more than one module.
    #[error("too many modules for {location:?}: {}", display_paths(.candidates))]
    Ambiguous {
        /// Requested location.
        location: String,
        /// Manifest files that matched.
        candidates: Vec<PathBuf>,
    },

    /// The manifest could not be read.
    #[error("failed to read manifest {}: {source}", .path.display())]
    Io {
        /// Manifest path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest could not be parsed.
    #[error("failed to parse manifest {}: {source}", .path.display())]
    Parse {
        /// Manifest path.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: ParseError,
    },

    /// The current directory was needed to resolve a local location but is unavailable.
    #[error("cannot resolve local location {location:?}: {source}")]
    Resolve {
        /// Requested location.
        location: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The module loaded but does not declare the requested type.
    #[error("type '{name}' not found in module {module:?}")]
    TypeNotFound {
        /// Module path.
        module: String,
        /// Type name.
        name: String,
    },
}

impl LoadError {
    /// Creates a not found error.
    pub fn not_found(location: impl Into<String>) -> Self {
        Self::NotFound {
            location: location.into(),
        }
    }

    /// Creates a type not found error.
    pub fn type_not_found(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::TypeNotFound {
            module: module.into(),
            name: name.into(),
        }
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
