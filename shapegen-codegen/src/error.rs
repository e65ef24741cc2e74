//! Error types for code generation.

use shapegen_universe::{Kind, LoadError};
use std::path::PathBuf;
use thiserror::Error;

/// Error type for code generation operations.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// Module loading error.
    #[error("load error: {0}")]
    Load(#[from] LoadError),

    /// Target type is neither a record nor a capability set.
    #[error("unsupported kind for type '{name}': {kind}")]
    UnsupportedKind {
        /// Target type name.
        name: String,
        /// Kind that was found.
        kind: Kind,
    },

    /// Malformed target selector.
    #[error("invalid target selector {selector:?}: {message}")]
    InvalidSelector {
        /// Selector text.
        selector: String,
        /// Error message.
        message: String,
    },

    /// Malformed template argument list.
    #[error("malformed key=value pair {pair:?}")]
    InvalidArgument {
        /// Offending segment.
        pair: String,
    },

    /// Template could not be compiled.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Template execution failed.
    #[error("error executing template '{template}': {source}")]
    Render {
        /// Template path.
        template: String,
        /// Engine error, possibly carrying a `ModelError`.
        #[source]
        source: minijinja::Error,
    },

    /// Type model misuse outside the template engine.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// IO error.
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl CodegenError {
    /// Creates an invalid selector error.
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Returns the type model error behind this error, if any.
    ///
    /// Model errors raised from template callbacks travel inside the engine
    /// error; this walks the source chain to recover them.
    #[must_use]
    pub fn model_error(&self) -> Option<&ModelError> {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(self);
        while let Some(err) = current {
            if let Some(model) = err.downcast_ref::<ModelError>() {
                return Some(model);
            }
            current = err.source();
        }
        None
    }
}

/// Misuse of the type model, raised from template callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Result queried on a method without results.
    #[error("no returns for method '{method}'")]
    NoResults {
        /// Method name.
        method: String,
    },

    /// Result index past the end of the result list.
    #[error("method '{method}' has {count} results, index {index} is out of range")]
    ResultOutOfRange {
        /// Method name.
        method: String,
        /// Requested index.
        index: usize,
        /// Number of results.
        count: usize,
    },

    /// The import placeholder was requested more than once.
    #[error("imports() already called")]
    ImportsAlreadyCalled,

    /// Projection requested for a type of another kind.
    #[error("'{name}' is not a {expected} (kind {found})")]
    KindMismatch {
        /// Type as written.
        name: String,
        /// Requested kind.
        expected: String,
        /// Actual kind.
        found: String,
    },
}

impl From<ModelError> for minijinja::Error {
    fn from(err: ModelError) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
            .with_source(err)
    }
}

/// Failure of an external formatting step.
#[derive(Debug, Error)]
pub enum FormatError {
    /// Formatter process could not be started or fed its input.
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// Command line.
        command: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Formatter exited unsuccessfully.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// Command line.
        command: String,
        /// Exit status.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// Formatter produced non UTF-8 output.
    #[error("`{command}` produced invalid UTF-8: {source}")]
    Utf8 {
        /// Command line.
        command: String,
        /// Underlying error.
        #[source]
        source: std::string::FromUtf8Error,
    },
}
