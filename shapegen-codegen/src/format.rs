//! Formatting service for generated source.
//!
//! Formatting is best effort: the pipeline keeps the unformatted text when a
//! formatter fails and records a [`FormatWarning`].

use crate::error::FormatError;
use std::fmt;
use std::io::Write;
use std::process::{Command, Stdio};

/// Default `goimports` version used by [`CommandFormatter::go`].
pub const DEFAULT_GOIMPORTS_VERSION: &str = "v0.1.9";

/// External source formatter.
pub trait Formatter: Send + Sync {
    /// Normalizes source layout.
    ///
    /// # Errors
    /// Returns `FormatError` if the formatter fails.
    fn format(&self, source: &str) -> Result<String, FormatError>;

    /// Groups and sorts imports, treating modules under `local_prefix` as
    /// local.
    ///
    /// # Errors
    /// Returns `FormatError` if the import organizer fails.
    fn organize_imports(&self, source: &str, local_prefix: &str) -> Result<String, FormatError>;
}

/// Formatter that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFormatter;

impl Formatter for NoopFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }

    fn organize_imports(&self, source: &str, _local_prefix: &str) -> Result<String, FormatError> {
        Ok(source.to_string())
    }
}

/// Formatter piping source through external commands on stdin/stdout.
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    format_command: Vec<String>,
    imports_command: Vec<String>,
}

impl CommandFormatter {
    /// Creates a formatter from two command lines (program then arguments).
    ///
    /// The import organizer is invoked with `-local <prefix>` appended.
    #[must_use]
    pub fn new<I, J, S, T>(format_command: I, imports_command: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            format_command: format_command.into_iter().map(Into::into).collect(),
            imports_command: imports_command.into_iter().map(Into::into).collect(),
        }
    }

    /// Go toolchain formatter: `gofmt -s`, then
    /// `go run golang.org/x/tools/cmd/goimports@<version>`.
    #[must_use]
    pub fn go(version: &str) -> Self {
        Self::new(
            ["gofmt", "-s"],
            [
                "go".to_string(),
                "run".to_string(),
                format!("golang.org/x/tools/cmd/goimports@{version}"),
            ],
        )
    }

    fn run(command: &[String], input: &str) -> Result<String, FormatError> {
        let line = command.join(" ");
        let Some((program, args)) = command.split_first() else {
            return Ok(input.to_string());
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FormatError::Spawn {
                command: line.clone(),
                source,
            })?;

        // stdin is written concurrently with draining stdout.
        let writer = child.stdin.take().map(|mut stdin| {
            let input = input.as_bytes().to_vec();
            std::thread::spawn(move || stdin.write_all(&input))
        });

        let output = child.wait_with_output().map_err(|source| FormatError::Spawn {
            command: line.clone(),
            source,
        })?;
        let written = writer.map(std::thread::JoinHandle::join);

        if !output.status.success() {
            return Err(FormatError::Failed {
                command: line,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        match written {
            Some(Ok(Err(source))) => {
                return Err(FormatError::Spawn {
                    command: line,
                    source,
                });
            }
            Some(Err(_)) => {
                return Err(FormatError::Failed {
                    command: line,
                    status: output.status.to_string(),
                    stderr: "stdin writer panicked".to_string(),
                });
            }
            Some(Ok(Ok(()))) | None => {}
        }

        String::from_utf8(output.stdout).map_err(|source| FormatError::Utf8 {
            command: line,
            source,
        })
    }
}

impl Default for CommandFormatter {
    fn default() -> Self {
        Self::go(DEFAULT_GOIMPORTS_VERSION)
    }
}

impl Formatter for CommandFormatter {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        Self::run(&self.format_command, source)
    }

    fn organize_imports(&self, source: &str, local_prefix: &str) -> Result<String, FormatError> {
        let mut command = self.imports_command.clone();
        command.push("-local".to_string());
        command.push(local_prefix.to_string());
        Self::run(&command, source)
    }
}

/// Formatting step that produced a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatStage {
    /// Source layout normalization.
    Format,
    /// Import grouping.
    OrganizeImports,
}

impl fmt::Display for FormatStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format => f.write_str("format"),
            Self::OrganizeImports => f.write_str("organize imports"),
        }
    }
}

/// Non-fatal formatting failure; the previous text was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatWarning {
    /// Step that failed.
    pub stage: FormatStage,
    /// Failure description.
    pub message: String,
}

impl FormatWarning {
    /// Creates a warning from a formatter error.
    #[must_use]
    pub fn new(stage: FormatStage, err: &FormatError) -> Self {
        Self {
            stage,
            message: err.to_string(),
        }
    }
}

impl fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.message)
    }
}
