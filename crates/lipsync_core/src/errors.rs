//! Error types for batch runs.
//!
//! Two families exist:
//! - [`BatchError`] is fatal. It aborts the run before any inference starts.
//! - [`InferenceError`] is per combination. The runner counts it and moves on.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::SettingsError;
use crate::media::MediaKind;

/// Fatal errors raised while preparing a batch run.
#[derive(Error, Debug)]
pub enum BatchError {
    /// No matching input files (empty directory or empty asset list).
    #[error("No {kind} files (*.{extension}) found{}", location(.dir))]
    NoInput {
        kind: MediaKind,
        extension: String,
        dir: Option<PathBuf>,
    },

    /// An input directory does not exist or is not a directory.
    #[error("{kind} directory not found: {}", .dir.display())]
    DirectoryNotFound { kind: MediaKind, dir: PathBuf },

    /// Two input files share a base name, so their outputs would share a name.
    #[error(
        "{kind} files {} and {} share the base name '{base_name}'",
        .first.display(),
        .second.display()
    )]
    DuplicateBaseName {
        kind: MediaKind,
        base_name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// The model config or checkpoint file is missing.
    #[error("{what} not found: {}", .path.display())]
    MissingModelFile { what: String, path: PathBuf },

    /// The settings file could not be loaded or written.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// File I/O error while preparing the run.
    #[error("I/O error in {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: io::Error,
    },
}

impl BatchError {
    /// Create a no-input error for a scanned directory.
    pub fn no_input(kind: MediaKind, extension: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self::NoInput {
            kind,
            extension: extension.into(),
            dir: Some(dir.into()),
        }
    }

    /// Create a no-input error for an asset list that was passed in directly.
    pub fn empty_assets(kind: MediaKind, extension: impl Into<String>) -> Self {
        Self::NoInput {
            kind,
            extension: extension.into(),
            dir: None,
        }
    }

    /// Create a directory-not-found error.
    pub fn directory_not_found(kind: MediaKind, dir: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound {
            kind,
            dir: dir.into(),
        }
    }

    /// Create a duplicate base name error.
    pub fn duplicate_base_name(
        kind: MediaKind,
        base_name: impl Into<String>,
        first: impl Into<PathBuf>,
        second: impl Into<PathBuf>,
    ) -> Self {
        Self::DuplicateBaseName {
            kind,
            base_name: base_name.into(),
            first: first.into(),
            second: second.into(),
        }
    }

    /// Create a missing model file error.
    pub fn missing_model_file(what: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::MissingModelFile {
            what: what.into(),
            path: path.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }
}

/// Failure of a single generation call.
#[derive(Error, Debug)]
pub enum InferenceError {
    /// The inference process could not be started.
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The inference process exited unsuccessfully.
    #[error("{tool} failed with exit code {exit_code}: {message}")]
    CommandFailed {
        tool: String,
        exit_code: i32,
        message: String,
    },

    /// The process reported success but wrote nothing.
    #[error("Inference finished but produced no output at {}", .path.display())]
    MissingOutput { path: PathBuf },

    /// Any other failure reported by a generator.
    #[error("{0}")]
    Other(String),
}

impl InferenceError {
    /// Create a command failed error.
    pub fn command_failed(
        tool: impl Into<String>,
        exit_code: i32,
        message: impl Into<String>,
    ) -> Self {
        Self::CommandFailed {
            tool: tool.into(),
            exit_code,
            message: message.into(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

fn location(dir: &Option<PathBuf>) -> String {
    match dir {
        Some(dir) => format!(" in {}", dir.display()),
        None => String::new(),
    }
}

/// Result type for run preparation.
pub type BatchResult<T> = Result<T, BatchError>;
