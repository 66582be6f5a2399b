//! Error types for nodepack
//!
//! All modules use `NodepackResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for nodepack operations
pub type NodepackResult<T> = Result<T, NodepackError>;

/// All errors that can abort a build
#[derive(Error, Debug)]
pub enum NodepackError {
    // Version resolution
    #[error("Unable to resolve {target} version for '{spec}': {reason}")]
    Resolution {
        target: String,
        spec: String,
        reason: String,
    },

    // Downloads and archives
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to extract archive into {path}: {reason}")]
    Extract { path: PathBuf, reason: String },

    // Subprocesses
    #[error("Command failed: {command}, exit code: {code}\n{output}")]
    CommandExit {
        command: String,
        code: i32,
        output: String,
    },

    #[error("Failed to start command: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // Source tree
    #[error("Invalid manifest at {path}: {reason}")]
    ManifestInvalid { path: PathBuf, reason: String },

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NodepackError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Create a resolution error
    pub fn resolution(
        target: impl Into<String>,
        spec: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Resolution {
            target: target.into(),
            spec: spec.into(),
            reason: reason.into(),
        }
    }

    /// Process exit code to report for this error.
    ///
    /// Subprocess failures propagate the child's code; everything else is 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::CommandExit { code, .. } => match u8::try_from(*code) {
                Ok(0) | Err(_) => 1,
                Ok(c) => c,
            },
            _ => 1,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Resolution { .. } => {
                Some("Check the \"engines\" field in package.json for a valid semver range")
            }
            Self::Fetch { .. } => Some("Check network access and the configured node mirror"),
            Self::CommandExit { .. } => {
                Some("Inspect the output above; the build stopped at the first failing command")
            }
            Self::ManifestInvalid { .. } => Some("Validate package.json with: npm install --dry-run"),
            _ => None,
        }
    }
}
