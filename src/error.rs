use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Boxed error returned by update hooks. Any `UpdateError` converts into it
/// with `?`, as does any other `Send + Sync` error type.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("I/O failure on {path}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {name}: {source}")]
    ParseError {
        name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] confique::Error),

    #[error("Update hook '{hook}' failed: {source}")]
    HookFailed { hook: String, source: HookError },

    #[error("Invalid version string '{version}': {source}")]
    InvalidVersion {
        version: String,
        source: ParseIntError,
    },

    #[error("No value for variable '{variable}' (needed by placeholder '{token}')")]
    UnresolvedVariable { token: String, variable: String },

    #[error("Storage is required: call .storage() on the builder")]
    StorageRequired,

    #[error("Current version is required: call .current_version() on the builder")]
    CurrentVersionRequired,

    #[error("Target version is required: call .target_version() on the builder")]
    TargetVersionRequired,

    #[error("No tracked files: call .files() or .file() on the builder")]
    NoTrackedFiles,

    #[error("No update hooks: call .hooks() or .hook() on the builder")]
    NoUpdateHooks,
}
