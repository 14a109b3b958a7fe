//! Error types shared by the synchroniser and its collaborators.

use std::path::PathBuf;

/// Failure talking to the remote documentation API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{method} {path} returned {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Failure reported by the bulk-upload tool, already classified from its output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("upload timed out: {0}")]
    TimedOut(String),

    #[error("category not found: {0}")]
    CategoryNotFound(String),

    #[error("upload rejected: {0}")]
    Rejected(String),

    #[error("could not launch upload tool: {0}")]
    Launch(String),
}

impl UploadError {
    /// Categories created moments ago may not be visible to the upload endpoint yet.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::CategoryNotFound(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableError {
    #[error("could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },

    #[error("table markers for '{name}' not found in {path}")]
    MissingMarker { path: PathBuf, name: String },
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("base version must not be empty")]
    EmptyBaseVersion,

    #[error("retry.max_attempts must be at least 1")]
    ZeroAttempts,

    #[error("category '{0}' is listed as both guide and reference")]
    DuplicateCategory(String),

    #[error("table name '{0}' is used more than once")]
    DuplicateTable(String),
}

/// A fatal failure of one synchronisation step. The run halts on the first one.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to fork version {version} from {base}: {source}")]
    Fork {
        base: String,
        version: String,
        source: ApiError,
    },

    #[error("{step} failed: {source}")]
    Api {
        step: &'static str,
        source: ApiError,
    },

    #[error("{failed} of {total} requests failed during {step}; first error: {first}")]
    Cleanup {
        step: &'static str,
        failed: usize,
        total: usize,
        first: ApiError,
    },

    #[error("OpenAPI upload failed: {0}")]
    Specification(#[source] UploadError),

    #[error("guide upload failed: {0}")]
    Guides(#[source] UploadError),

    #[error("reference upload failed: {0}")]
    ReferenceDocs(#[source] UploadError),

    #[error("reference upload still failing after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: UploadError },

    #[error(transparent)]
    Tables(#[from] TableError),
}
