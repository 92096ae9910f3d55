//! Shared error types for export runs

use thiserror::Error;

/// Why an attachment source could not be opened.
///
/// Both variants follow the same policy: the entry is skipped, the run
/// continues, and the failure counts toward the archive's failed total.
#[derive(Error, Debug)]
pub enum OpenError {
    /// Transient read failure surfaced by the storage layer (timeout)
    #[error("transient read failure: {0}")]
    Retryable(String),

    /// The underlying blob is permanently unreadable (deleted)
    #[error("source unreadable: {0}")]
    Permanent(String),
}

/// Errors that abort an entire export run.
///
/// A run aborted by one of these never reaches the errored state; the
/// target is reset for external retry instead.
#[derive(Error, Debug)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    #[error("progress sink failed: {0}")]
    Progress(#[from] ProgressError),
}

/// Failure from the external template collaborator
#[derive(Error, Debug)]
#[error("{0}")]
pub struct RenderError(pub String);

/// Failure persisting the export target record
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProgressError(pub String);

/// Failure from the external blob storage collaborator during final upload
#[derive(Error, Debug)]
#[error("{0}")]
pub struct StorageError(pub String);
