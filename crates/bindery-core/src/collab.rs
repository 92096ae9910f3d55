//! Collaborator seams injected by the host application
//!
//! The export pipeline consumes these interfaces and never implements the
//! policy or storage behind them. Everything here is synchronous; the
//! pipeline runs to completion inside one background-job slot.

use std::io::Read;

use serde_json::Value;

use crate::error::{OpenError, ProgressError, RenderError, StorageError};
use crate::model::{
    Assignment, Attachment, AttachmentId, ExportTarget, FileEntry, Folder, Submission, UserId,
};

/// Capability symbols consumed by permission checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Download a file's content
    DownloadFile,
    /// List and read a folder's contents for export
    ReadContents,
    /// Elevated read that also sees hidden and locked content
    ManageContents,
}

/// Object handed to an authorization check
#[derive(Debug, Clone, Copy)]
pub enum AuthObject<'a> {
    File(&'a FileEntry),
    Folder(&'a Folder),
    Attachment(&'a Attachment),
}

/// Authorization policy callback. The pipeline only ever asks; it never
/// decides.
pub trait AuthorizationCheck {
    fn allowed(
        &self,
        principal: Option<UserId>,
        object: AuthObject<'_>,
        capability: Capability,
    ) -> bool;
}

/// Opaque HTML template collaborator for static e-portfolio pages
pub trait TemplateRenderer {
    /// # Errors
    /// Returns an error if the template cannot be rendered
    fn render(&self, template: &str, locals: &Value) -> Result<Vec<u8>, RenderError>;
}

/// Read access to stored attachments and their blobs
pub trait AttachmentStore {
    fn find(&self, id: AttachmentId) -> Option<Attachment>;

    /// # Errors
    /// `OpenError::Retryable` on a transient storage timeout,
    /// `OpenError::Permanent` when the blob is gone
    fn open(&self, attachment: &Attachment) -> Result<Box<dyn Read + '_>, OpenError>;
}

/// Destination for the finished archive bytes
pub trait ArchiveStore {
    /// # Errors
    /// Returns an error if the archive cannot be stored
    fn store(&self, bytes: &[u8], target: &ExportTarget) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// External error-reporting collaborator
pub trait ErrorReporter {
    fn capture(&self, error: &dyn std::error::Error, context: &str, severity: Severity);
}

/// Persists the export target record so a polling client can observe
/// state and percent changes
pub trait ProgressSink {
    /// # Errors
    /// Returns an error if the record cannot be persisted
    fn persist(&mut self, target: &ExportTarget) -> Result<(), ProgressError>;
}

/// Student-selection mode for assignment exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Concluded context: every submission of an allowed kind
    All,
    /// One representative per grouping (covers group assignments)
    Representatives,
}

/// Injected submission query capability.
///
/// Implementations own representative resolution and any persistence-side
/// filtering; the collector still re-checks submission kinds itself.
pub trait SubmissionQuery {
    fn eligible_submissions(&self, assignment: &Assignment, mode: SelectionMode)
        -> Vec<Submission>;

    /// Called exactly once per export run, not per submission
    fn increment_download_count(&self, assignment: &Assignment);
}

/// Fixed auxiliary assets bundled into every e-portfolio archive
pub trait StaticAssets {
    fn stylesheet(&self) -> Vec<u8>;
    fn logo(&self) -> Vec<u8>;
}
