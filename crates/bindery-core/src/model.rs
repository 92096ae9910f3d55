//! Read-only domain models consumed by the exporter
//!
//! These are the narrow query shapes the export pipeline needs from the host
//! application's persistence layer. The exporter never writes them back.

use serde::{Deserialize, Serialize};

use crate::names;

pub type UserId = i64;
pub type AttachmentId = i64;
pub type FolderId = i64;
pub type SubmissionId = i64;

/// Lifecycle of an export target record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Queued; a fresh job may pick it up
    ToBeZipped,
    /// A run owns the record and is building the archive
    Zipping,
    /// Terminal: archive built and stored
    Zipped,
    /// Terminal: run completed but produced nothing usable
    Errored,
}

impl std::fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowState::ToBeZipped => write!(f, "to_be_zipped"),
            WorkflowState::Zipping => write!(f, "zipping"),
            WorkflowState::Zipped => write!(f, "zipped"),
            WorkflowState::Errored => write!(f, "errored"),
        }
    }
}

/// The attachment record that will hold the finished archive.
///
/// Exclusively owned by one run for its duration; the state and percent
/// fields are the only externally observable signal of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportTarget {
    pub id: i64,
    /// Owning user, if any
    pub user_id: Option<UserId>,
    /// Filename the finished archive is published under
    pub display_name: String,
    pub workflow_state: WorkflowState,
    /// Percent complete, 0..=100
    pub percent: u8,
    /// Whether the finished archive is available for download
    pub available: bool,
}

impl ExportTarget {
    #[must_use]
    pub fn new(id: i64, user_id: Option<UserId>) -> Self {
        Self {
            id,
            user_id,
            display_name: String::new(),
            workflow_state: WorkflowState::ToBeZipped,
            percent: 0,
            available: false,
        }
    }
}

/// Minimal view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    /// Last-name-first display form, e.g. "Smith, John"
    pub sortable_name: String,
}

/// Minimal view of a stored file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    pub id: AttachmentId,
    pub display_name: String,
    pub content_type: String,
    pub size: u64,
}

/// A file placed in a folder tree, with its visibility flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub attachment: Attachment,
    pub hidden: bool,
    pub locked: bool,
}

/// A folder and its direct children
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub hidden: bool,
    pub locked: bool,
    pub files: Vec<FileEntry>,
    pub folders: Vec<Folder>,
}

/// How a submission was made. Only the first three kinds are exportable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SubmissionKind {
    OnlineUpload { attachment_ids: Vec<AttachmentId> },
    OnlineUrl { url: String },
    OnlineTextEntry { body: String },
    /// Media recordings, discussion posts and the like; never exported
    Other { kind: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    pub id: SubmissionId,
    pub user: UserRef,
    pub kind: SubmissionKind,
    pub late: bool,
    /// Stable per-assignment pseudonym used when students are anonymized
    pub anonymous_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assignment {
    pub id: i64,
    pub title: String,
    /// When set, exported names must not identify the student
    pub anonymize_students: bool,
}

/// An assignment together with the context flag that picks the
/// submission-selection mode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentExport {
    pub assignment: Assignment,
    /// Concluded contexts may no longer resolve group membership, so
    /// selection falls back to every matching submission
    pub context_completed: bool,
}

/// One section of an e-portfolio page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntrySection {
    RichText { content: String },
    Attachment { attachment_id: AttachmentId },
    Submission { submission_id: SubmissionId },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EportfolioEntry {
    pub id: i64,
    pub name: String,
    /// Slug used for the rendered page's filename
    pub full_slug: String,
    pub sections: Vec<EntrySection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Eportfolio {
    pub id: i64,
    pub name: String,
    /// Ordered page entries
    pub entries: Vec<EportfolioEntry>,
    /// Submissions referenced by entry sections
    pub submissions: Vec<Submission>,
}

/// A quiz submission carrying file-upload answers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub user: UserRef,
    pub attachment_ids: Vec<AttachmentId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub title: String,
    pub submissions: Vec<QuizSubmission>,
}

/// Which collector applies to a run. Immutable for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportSource {
    Assignment(AssignmentExport),
    Eportfolio(Eportfolio),
    Folder(Folder),
    Quiz(Quiz),
}

impl ExportSource {
    /// Context name the archive's top-level filename derives from
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            ExportSource::Assignment(export) => &export.assignment.title,
            ExportSource::Eportfolio(portfolio) => &portfolio.name,
            ExportSource::Folder(folder) => &folder.name,
            ExportSource::Quiz(quiz) => &quiz.title,
        }
    }
}

/// A renumbered reference to a real attachment, used by the e-portfolio
/// export to flatten rich-text file links into an indexed attachment list.
///
/// Index ordering is stable and matches the order referenced in the
/// rewritten page HTML.
#[derive(Debug, Clone)]
pub struct StaticAttachmentRef {
    /// 1-based position in the portfolio-wide sequence
    pub index: usize,
    pub attachment: Attachment,
}

impl StaticAttachmentRef {
    /// Filename this reference resolves to inside the archive
    #[must_use]
    pub fn filename(&self) -> String {
        format!(
            "{}_{}",
            self.index,
            names::sanitize_filename(&self.attachment.display_name)
        )
    }
}
