//! Shared fakes for export integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read};

use bindery_core::collab::{
    ArchiveStore, AttachmentStore, AuthObject, AuthorizationCheck, Capability, ErrorReporter,
    ProgressSink, SelectionMode, Severity, StaticAssets, SubmissionQuery, TemplateRenderer,
};
use bindery_core::error::{OpenError, ProgressError, RenderError, StorageError};
use bindery_core::job::RunContext;
use bindery_core::model::{
    Assignment, Attachment, AttachmentId, ExportTarget, Submission, SubmissionKind, UserId,
    UserRef, WorkflowState,
};
use chrono::FixedOffset;
use serde_json::Value;

// =============================================================================
// Authorization fakes
// =============================================================================

pub struct GrantAll;

impl AuthorizationCheck for GrantAll {
    fn allowed(&self, _: Option<UserId>, _: AuthObject<'_>, _: Capability) -> bool {
        true
    }
}

pub struct DenyAll;

impl AuthorizationCheck for DenyAll {
    fn allowed(&self, _: Option<UserId>, _: AuthObject<'_>, _: Capability) -> bool {
        false
    }
}

/// Grants listing and plain downloads but never the elevated capability,
/// approximating a student principal
pub struct StudentAuth;

impl AuthorizationCheck for StudentAuth {
    fn allowed(&self, _: Option<UserId>, _: AuthObject<'_>, capability: Capability) -> bool {
        capability != Capability::ManageContents
    }
}

// =============================================================================
// Attachment store
// =============================================================================

#[derive(Default)]
pub struct MemoryAttachments {
    blobs: HashMap<AttachmentId, (Attachment, Vec<u8>)>,
    failing: HashSet<AttachmentId>,
}

impl MemoryAttachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, attachment: Attachment, bytes: &[u8]) {
        self.blobs.insert(attachment.id, (attachment, bytes.to_vec()));
    }

    /// Make `open` fail with a transient error for this attachment
    pub fn fail_open(&mut self, id: AttachmentId) {
        self.failing.insert(id);
    }
}

impl AttachmentStore for MemoryAttachments {
    fn find(&self, id: AttachmentId) -> Option<Attachment> {
        self.blobs.get(&id).map(|(attachment, _)| attachment.clone())
    }

    fn open(&self, attachment: &Attachment) -> Result<Box<dyn Read + '_>, OpenError> {
        if self.failing.contains(&attachment.id) {
            return Err(OpenError::Retryable("storage timeout".to_string()));
        }
        match self.blobs.get(&attachment.id) {
            Some((_, bytes)) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(OpenError::Permanent("blob gone".to_string())),
        }
    }
}

// =============================================================================
// Storage, progress, reporting
// =============================================================================

#[derive(Default)]
pub struct CapturingStorage {
    pub stored: RefCell<Vec<Vec<u8>>>,
    pub fail: bool,
}

impl CapturingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            stored: RefCell::new(vec![]),
            fail: true,
        }
    }
}

impl ArchiveStore for CapturingStorage {
    fn store(&self, bytes: &[u8], _target: &ExportTarget) -> Result<(), StorageError> {
        if self.fail {
            return Err(StorageError("bucket unavailable".to_string()));
        }
        self.stored.borrow_mut().push(bytes.to_vec());
        Ok(())
    }
}

/// Records every persisted (state, percent) pair in order
#[derive(Default)]
pub struct RecordingSink {
    pub writes: Vec<(WorkflowState, u8)>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for RecordingSink {
    fn persist(&mut self, target: &ExportTarget) -> Result<(), ProgressError> {
        self.writes.push((target.workflow_state, target.percent));
        Ok(())
    }
}

#[derive(Default)]
pub struct NullReporter {
    pub captured: RefCell<Vec<String>>,
}

impl NullReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ErrorReporter for NullReporter {
    fn capture(&self, error: &dyn std::error::Error, context: &str, _severity: Severity) {
        self.captured.borrow_mut().push(format!("{context}: {error}"));
    }
}

// =============================================================================
// Rendering and assets
// =============================================================================

/// Embeds the locals JSON in the page so tests can assert on rewritten
/// content
pub struct EchoRenderer;

impl TemplateRenderer for EchoRenderer {
    fn render(&self, template: &str, locals: &Value) -> Result<Vec<u8>, RenderError> {
        Ok(format!("<!-- {template} -->\n{locals}").into_bytes())
    }
}

pub struct FailingRenderer;

impl TemplateRenderer for FailingRenderer {
    fn render(&self, _template: &str, _locals: &Value) -> Result<Vec<u8>, RenderError> {
        Err(RenderError("template engine down".to_string()))
    }
}

pub struct FixedAssets;

impl StaticAssets for FixedAssets {
    fn stylesheet(&self) -> Vec<u8> {
        b"body { margin: 0; }".to_vec()
    }

    fn logo(&self) -> Vec<u8> {
        b"<svg></svg>".to_vec()
    }
}

// =============================================================================
// Submission query
// =============================================================================

#[derive(Default)]
pub struct StaticSubmissions {
    pub all: Vec<Submission>,
    pub representatives: Vec<Submission>,
    pub downloads: RefCell<u32>,
}

impl StaticSubmissions {
    pub fn of(representatives: Vec<Submission>) -> Self {
        Self {
            all: vec![],
            representatives,
            downloads: RefCell::new(0),
        }
    }
}

impl SubmissionQuery for StaticSubmissions {
    fn eligible_submissions(&self, _: &Assignment, mode: SelectionMode) -> Vec<Submission> {
        match mode {
            SelectionMode::All => self.all.clone(),
            SelectionMode::Representatives => self.representatives.clone(),
        }
    }

    fn increment_download_count(&self, _: &Assignment) {
        *self.downloads.borrow_mut() += 1;
    }
}

// =============================================================================
// Fixture and builders
// =============================================================================

/// Owns one of every fake so tests can borrow a `RunContext` from it
pub struct Fixture {
    pub auth: GrantAll,
    pub attachments: MemoryAttachments,
    pub renderer: EchoRenderer,
    pub assets: FixedAssets,
    pub submissions: StaticSubmissions,
    pub storage: CapturingStorage,
    pub reporter: NullReporter,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            auth: GrantAll,
            attachments: MemoryAttachments::new(),
            renderer: EchoRenderer,
            assets: FixedAssets,
            submissions: StaticSubmissions::default(),
            storage: CapturingStorage::new(),
            reporter: NullReporter::new(),
        }
    }

    pub fn ctx(&self) -> RunContext<'_> {
        RunContext {
            principal: Some(1),
            check_user: true,
            authorize: &self.auth,
            attachments: &self.attachments,
            templates: &self.renderer,
            assets: &self.assets,
            submissions: &self.submissions,
            storage: &self.storage,
            reporter: &self.reporter,
            referenced_ids: HashSet::new(),
            tz_offset: utc(),
        }
    }

    /// Bytes of the most recently stored archive
    pub fn stored_zip(&self) -> Vec<u8> {
        self.storage
            .stored
            .borrow()
            .last()
            .cloned()
            .expect("an archive should have been stored")
    }
}

pub fn utc() -> FixedOffset {
    FixedOffset::east_opt(0).expect("zero offset is valid")
}

pub fn attachment(id: AttachmentId, display_name: &str) -> Attachment {
    Attachment {
        id,
        display_name: display_name.to_string(),
        content_type: "application/octet-stream".to_string(),
        size: 0,
    }
}

pub fn user(id: UserId, sortable_name: &str) -> UserRef {
    UserRef {
        id,
        sortable_name: sortable_name.to_string(),
    }
}

pub fn upload_submission(id: i64, user: UserRef, attachment_ids: Vec<AttachmentId>) -> Submission {
    Submission {
        id,
        user,
        kind: SubmissionKind::OnlineUpload { attachment_ids },
        late: false,
        anonymous_id: format!("anon{id}"),
    }
}

pub fn text_submission(id: i64, user: UserRef, body: &str) -> Submission {
    Submission {
        id,
        user,
        kind: SubmissionKind::OnlineTextEntry {
            body: body.to_string(),
        },
        late: false,
        anonymous_id: format!("anon{id}"),
    }
}

// =============================================================================
// Archive inspection
// =============================================================================

pub fn zip_names(bytes: &[u8]) -> Vec<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("indexed entry").name().to_string())
        .collect()
}

pub fn zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("valid archive");
    let mut entry = archive.by_name(name).expect("entry present");
    let mut out = String::new();
    entry.read_to_string(&mut out).expect("utf-8 entry");
    out
}
