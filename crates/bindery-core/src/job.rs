//! Export job orchestration and state machine
//!
//! The entry point the external job runner invokes. Drives
//! `to_be_zipped -> zipping -> {zipped | errored}`, dispatches by source
//! tag to the matching collector, and commits the terminal state. An
//! aborted run is the one exception: it resets the target to
//! `to_be_zipped` so the external queue can retry it.

use std::collections::HashSet;

use chrono::FixedOffset;
use tempfile::TempDir;
use tracing::{error, info};

use crate::archive::Archiver;
use crate::collab::{
    ArchiveStore, AttachmentStore, AuthorizationCheck, ErrorReporter, ProgressSink, Severity,
    StaticAssets, SubmissionQuery, TemplateRenderer,
};
use crate::collect;
use crate::error::RunError;
use crate::model::{AttachmentId, ExportSource, ExportTarget, UserId, WorkflowState};
use crate::names;
use crate::progress::ProgressTracker;

/// Everything one run needs, threaded explicitly through every collector
/// and archiver call. No shared mutable state outside this struct.
pub struct RunContext<'a> {
    /// Acting user; `None` for trusted internal callers
    pub principal: Option<UserId>,
    /// When false, permission checks are bypassed entirely (trusted
    /// internal/public callers only)
    pub check_user: bool,
    pub authorize: &'a dyn AuthorizationCheck,
    pub attachments: &'a dyn AttachmentStore,
    pub templates: &'a dyn TemplateRenderer,
    pub assets: &'a dyn StaticAssets,
    pub submissions: &'a dyn SubmissionQuery,
    pub storage: &'a dyn ArchiveStore,
    pub reporter: &'a dyn ErrorReporter,
    /// Attachment ids already referenced by rich content included in this
    /// export; escapes the hidden-folder exclusion
    pub referenced_ids: HashSet<AttachmentId>,
    /// Timezone for archive entry timestamps: the acting user's, or the
    /// server default the caller resolved
    pub tz_offset: FixedOffset,
}

/// Run one export to completion and return the final target record.
///
/// Never panics or propagates: an uncaught run error is reported through
/// the context's error reporter and the target goes back to `to_be_zipped`
/// for external retry. The `errored` state is reserved for runs that
/// completed but produced nothing usable.
pub fn run_export(
    mut target: ExportTarget,
    source: &ExportSource,
    ctx: &RunContext<'_>,
    sink: &mut dyn ProgressSink,
) -> ExportTarget {
    info!(target_id = target.id, "content export starting");
    match run_inner(&mut target, source, ctx, sink) {
        Ok(()) => {
            info!(
                target_id = target.id,
                state = %target.workflow_state,
                "content export finished"
            );
        }
        Err(e) => {
            error!(target_id = target.id, error = %e, "content export aborted");
            ctx.reporter.capture(&e, "content export", Severity::Error);
            // The run never completed, so the target goes back on the
            // queue instead of erroring out.
            target.workflow_state = WorkflowState::ToBeZipped;
            let _ = sink.persist(&target);
        }
    }
    target
}

fn run_inner(
    target: &mut ExportTarget,
    source: &ExportSource,
    ctx: &RunContext<'_>,
    sink: &mut dyn ProgressSink,
) -> Result<(), RunError> {
    // Persisted immediately so a concurrently polling client sees the run
    // in progress.
    target.workflow_state = WorkflowState::Zipping;
    sink.persist(target)?;

    // The run's working directory; removed with everything in it when this
    // scope exits, success or failure.
    let workdir = TempDir::new()?;
    let zip_name = format!("{}.zip", names::sanitize_words_only(source.display_name()));
    let zip_path = workdir.path().join(&zip_name);
    target.display_name = zip_name;

    let mut archiver = Archiver::create(&zip_path, workdir.path(), ctx.tz_offset)?;
    {
        let mut progress = ProgressTracker::new(target, sink);
        collect::dispatch(source, ctx, &mut archiver, &mut progress)?;
    }
    let result = archiver.finalize()?;

    if result.success {
        let bytes = std::fs::read(&zip_path)?;
        match ctx.storage.store(&bytes, target) {
            Ok(()) => {
                target.workflow_state = WorkflowState::Zipped;
                target.available = true;
                target.percent = 100;
            }
            Err(e) => {
                // The archive built but could not be put anywhere useful;
                // this run completed, so it errors rather than retrying.
                error!(target_id = target.id, error = %e, "archive upload failed");
                ctx.reporter.capture(&e, "archive upload", Severity::Error);
                target.workflow_state = WorkflowState::Errored;
            }
        }
    } else {
        // Every offered candidate failed to open.
        target.workflow_state = WorkflowState::Errored;
    }

    // Single final write covers both terminal branches.
    sink.persist(target)?;
    Ok(())
}
