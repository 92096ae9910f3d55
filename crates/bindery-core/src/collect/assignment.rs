//! Assignment submission collection
//!
//! Picks one representative submission per student (or per group), filters
//! to downloadable submission types, and fans out to file attachments or
//! synthesized HTML pseudo-files.

use tracing::debug;

use crate::archive::Archiver;
use crate::collab::SelectionMode;
use crate::error::RunError;
use crate::job::RunContext;
use crate::model::{Assignment, AssignmentExport, Submission, SubmissionKind};
use crate::names;
use crate::progress::ProgressTracker;
use crate::source::{AttachmentSource, StoredFileSource, SynthesizedTextSource};

/// Stream one assignment's downloadable submissions into the archive
///
/// # Errors
/// Propagates archive-write, and progress failures
pub fn collect(
    export: &AssignmentExport,
    ctx: &RunContext<'_>,
    archiver: &mut Archiver,
    progress: &mut ProgressTracker<'_>,
) -> Result<(), RunError> {
    // Concluded contexts may no longer resolve group membership, so they
    // take every matching submission instead of one per representative.
    let mode = if export.context_completed {
        SelectionMode::All
    } else {
        SelectionMode::Representatives
    };

    let mut submissions: Vec<Submission> = ctx
        .submissions
        .eligible_submissions(&export.assignment, mode)
        .into_iter()
        .filter(|submission| is_downloadable(&submission.kind))
        .collect();
    submissions.sort_by(|a, b| (a.user.id, a.id).cmp(&(b.user.id, b.id)));

    progress.begin(submissions.len());
    for submission in &submissions {
        let stem = name_stem(&export.assignment, submission);
        match &submission.kind {
            SubmissionKind::OnlineUpload { attachment_ids } => {
                // Resolved by id, not through a "current version"
                // association, so group-submission attachments are included
                // for every member.
                for id in attachment_ids {
                    let Some(attachment) = ctx.attachments.find(*id) else {
                        debug!(attachment_id = id, "submission attachment missing, skipping");
                        continue;
                    };
                    let name = format!(
                        "{stem}_{}_{}",
                        attachment.id,
                        names::sanitize_filename(&attachment.display_name)
                    );
                    let source = StoredFileSource::new(&attachment, ctx.attachments);
                    archiver.add(&[], &name, &source)?;
                }
            }
            SubmissionKind::OnlineUrl { url } => {
                let source =
                    SynthesizedTextSource::html(format!("{stem}_link.html"), url_page(url));
                archiver.add(&[], source.display_name(), &source)?;
            }
            SubmissionKind::OnlineTextEntry { body } => {
                let source =
                    SynthesizedTextSource::html(format!("{stem}_text.html"), text_page(body));
                archiver.add(&[], source.display_name(), &source)?;
            }
            // Excluded by the kind filter above
            SubmissionKind::Other { .. } => continue,
        }
        progress.tick()?;
    }

    // Once for the whole run, not per submission
    ctx.submissions.increment_download_count(&export.assignment);
    Ok(())
}

fn is_downloadable(kind: &SubmissionKind) -> bool {
    matches!(
        kind,
        SubmissionKind::OnlineUpload { .. }
            | SubmissionKind::OnlineUrl { .. }
            | SubmissionKind::OnlineTextEntry { .. }
    )
}

/// Output filename stem for one submission.
///
/// Anonymized assignments omit the student name entirely; otherwise the
/// stem is the word-only lowercased sortable name, a late marker, and the
/// user id.
fn name_stem(assignment: &Assignment, submission: &Submission) -> String {
    if assignment.anonymize_students {
        return format!("anon_{}", submission.anonymous_id);
    }
    let base = names::sanitize_words_only(&submission.user.sortable_name.to_lowercase());
    let late = if submission.late { "_LATE" } else { "" };
    format!("{base}{late}_{}", submission.user.id)
}

/// Redirect page for an online-URL submission
fn url_page(url: &str) -> Vec<u8> {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n\
         <meta http-equiv=\"refresh\" content=\"0; url={url}\"/>\n\
         <title>Submitted link</title>\n</head>\n<body>\n\
         <p>This submission is a link: <a href=\"{url}\">{url}</a></p>\n\
         </body>\n</html>\n"
    )
    .into_bytes()
}

/// Wrapper page for an online-text-entry submission's stored rich text
fn text_page(body: &str) -> Vec<u8> {
    format!("<!DOCTYPE html>\n<html>\n<body>\n{body}\n</body>\n</html>\n").into_bytes()
}
