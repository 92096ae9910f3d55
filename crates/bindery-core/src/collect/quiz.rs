//! Quiz file-upload answer collection
//!
//! One pass over the quiz's submissions in user order; every uploaded
//! answer attachment becomes an archive entry named like assignment
//! uploads.

use tracing::debug;

use crate::archive::Archiver;
use crate::error::RunError;
use crate::job::RunContext;
use crate::model::{Quiz, QuizSubmission};
use crate::names;
use crate::progress::ProgressTracker;
use crate::source::StoredFileSource;

/// Stream a quiz's uploaded answers into the archive
///
/// # Errors
/// Propagates archive-write and progress failures
pub fn collect(
    quiz: &Quiz,
    ctx: &RunContext<'_>,
    archiver: &mut Archiver,
    progress: &mut ProgressTracker<'_>,
) -> Result<(), RunError> {
    let mut submissions: Vec<&QuizSubmission> = quiz.submissions.iter().collect();
    submissions.sort_by_key(|submission| submission.user.id);

    progress.begin(submissions.len());
    for submission in submissions {
        let base = names::sanitize_words_only(&submission.user.sortable_name.to_lowercase());
        let stem = format!("{base}_{}", submission.user.id);
        for id in &submission.attachment_ids {
            let Some(attachment) = ctx.attachments.find(*id) else {
                debug!(attachment_id = id, "quiz answer attachment missing, skipping");
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
        progress.tick()?;
    }
    Ok(())
}
