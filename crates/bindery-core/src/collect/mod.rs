//! Context-specific collectors
//!
//! Each export source tag maps to one collector that streams candidate
//! entries into the archiver as they are discovered, ticking progress per
//! unit of work.

pub mod assignment;
pub mod eportfolio;
pub mod folder;
pub mod quiz;

use crate::archive::Archiver;
use crate::error::RunError;
use crate::job::RunContext;
use crate::model::ExportSource;
use crate::progress::ProgressTracker;

/// Dispatch by source tag to the matching collector
///
/// # Errors
/// Propagates any run-aborting collector error
pub fn dispatch(
    source: &ExportSource,
    ctx: &RunContext<'_>,
    archiver: &mut Archiver,
    progress: &mut ProgressTracker<'_>,
) -> Result<(), RunError> {
    match source {
        ExportSource::Assignment(export) => assignment::collect(export, ctx, archiver, progress),
        ExportSource::Eportfolio(portfolio) => {
            eportfolio::collect(portfolio, ctx, archiver, progress)
        }
        ExportSource::Folder(root) => folder::collect(root, ctx, archiver, progress),
        ExportSource::Quiz(quiz) => quiz::collect(quiz, ctx, archiver, progress),
    }
}
