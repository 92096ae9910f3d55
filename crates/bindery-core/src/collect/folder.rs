//! Folder tree export
//!
//! Thin binding between the tree walker and the archiver: files surviving
//! the permission filter stream into the archive under their folder paths.

use crate::archive::Archiver;
use crate::error::RunError;
use crate::job::RunContext;
use crate::model::Folder;
use crate::permission::PermissionFilter;
use crate::progress::ProgressTracker;
use crate::source::StoredFileSource;
use crate::tree::TreeWalker;

/// Stream a folder tree into the archive
///
/// # Errors
/// Propagates archive-write and progress failures
pub fn collect(
    root: &Folder,
    ctx: &RunContext<'_>,
    archiver: &mut Archiver,
    progress: &mut ProgressTracker<'_>,
) -> Result<(), RunError> {
    let filter = PermissionFilter::new(
        ctx.authorize,
        ctx.principal,
        ctx.check_user,
        &ctx.referenced_ids,
    );
    let walker = TreeWalker::new(&filter);

    progress.begin(count_files(root));
    let mut visitor = |_event: &crate::tree::VisitEvent<'_>| {};
    walker.walk(root, &[], &mut visitor, &mut |file, dir, name| {
        let source = StoredFileSource::new(&file.attachment, ctx.attachments);
        archiver.add(dir, &name, &source)?;
        progress.tick()?;
        Ok(())
    })
}

fn count_files(folder: &Folder) -> usize {
    folder.files.len() + folder.folders.iter().map(count_files).sum::<usize>()
}
