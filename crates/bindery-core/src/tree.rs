//! Recursive folder traversal
//!
//! Pure traversal over an in-memory folder tree: applies the permission
//! filter at every node, fires a visitor callback for special-case content,
//! and streams surviving files to the caller in deterministic order.

use crate::error::RunError;
use crate::model::{FileEntry, Folder};
use crate::names;
use crate::permission::PermissionFilter;

/// Event handed to a traversal visitor before the matching node is processed
pub enum VisitEvent<'a> {
    /// A hidden or locked folder is about to be descended into; callers may
    /// emit a marker entry for the restricted container
    RestrictedFolder { folder: &'a Folder, path: &'a [String] },
    /// A file survived filtering and is about to be emitted
    File { file: &'a FileEntry, path: &'a [String] },
}

/// Callback receiving surviving files: (file, directory path, sanitized name)
pub type EmitFn<'e> = dyn FnMut(&FileEntry, &[String], String) -> Result<(), RunError> + 'e;

/// Stateless recursive walker; results depend only on the tree and filter
pub struct TreeWalker<'a> {
    filter: &'a PermissionFilter<'a>,
}

impl<'a> TreeWalker<'a> {
    #[must_use]
    pub fn new(filter: &'a PermissionFilter<'a>) -> Self {
        Self { filter }
    }

    /// Walk `folder`, streaming surviving files into `emit`.
    ///
    /// Children are visited sorted by (name, id) so traversal order is
    /// stable for a fixed input. Source records are only ever borrowed;
    /// nothing is written back.
    ///
    /// # Errors
    /// Propagates the first error returned by `emit`
    pub fn walk(
        &self,
        folder: &Folder,
        path_prefix: &[String],
        visitor: &mut dyn FnMut(&VisitEvent<'_>),
        emit: &mut EmitFn<'_>,
    ) -> Result<(), RunError> {
        let mut prefix = path_prefix.to_vec();
        self.walk_folder(folder, &mut prefix, false, visitor, emit)
    }

    fn walk_folder(
        &self,
        folder: &Folder,
        prefix: &mut Vec<String>,
        under_hidden: bool,
        visitor: &mut dyn FnMut(&VisitEvent<'_>),
        emit: &mut EmitFn<'_>,
    ) -> Result<(), RunError> {
        if folder.hidden || folder.locked {
            visitor(&VisitEvent::RestrictedFolder {
                folder,
                path: prefix,
            });
        }
        let under_hidden = under_hidden || folder.hidden;

        let mut files: Vec<&FileEntry> = folder.files.iter().collect();
        files.sort_by(|a, b| {
            (a.attachment.display_name.as_str(), a.attachment.id)
                .cmp(&(b.attachment.display_name.as_str(), b.attachment.id))
        });
        for file in files {
            if !self.filter.includes_file(file, under_hidden) {
                continue;
            }
            let name = names::sanitize_filename(&file.attachment.display_name);
            visitor(&VisitEvent::File { file, path: prefix });
            emit(file, prefix, name)?;
        }

        let mut subfolders: Vec<&Folder> = folder.folders.iter().collect();
        subfolders.sort_by(|a, b| (a.name.as_str(), a.id).cmp(&(b.name.as_str(), b.id)));
        for subfolder in subfolders {
            if !self.filter.includes_folder(subfolder) {
                continue;
            }
            prefix.push(names::sanitize_filename(&subfolder.name));
            self.walk_folder(subfolder, prefix, under_hidden, visitor, emit)?;
            prefix.pop();
        }

        Ok(())
    }
}
