//! Permission filtering for export traversal
//!
//! Wraps the injected authorization callback with the visibility rules the
//! exporter owes its callers: the hidden/locked/visible-to-download
//! distinction and the administrative bypass path.

use std::collections::HashSet;

use crate::collab::{AuthObject, AuthorizationCheck, Capability};
use crate::model::{Attachment, AttachmentId, FileEntry, Folder, UserId};

/// Decides inclusion of folders, files and attachments for one run
pub struct PermissionFilter<'a> {
    authorize: &'a dyn AuthorizationCheck,
    principal: Option<UserId>,
    check_user: bool,
    /// Attachment ids already referenced by rich content in this export;
    /// such files escape the hidden-folder exclusion
    referenced_ids: &'a HashSet<AttachmentId>,
}

impl<'a> PermissionFilter<'a> {
    #[must_use]
    pub fn new(
        authorize: &'a dyn AuthorizationCheck,
        principal: Option<UserId>,
        check_user: bool,
        referenced_ids: &'a HashSet<AttachmentId>,
    ) -> Self {
        Self {
            authorize,
            principal,
            check_user,
            referenced_ids,
        }
    }

    /// Deliberate administrative/public bypass: no principal and the
    /// enforcing flag disabled means everything is included.
    fn bypass(&self) -> bool {
        self.principal.is_none() && !self.check_user
    }

    /// Delegate a single capability check to the injected callback
    #[must_use]
    pub fn can_include(&self, object: AuthObject<'_>, capability: Capability) -> bool {
        if self.bypass() {
            return true;
        }
        self.authorize.allowed(self.principal, object, capability)
    }

    /// Whether traversal descends into `folder`.
    ///
    /// Hidden folders are always descended; their files are restricted
    /// individually so that independently referenced content stays
    /// reachable.
    #[must_use]
    pub fn includes_folder(&self, folder: &Folder) -> bool {
        if self.bypass() || folder.hidden {
            return true;
        }
        self.can_include(AuthObject::Folder(folder), Capability::ReadContents)
    }

    /// Whether `file` is emitted. `under_hidden` is true when any ancestor
    /// folder is hidden.
    #[must_use]
    pub fn includes_file(&self, file: &FileEntry, under_hidden: bool) -> bool {
        if !self.check_user {
            // All active files when no user is being checked
            return true;
        }
        if under_hidden || file.hidden {
            return self.referenced_ids.contains(&file.attachment.id)
                || self.can_include(AuthObject::File(file), Capability::ManageContents);
        }
        if file.locked {
            return self.can_include(AuthObject::File(file), Capability::ManageContents);
        }
        self.can_include(AuthObject::File(file), Capability::DownloadFile)
    }

    /// Whether the principal may download a bare attachment (used for
    /// rich-text references and submission attachments)
    #[must_use]
    pub fn can_download(&self, attachment: &Attachment) -> bool {
        self.can_include(AuthObject::Attachment(attachment), Capability::DownloadFile)
    }
}
