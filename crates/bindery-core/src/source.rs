//! Byte sources feeding the archive
//!
//! Real stored files and synthesized pseudo-files (rendered HTML) are
//! treated uniformly by the archiver through one trait.

use std::io::{Cursor, Read};

use crate::collab::AttachmentStore;
use crate::error::OpenError;
use crate::model::Attachment;

/// A readable binary blob with metadata, size unknown until read
pub trait AttachmentSource {
    fn display_name(&self) -> &str;

    fn content_type(&self) -> &str;

    fn size_hint(&self) -> Option<u64>;

    /// # Errors
    /// Returns an error if the underlying bytes cannot be opened; the
    /// archiver skips the entry and continues
    fn open(&self) -> Result<Box<dyn Read + '_>, OpenError>;
}

/// A real stored blob, opened through the attachment store collaborator
pub struct StoredFileSource<'a> {
    attachment: &'a Attachment,
    store: &'a dyn AttachmentStore,
}

impl<'a> StoredFileSource<'a> {
    #[must_use]
    pub fn new(attachment: &'a Attachment, store: &'a dyn AttachmentStore) -> Self {
        Self { attachment, store }
    }
}

impl AttachmentSource for StoredFileSource<'_> {
    fn display_name(&self) -> &str {
        &self.attachment.display_name
    }

    fn content_type(&self) -> &str {
        &self.attachment.content_type
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.attachment.size)
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, OpenError> {
        self.store.open(self.attachment)
    }
}

/// In-memory bytes, typically rendered HTML for a text/URL submission or
/// an e-portfolio page
pub struct SynthesizedTextSource {
    name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl SynthesizedTextSource {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    #[must_use]
    pub fn html(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::new(name, "text/html", bytes)
    }
}

impl AttachmentSource for SynthesizedTextSource {
    fn display_name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size_hint(&self) -> Option<u64> {
        Some(self.bytes.len() as u64)
    }

    fn open(&self) -> Result<Box<dyn Read + '_>, OpenError> {
        Ok(Box::new(Cursor::new(self.bytes.as_slice())))
    }
}
