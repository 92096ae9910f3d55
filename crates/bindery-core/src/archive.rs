//! ZIP archive assembly with dedupe and partial-failure tolerance
//!
//! The archiver owns the output handle for one run. Candidates that fail to
//! open are logged and skipped; the run only fails outright when every
//! offered candidate failed.

use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use chrono::{Datelike, FixedOffset, Timelike, Utc};
use tracing::{debug, warn};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::error::RunError;
use crate::names::{self, DedupeRegistry, MAX_NAME_BYTES};
use crate::source::AttachmentSource;

/// Outcome of a finalized archive run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveResult {
    /// True iff at least one entry was added, or no candidates were ever
    /// offered (an empty archive with zero failures is a valid result)
    pub success: bool,
    pub processed: usize,
    pub failed: usize,
}

/// Writes (name, byte-stream) pairs into one ZIP archive
pub struct Archiver {
    writer: ZipWriter<File>,
    registry: DedupeRegistry,
    scratch_dir: PathBuf,
    tz_offset: FixedOffset,
    offered: usize,
    processed: usize,
    failed: usize,
}

impl Archiver {
    /// Create an archiver writing to `path`, staging entry bytes under
    /// `scratch_dir` (normally the run's temp directory).
    ///
    /// # Errors
    /// Returns an error if the archive file cannot be created
    pub fn create(
        path: &Path,
        scratch_dir: &Path,
        tz_offset: FixedOffset,
    ) -> Result<Self, RunError> {
        let file = File::create(path)?;
        Ok(Self {
            writer: ZipWriter::new(file),
            registry: DedupeRegistry::new(),
            scratch_dir: scratch_dir.to_path_buf(),
            tz_offset,
            offered: 0,
            processed: 0,
            failed: 0,
        })
    }

    /// Add one candidate under `dir` (forward-slash joined inside the
    /// archive). Returns `Ok(false)` when the source failed to open; the
    /// entry is skipped and the run continues.
    ///
    /// # Errors
    /// Returns an error on archive-write failures, which abort the run
    pub fn add(
        &mut self,
        dir: &[String],
        name_hint: &str,
        source: &dyn AttachmentSource,
    ) -> Result<bool, RunError> {
        self.offered += 1;

        let safe = names::shorten(&names::sanitize_filename(name_hint), MAX_NAME_BYTES);
        let mut full = dir.join("/");
        if !full.is_empty() {
            full.push('/');
        }
        full.push_str(&safe);
        let unique = self.registry.dedupe(&full);

        let mut reader = match source.open() {
            Ok(reader) => reader,
            Err(e) => {
                warn!(name = %unique, error = %e, "skipping unreadable entry");
                self.failed += 1;
                return Ok(false);
            }
        };

        // Stage through a scratch file so a source that dies mid-read never
        // leaves a truncated entry in the archive. The temp file is removed
        // on drop, on every path.
        let mut staged = tempfile::NamedTempFile::new_in(&self.scratch_dir)?;
        if let Err(e) = io::copy(&mut reader, staged.as_file_mut()) {
            warn!(name = %unique, error = %e, "skipping entry that failed mid-read");
            self.failed += 1;
            return Ok(false);
        }
        drop(reader);

        let options = FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated)
            .last_modified_time(self.entry_timestamp());
        self.writer.start_file(unique.clone(), options)?;
        let staged_file = staged.as_file_mut();
        staged_file.seek(SeekFrom::Start(0))?;
        io::copy(staged_file, &mut self.writer)?;

        debug!(name = %unique, content_type = source.content_type(), "archived entry");
        self.processed += 1;
        Ok(true)
    }

    /// Close the archive handle and report the run's outcome.
    ///
    /// # Errors
    /// Returns an error if the central directory cannot be written
    pub fn finalize(mut self) -> Result<ArchiveResult, RunError> {
        self.writer.finish()?;
        Ok(ArchiveResult {
            success: self.processed > 0 || self.offered == 0,
            processed: self.processed,
            failed: self.failed,
        })
    }

    /// Entry timestamp in the acting user's timezone (or the server
    /// default the caller resolved)
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn entry_timestamp(&self) -> zip::DateTime {
        let now = Utc::now().with_timezone(&self.tz_offset);
        zip::DateTime::from_date_and_time(
            now.year() as u16,
            now.month() as u8,
            now.day() as u8,
            now.hour() as u8,
            now.minute() as u8,
            now.second() as u8,
        )
        .unwrap_or_default()
    }
}
