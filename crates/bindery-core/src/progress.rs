//! Incremental progress reporting
//!
//! Recomputes the percent counter after each unit of work and persists the
//! target record only when the rounded value actually changes.

use crate::collab::ProgressSink;
use crate::error::ProgressError;
use crate::model::ExportTarget;

/// (index, total) counter bound to the run's target record.
///
/// The persisted percent is monotonically non-decreasing within a run and
/// reaches 100 only when the job marks the run successful.
pub struct ProgressTracker<'a> {
    target: &'a mut ExportTarget,
    sink: &'a mut dyn ProgressSink,
    total: usize,
    index: usize,
    last_persisted: u8,
}

impl<'a> ProgressTracker<'a> {
    pub fn new(target: &'a mut ExportTarget, sink: &'a mut dyn ProgressSink) -> Self {
        let last_persisted = target.percent;
        Self {
            target,
            sink,
            total: 0,
            index: 0,
            last_persisted,
        }
    }

    /// Set the denominator for the run's unit loop
    pub fn begin(&mut self, total: usize) {
        self.total = total;
        self.index = 0;
    }

    /// Record one completed unit of work.
    ///
    /// The persisted value is capped at 99: a run that ticks through its
    /// last unit may still fail, and 100 is written only by the success
    /// branch of the job.
    ///
    /// # Errors
    /// Returns an error if the sink fails to persist a changed percent
    pub fn tick(&mut self) -> Result<(), ProgressError> {
        if self.total == 0 {
            return Ok(());
        }
        self.index += 1;
        let pct = percent(self.index, self.total).min(99);
        if pct != self.last_persisted {
            self.target.percent = pct;
            self.sink.persist(self.target)?;
            self.last_persisted = pct;
        }
        Ok(())
    }
}

/// Rounded percent, capped at 100
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
#[allow(clippy::cast_precision_loss)]
fn percent(index: usize, total: usize) -> u8 {
    let pct = ((index as f64 / total as f64) * 100.0).round() as u8;
    pct.min(100)
}
