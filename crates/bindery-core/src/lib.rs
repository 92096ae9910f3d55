//! Bindery Core - bulk content export engine
//!
//! Turns a content context (assignment submissions, an e-portfolio, a
//! folder tree, or a quiz) into a single downloadable ZIP archive,
//! respecting per-object permissions, tolerating partial read failures,
//! and reporting incremental progress through a persisted export target
//! record that an external client polls.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archive;
pub mod collab;
pub mod collect;
pub mod error;
pub mod job;
pub mod model;
pub mod names;
pub mod permission;
pub mod progress;
pub mod source;
pub mod tree;

pub use archive::{ArchiveResult, Archiver};
pub use job::{run_export, RunContext};
pub use model::{ExportSource, ExportTarget, WorkflowState};
