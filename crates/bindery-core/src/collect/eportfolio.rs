//! E-portfolio static page export
//!
//! Walks the portfolio's ordered entries, rewrites embedded rich-text file
//! references into a flat numbered attachment list, renders each page to
//! static HTML through the template collaborator, then emits the numbered
//! attachments and the fixed stylesheet/logo assets.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{json, Value};

use crate::archive::Archiver;
use crate::error::{RenderError, RunError};
use crate::job::RunContext;
use crate::model::{
    Attachment, AttachmentId, Eportfolio, EntrySection, StaticAttachmentRef, Submission,
    SubmissionId, SubmissionKind,
};
use crate::names::{self, MAX_NAME_BYTES};
use crate::permission::PermissionFilter;
use crate::progress::ProgressTracker;
use crate::source::{StoredFileSource, SynthesizedTextSource};

/// Embedded file-reference URLs in rich text, e.g. `/files/42/download`
fn file_link_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"/files/(\d+)(?:/[^\s"'<>]*)?"#).expect("static pattern compiles")
    })
}

/// Stream an e-portfolio into the archive: pages first, then numbered
/// attachments, then the two fixed assets
///
/// # Errors
/// Propagates render, archive-write and progress failures
pub fn collect(
    portfolio: &Eportfolio,
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
    let submissions_by_id: HashMap<SubmissionId, &Submission> = portfolio
        .submissions
        .iter()
        .map(|submission| (submission.id, submission))
        .collect();

    // Phase one: rewrite content and allocate the portfolio-wide
    // attachment index; nothing is written yet so the progress denominator
    // is known before the first tick.
    let mut allocator = RefAllocator::default();
    let mut pages: Vec<(String, Value)> = Vec::new();
    for entry in &portfolio.entries {
        let mut sections = Vec::new();
        for section in &entry.sections {
            match section {
                EntrySection::RichText { content } => {
                    let rewritten = rewrite_file_links(content, &filter, ctx, &mut allocator);
                    sections.push(json!({ "type": "rich_text", "content": rewritten }));
                }
                EntrySection::Attachment { attachment_id } => {
                    let filename = ctx
                        .attachments
                        .find(*attachment_id)
                        .filter(|attachment| filter.can_download(attachment))
                        .map(|attachment| allocator.allocate(&attachment));
                    sections.push(json!({ "type": "attachment", "filename": filename }));
                }
                EntrySection::Submission { submission_id } => {
                    if let Some(submission) = submissions_by_id.get(submission_id) {
                        collect_submission_attachments(submission, &filter, ctx, &mut allocator);
                    }
                    sections.push(json!({ "type": "submission", "submission_id": submission_id }));
                }
            }
        }
        let filename = format!(
            "{}.html",
            names::shorten(&names::sanitize_filename(&entry.full_slug), MAX_NAME_BYTES)
        );
        pages.push((filename, json!({ "name": entry.name, "sections": sections })));
    }

    let submissions_value = submission_locals(portfolio)?;

    // Phase two: pages, then attachments, then the two fixed assets.
    progress.begin(pages.len() + allocator.refs.len() + 2);
    for (filename, mut locals) in pages {
        locals["submissions"] = submissions_value.clone();
        let bytes = ctx.templates.render("eportfolio_page", &locals)?;
        let source = SynthesizedTextSource::html(filename.clone(), bytes);
        archiver.add(&[], &filename, &source)?;
        progress.tick()?;
    }
    for static_ref in &allocator.refs {
        let source = StoredFileSource::new(&static_ref.attachment, ctx.attachments);
        archiver.add(&[], &static_ref.filename(), &source)?;
        progress.tick()?;
    }
    let stylesheet =
        SynthesizedTextSource::new("eportfolio.css", "text/css", ctx.assets.stylesheet());
    archiver.add(&[], "eportfolio.css", &stylesheet)?;
    progress.tick()?;
    let logo = SynthesizedTextSource::new("logo.svg", "image/svg+xml", ctx.assets.logo());
    archiver.add(&[], "logo.svg", &logo)?;
    progress.tick()?;

    Ok(())
}

/// Index-prefixed attachment references, deduplicated by attachment id and
/// numbered in a single sequence shared across all entries
#[derive(Default)]
struct RefAllocator {
    refs: Vec<StaticAttachmentRef>,
    by_id: HashMap<AttachmentId, usize>,
}

impl RefAllocator {
    /// Allocate (or reuse) the index for `attachment`, returning the
    /// archive filename the reference resolves to
    fn allocate(&mut self, attachment: &Attachment) -> String {
        let index = match self.by_id.get(&attachment.id) {
            Some(&index) => index,
            None => {
                let index = self.refs.len() + 1;
                self.refs.push(StaticAttachmentRef {
                    index,
                    attachment: attachment.clone(),
                });
                self.by_id.insert(attachment.id, index);
                index
            }
        };
        self.refs[index - 1].filename()
    }
}

fn rewrite_file_links(
    content: &str,
    filter: &PermissionFilter<'_>,
    ctx: &RunContext<'_>,
    allocator: &mut RefAllocator,
) -> String {
    file_link_pattern()
        .replace_all(content, |caps: &Captures<'_>| {
            let resolved = caps[1]
                .parse::<AttachmentId>()
                .ok()
                .and_then(|id| ctx.attachments.find(id));
            match resolved {
                Some(attachment) if filter.can_download(&attachment) => {
                    allocator.allocate(&attachment)
                }
                // Unresolvable or forbidden references stay as written; a
                // broken link in the static page is acceptable degraded
                // behavior and must not fail the run.
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Attachments uploaded with an entry's associated submission
fn collect_submission_attachments(
    submission: &Submission,
    filter: &PermissionFilter<'_>,
    ctx: &RunContext<'_>,
    allocator: &mut RefAllocator,
) {
    let SubmissionKind::OnlineUpload { attachment_ids } = &submission.kind else {
        return;
    };
    for id in attachment_ids {
        if let Some(attachment) = ctx.attachments.find(*id) {
            if filter.can_download(&attachment) {
                allocator.allocate(&attachment);
            }
        }
    }
}

/// The full `{submission id -> submission}` map handed to every page
/// template so it can render submission summaries
fn submission_locals(portfolio: &Eportfolio) -> Result<Value, RenderError> {
    let mut map = serde_json::Map::new();
    for submission in &portfolio.submissions {
        let value =
            serde_json::to_value(submission).map_err(|e| RenderError(e.to_string()))?;
        map.insert(submission.id.to_string(), value);
    }
    Ok(Value::Object(map))
}
