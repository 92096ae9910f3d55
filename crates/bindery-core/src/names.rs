//! Archive-safe name handling
//!
//! Turns arbitrary display names and titles into names that are safe inside
//! a ZIP archive, length-limited, and unique within one run.

use std::collections::HashSet;

/// Maximum byte length for an archive entry name
pub const MAX_NAME_BYTES: usize = 255;

/// Bytes kept free for a uniqueness suffix appended after shortening
const SUFFIX_HEADROOM: usize = 75;

/// Characters that are illegal in archive entry names
const ILLEGAL: &[char] = &['\0', '/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Replace characters illegal in the target filesystem/zip format with `_`
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL.contains(&c) { '_' } else { c })
        .collect()
}

/// Keep only ASCII word characters, stripping everything else.
///
/// Used for the archive's own top-level filename and for submission name
/// stems, not for per-entry names.
#[must_use]
pub fn sanitize_words_only(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Cap a name's byte length while preserving its extension.
///
/// When the name exceeds `max_bytes`, the stem is truncated so that the
/// result keeps headroom for a uniqueness suffix appended later. Never
/// splits inside a multi-byte character.
#[must_use]
pub fn shorten(name: &str, max_bytes: usize) -> String {
    if name.len() <= max_bytes {
        return name.to_string();
    }
    let (stem, ext) = split_extension(name);
    let budget = max_bytes
        .saturating_sub(SUFFIX_HEADROOM)
        .saturating_sub(ext.len());
    let cut = floor_char_boundary(stem, budget.min(stem.len()));
    format!("{}{ext}", &stem[..cut])
}

/// Already-used entry names for one archive run.
///
/// Every name written to the archive must be unique; the ZIP format itself
/// permits duplicates but this system forbids them.
#[derive(Debug, Default)]
pub struct DedupeRegistry {
    used: HashSet<String>,
}

impl DedupeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `candidate`, suffixing ` (1)`, ` (2)`, ... before the
    /// extension until the name is unique within this registry.
    pub fn dedupe(&mut self, candidate: &str) -> String {
        if self.used.insert(candidate.to_string()) {
            return candidate.to_string();
        }
        let (stem, ext) = split_extension(candidate);
        let mut n = 1u32;
        loop {
            let next = format!("{stem} ({n}){ext}");
            if self.used.insert(next.clone()) {
                return next;
            }
            n += 1;
        }
    }
}

/// Split a name into (stem, extension-with-dot).
///
/// A leading dot is part of the stem, not an extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
