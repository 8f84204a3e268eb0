//! Event filtering for candidate archives
//!
//! The watcher reports every filesystem event under the root; this module
//! decides which of them actually name a zip archive worth extracting. Only
//! two event kinds qualify: a file closed after being written, and a file
//! moved into the tree. Plain creates and in-progress modifications are
//! rejected because the file may still be incomplete; removals and directory
//! events are never candidates.

use crate::error::Result;
use notify::event::{AccessKind, AccessMode, EventKind, ModifyKind, RenameMode};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filters raw filesystem events down to extractable archive paths
pub struct EventFilter {
    /// Compiled exclusion patterns, matched anywhere in the full path
    exclude: Vec<Regex>,
}

impl EventFilter {
    /// Compile the exclusion patterns into a filter
    ///
    /// # Errors
    /// Returns an error if any pattern is not a valid regex.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let exclude = patterns
            .iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { exclude })
    }

    /// Return the event's paths that should be enqueued for extraction
    pub fn accept(&self, event: &notify::Event) -> Vec<PathBuf> {
        if !Self::is_candidate_kind(&event.kind) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter(|path| self.accept_path(path))
            .cloned()
            .collect()
    }

    /// Check whether a single candidate path passes the filter
    pub fn accept_path(&self, path: &Path) -> bool {
        if self.is_excluded(path) {
            debug!(path = %path.display(), "path matches exclusion pattern, ignoring");
            return false;
        }
        is_zip_file(path)
    }

    /// Event kinds that signal a finished file: close-after-write and moved-in
    fn is_candidate_kind(kind: &EventKind) -> bool {
        matches!(
            kind,
            EventKind::Access(AccessKind::Close(AccessMode::Write))
                | EventKind::Modify(ModifyKind::Name(RenameMode::To))
        )
    }

    /// Check the full path against the exclusion patterns (contains-a-match)
    fn is_excluded(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy();
        self.exclude.iter().any(|re| re.is_match(&path_str))
    }
}

/// Check if a path names a zip file (case-insensitive extension)
fn is_zip_file(path: &Path) -> bool {
    let has_name = path
        .file_name()
        .map(|name| !name.is_empty())
        .unwrap_or(false);
    if !has_name {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}
