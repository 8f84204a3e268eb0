//! Zip archive extraction with filename-encoding recovery
//!
//! An archive is always extracted next to its source file. Where it lands
//! depends on its shape: a "self-rooted" archive (every member under one
//! top-level directory) unpacks straight into the archive's containing
//! directory, recreating that single root; anything else gets a directory
//! named after the archive's file stem so loose members never spill into the
//! watched tree.
//!
//! Member names whose UTF-8 flag is unset go through the
//! [decoder](crate::encoding) before anything touches the filesystem.

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::encoding::decode_filename;
use crate::error::{ExtractionError, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Decide the destination directory for an archive
///
/// Computes the set of top-level path segments across all (decoded) member
/// names. Exactly one distinct segment means the archive carries its own
/// root, so the target is simply the archive's containing directory.
/// Otherwise the target is the containing directory joined with the
/// archive's file stem. The returned directory need not exist; creating it
/// is [`ArchiveExtractor`]'s job.
pub fn resolve_target(archive_path: &Path, member_names: &[String]) -> PathBuf {
    let parent = archive_path.parent().unwrap_or(Path::new("")).to_path_buf();

    let top_segments: HashSet<&str> = member_names
        .iter()
        .filter_map(|name| name.split(['/', '\\']).find(|s| !s.is_empty()))
        .collect();

    if top_segments.len() == 1 {
        parent
    } else {
        match archive_path.file_stem() {
            Some(stem) => parent.join(stem),
            None => parent,
        }
    }
}

/// Turn a decoded member name into a safe path relative to the target
///
/// Reimplements the zip crate's `enclosed_name` check over the *decoded*
/// name: absolute names and names containing `..` are rejected, `.` and
/// empty segments are dropped.
fn sanitized_relative(name: &str) -> Option<PathBuf> {
    if name.starts_with(['/', '\\']) {
        return None;
    }
    let mut relative = PathBuf::new();
    for segment in name.split(['/', '\\']) {
        match segment {
            "" | "." => continue,
            ".." => return None,
            segment => relative.push(segment),
        }
    }
    if relative.as_os_str().is_empty() {
        None
    } else {
        Some(relative)
    }
}

/// Archive extractor for watched zip files
pub struct ArchiveExtractor;

impl ArchiveExtractor {
    /// Extract an archive next to its source file
    ///
    /// An archive that vanished between enqueue and processing (moved or
    /// deleted) is a silent no-op, not an error. Any other failure surfaces
    /// as a single per-archive [`ExtractionError`]; members already written
    /// stay on disk (no rollback).
    pub fn extract(archive_path: &Path) -> Result<()> {
        let file = match File::open(archive_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(archive = %archive_path.display(), "archive vanished before extraction, skipping");
                return Ok(());
            }
            Err(e) => {
                return Err(ExtractionError::ArchiveUnreadable {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to open archive: {e}"),
                }
                .into());
            }
        };

        let mut archive =
            zip::ZipArchive::new(file).map_err(|e| ExtractionError::ArchiveUnreadable {
                archive: archive_path.to_path_buf(),
                reason: format!("failed to read zip archive: {e}"),
            })?;

        info!(archive = %archive_path.display(), members = archive.len(), "unpacking archive");

        // Decode every member name up front so the target can be resolved
        // once, before any member is written.
        let mut names = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let entry = archive
                .by_index_raw(index)
                .map_err(|e| ExtractionError::ArchiveUnreadable {
                    archive: archive_path.to_path_buf(),
                    reason: format!("failed to read entry {index}: {e}"),
                })?;
            names.push(decoded_entry_name(&entry));
        }

        let target = resolve_target(archive_path, &names);
        info!(target = %target.display(), "resolved extraction target");

        for (index, name) in names.iter().enumerate() {
            let mut entry =
                archive
                    .by_index(index)
                    .map_err(|e| ExtractionError::ArchiveUnreadable {
                        archive: archive_path.to_path_buf(),
                        reason: format!("failed to read entry {index}: {e}"),
                    })?;
            write_member(&mut entry, name, &target, archive_path)?;
        }

        Ok(())
    }
}

/// Decode one entry's name, repairing the encoding when UTF-8 was not declared
///
/// zip 0.6 does not expose the general-purpose flag bits, but its own decode
/// of the stored name reveals them: the crate decodes UTF-8-flagged names as
/// UTF-8 and everything else as cp437, so the decoded name round-trips to the
/// raw bytes exactly when the entry was stored as UTF-8 (or is pure ASCII,
/// where every decoding agrees).
fn decoded_entry_name(entry: &zip::read::ZipFile<'_>) -> String {
    let raw = entry.name_raw();
    if entry.name().as_bytes() == raw {
        entry.name().to_string()
    } else {
        decode_filename(raw, false)
    }
}

/// Write a single member under the target directory
fn write_member(
    entry: &mut zip::read::ZipFile<'_>,
    name: &str,
    target: &Path,
    archive_path: &Path,
) -> Result<()> {
    let Some(relative) = sanitized_relative(name) else {
        warn!(member = name, "skipping member with unsafe path");
        return Ok(());
    };
    let dest = target.join(relative);

    let member_write_err = |source: std::io::Error| ExtractionError::MemberWrite {
        archive: archive_path.to_path_buf(),
        member: name.to_string(),
        source,
    };

    if entry.is_dir() || name.ends_with(['/', '\\']) {
        std::fs::create_dir_all(&dest).map_err(member_write_err)?;
        return Ok(());
    }

    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(member_write_err)?;
    }

    info!(member = name, "writing member");
    let mut outfile = File::create(&dest).map_err(member_write_err)?;
    std::io::copy(entry, &mut outfile).map_err(member_write_err)?;

    #[cfg(unix)]
    if let Some(mode) = entry.unix_mode() {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) = std::fs::set_permissions(&dest, std::fs::Permissions::from_mode(mode)) {
            warn!(member = name, error = %e, "could not restore member permissions");
        }
    }

    Ok(())
}
