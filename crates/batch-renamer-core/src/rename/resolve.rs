use crate::error::{Error, Result};
use crate::model::{FileEntry, ResolvedRename};
use std::fs;
use std::path::{Path, PathBuf};

/// Characters that are illegal in a file name on at least one supported platform.
const ILLEGAL_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Suffix attempts (`_1` .. `_10`) before a collision is reported as a failure.
pub const MAX_COLLISION_ATTEMPTS: u32 = 10;

/// Leaves room for a collision suffix under the usual 255-byte name limit.
const MAX_NAME_BYTES: usize = 240;

/// Longest candidate suffix still treated as an extension, e.g. `jpeg`, `flac`.
const MAX_EXTENSION_LEN: usize = 10;

pub const REASON_EMPTY: &str = "empty after sanitization";
pub const REASON_NOOP: &str = "no-op";

/// Turns a raw candidate into an extension-consistent, filesystem-legal
/// name for `entry`. Collisions are not checked here; see
/// [`resolve_destination`].
pub fn resolve(entry: &FileEntry, raw_name: &str) -> ResolvedRename {
    let sanitized = sanitize(raw_name);
    if sanitized.is_empty() {
        return ResolvedRename::skip(entry.clone(), REASON_EMPTY);
    }

    let original_ext = extension_of(&entry.original_name);
    let split = match candidate_extension(&sanitized) {
        // A lone `.name` is only a bare extension when the original has one.
        Some(("", _)) if original_ext.is_none() => None,
        split => split,
    };
    let (stem, ext) = match split {
        // Same extension, keep the candidate's spelling.
        Some((stem, ext)) if original_ext.is_some_and(|o| o.eq_ignore_ascii_case(ext)) => {
            (stem, Some(ext))
        }
        Some((stem, _)) => (stem, original_ext),
        None => (sanitized.as_str(), original_ext),
    };
    let stem = truncate_to_bytes(trim_name_end(stem), MAX_NAME_BYTES);
    if stem.is_empty() {
        return ResolvedRename::skip(entry.clone(), REASON_EMPTY);
    }
    let final_name = with_extension(stem, ext);

    if final_name == entry.original_name {
        return ResolvedRename::skip(entry.clone(), REASON_NOOP);
    }

    ResolvedRename {
        entry: entry.clone(),
        final_name,
        skipped: false,
        skip_reason: None,
    }
}

/// Picks the destination path for `resolved` against what is on disk right
/// now, appending `_1`, `_2`, ... before the extension while the name is
/// taken.
pub fn resolve_destination(resolved: &ResolvedRename) -> Result<PathBuf> {
    let dir = resolved
        .entry
        .absolute_path
        .parent()
        .unwrap_or_else(|| Path::new(""));
    let target = dir.join(&resolved.final_name);
    if !occupied(&target) {
        return Ok(target);
    }

    let ext = extension_of(&resolved.entry.original_name);
    let stem = match ext {
        Some(ext) => resolved
            .final_name
            .get(..resolved.final_name.len() - ext.len() - 1)
            .unwrap_or(&resolved.final_name),
        None => resolved.final_name.as_str(),
    };
    let ext = match ext {
        // Keep the extension as spelled in the final name.
        Some(ext) => resolved
            .final_name
            .get(resolved.final_name.len() - ext.len()..),
        None => None,
    };

    for counter in 1..=MAX_COLLISION_ATTEMPTS {
        let candidate = dir.join(with_extension(&format!("{}_{}", stem, counter), ext));
        if !occupied(&candidate) {
            return Ok(candidate);
        }
    }

    Err(Error::Collision {
        target,
        attempts: MAX_COLLISION_ATTEMPTS,
    })
}

/// Removes illegal and control characters, surrounding whitespace and
/// trailing dots.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();
    trim_name_end(cleaned.trim_start()).to_string()
}

fn trim_name_end(name: &str) -> &str {
    name.trim_end_matches(|c: char| c.is_whitespace() || c == '.')
}

/// The text after the last dot, ignoring leading dots (`.bashrc` has none).
fn extension_of(name: &str) -> Option<&str> {
    let body = name.trim_start_matches('.');
    let dot = body.rfind('.')?;
    let ext = &body[dot + 1..];
    if ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Splits a candidate into `(stem, extension)` when its last dot is followed
/// by something that looks like an extension. `Dr. Smith` has none, `.mp4`
/// is an empty stem with an extension.
fn candidate_extension(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some((&name[..dot], ext))
}

fn with_extension(stem: &str, ext: Option<&str>) -> String {
    match ext {
        Some(ext) => format!("{}.{}", stem, ext),
        None => stem.to_string(),
    }
}

fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    trim_name_end(&s[..end])
}

/// Dangling symlinks count as occupied.
fn occupied(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
