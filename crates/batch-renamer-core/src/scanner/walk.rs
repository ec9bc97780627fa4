use crate::error::{Error, Result};
use crate::model::FileEntry;
use glob::Pattern;
use std::path::Path;
use tracing::{error, warn};
use walkdir::{DirEntry, WalkDir};

/// Lists rename candidates under `root`.
///
/// Only regular files are returned; symlinks and special files are skipped.
/// Unreadable directories and entries are logged and skipped without
/// aborting their siblings. Order is the order the directory listing
/// reports, not sorted.
pub fn enumerate(root: &Path, recursive: bool, ignore_globs: &[&str]) -> Result<Vec<FileEntry>> {
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let ignore_patterns: Vec<Pattern> = ignore_globs
        .iter()
        .filter_map(|glob| match Pattern::new(glob) {
            Ok(p) => Some(p),
            Err(e) => {
                error!("Invalid glob pattern '{}': {}", glob, e);
                None
            }
        })
        .collect();

    let mut walker = WalkDir::new(root).min_depth(1).follow_links(false);
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut entries = Vec::new();
    let iter = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e, &ignore_patterns));

    for entry_result in iter {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();
                warn!("Skipping unreadable entry {}: {}", path, err);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        if let Some(file_entry) = to_file_entry(root, &entry) {
            entries.push(file_entry);
        }
    }

    Ok(entries)
}

fn is_ignored(entry: &DirEntry, patterns: &[Pattern]) -> bool {
    patterns
        .iter()
        .any(|pattern| pattern.matches_path(entry.path()))
}

fn to_file_entry(root: &Path, entry: &DirEntry) -> Option<FileEntry> {
    let path = entry.path();
    let original_name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            warn!("Skipping file with non UTF-8 name: {}", path.display());
            return None;
        }
    };

    let relative_group = path
        .strip_prefix(root)
        .ok()
        .and_then(|rel| rel.parent())
        .map(|parent| {
            parent
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default();

    Some(FileEntry {
        absolute_path: path.to_path_buf(),
        original_name,
        relative_group,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_non_recursive_lists_only_direct_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.jpg"), "a").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("b.jpg"), "b").unwrap();

        let entries = enumerate(tmp.path(), false, &[]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "a.jpg");
        assert_eq!(entries[0].relative_group, "");
    }

    #[test]
    fn test_ignore_patterns_skip_matches() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("keep.mp4"), "k").unwrap();
        fs::write(tmp.path().join("skip.tmp"), "s").unwrap();

        let entries = enumerate(tmp.path(), false, &["*.tmp", "[invalid"]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "keep.mp4");
    }

    #[test]
    fn test_root_must_be_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        fs::write(&file, "x").unwrap();

        assert!(matches!(
            enumerate(&file, false, &[]),
            Err(Error::NotADirectory(_))
        ));
        assert!(matches!(
            enumerate(&tmp.path().join("missing"), true, &[]),
            Err(Error::NotADirectory(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_does_not_hide_siblings() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("a.txt"), "a").unwrap();
        fs::create_dir(tmp.path().join("open")).unwrap();
        fs::write(tmp.path().join("open").join("b.txt"), "b").unwrap();
        let locked = tmp.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.txt"), "h").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not apply to a privileged user.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = enumerate(tmp.path(), true, &[]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let mut names: Vec<String> = result
            .unwrap()
            .into_iter()
            .map(|e| e.original_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("real.txt"), "r").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("real.txt"), tmp.path().join("link.txt"))
            .unwrap();

        let entries = enumerate(tmp.path(), true, &[]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].original_name, "real.txt");
    }
}
