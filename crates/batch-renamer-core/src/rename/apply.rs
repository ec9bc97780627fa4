use crate::model::{RenameOutcome, ResolvedRename};
use crate::rename::resolve::resolve_destination;
use std::fs;
use tracing::{info, warn};

/// Applies one resolved rename. Never returns an error: anything that goes
/// wrong for this file is reported as [`RenameOutcome::Failed`] so the rest
/// of the batch carries on.
///
/// The destination is picked against the filesystem as it is right now,
/// so earlier renames in the same batch are taken into account. The rename
/// is check-then-rename; a file appearing in between is a best-effort race.
pub fn apply(resolved: &ResolvedRename, dry_run: bool) -> RenameOutcome {
    let source = resolved.entry.absolute_path.clone();

    if resolved.skipped {
        let reason = resolved
            .skip_reason
            .clone()
            .unwrap_or_else(|| "skipped".to_string());
        info!("Skipping {}: {}", resolved.entry.display_name(), reason);
        return RenameOutcome::Skipped {
            path: source,
            reason,
        };
    }

    let destination = match resolve_destination(resolved) {
        Ok(destination) => destination,
        Err(err) => {
            warn!(
                "Not renaming {} -> {}: {}",
                resolved.entry.display_name(),
                resolved.final_name,
                err
            );
            return RenameOutcome::Failed {
                path: source,
                reason: err.to_string(),
            };
        }
    };

    if dry_run {
        info!("Would rename {} -> {}", source.display(), destination.display());
        return RenameOutcome::Planned {
            from: source,
            to: destination,
        };
    }

    match fs::rename(&source, &destination) {
        Ok(()) => {
            info!("Renamed {} -> {}", source.display(), destination.display());
            RenameOutcome::Renamed {
                from: source,
                to: destination,
            }
        }
        Err(err) => {
            warn!(
                "Rename failed {} -> {}: {}",
                source.display(),
                destination.display(),
                err
            );
            RenameOutcome::Failed {
                reason: format!("rename to {} failed: {}", destination.display(), err),
                path: source,
            }
        }
    }
}
