//! Which remote revisions are new and safe to back up.

use crate::model::RevisionDescriptor;

pub const DEFAULT_RACE_WINDOW_SECS: f64 = 60.0;

/// Decides whether `revision` should be committed in a run that started at
/// `now` (epoch seconds).
///
/// Revisions at or below the last committed version are already captured
/// (this includes `endRev == 0`, a pad that was created but never edited).
/// Revisions inside the trailing race window may still be finalized by the
/// service and are left for a later run.
pub fn is_applicable(
    last_committed_version: u64,
    revision: &RevisionDescriptor,
    now: f64,
    race_window_secs: f64,
) -> bool {
    if revision.end_rev <= last_committed_version {
        return false;
    }
    revision.timestamp <= now - race_window_secs
}
