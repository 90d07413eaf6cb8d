//! # Storage Layer
//!
//! Backups land in an append-only, versioned store. The [`VersionedStore`]
//! trait is the whole contract the engine relies on: write a file as a new
//! commit, and read back the latest commit message (for the whole store or for
//! one file).
//!
//! ## Implementations
//!
//! - [`git::GitStore`]: one git repository per site, one file per pad.
//! - [`memory::MemStore`]: in-memory history for testing.
//!
//! ## Storage Format
//!
//! ```text
//! data/
//! ├── main/               # the unnamed site
//! │   ├── .git/
//! │   └── AbCdEf.html     # latest committed content of pad AbCdEf
//! └── team/
//!     ├── .git/
//!     └── XyZ.html
//! ```
//!
//! History is the only source of versioning: there is exactly one file per pad,
//! and every backed-up revision is a commit touching it.

use crate::error::{BackupError, Result};
use crate::model::{AuthorDate, PadId};

pub mod git;
pub mod memory;

/// What a commit attempt did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A new commit was recorded, identified by the store-specific id.
    Committed(String),
    /// The newest recorded version already held exactly this content; nothing was recorded.
    Unchanged,
}

/// Abstract interface for append-only history storage.
pub trait VersionedStore {
    /// Replace the file at `path` with `content` and record it as one commit.
    /// Identical content is a no-op returning [`CommitOutcome::Unchanged`].
    fn commit(
        &mut self,
        path: &str,
        content: &[u8],
        author_date: AuthorDate,
        message: &str,
    ) -> Result<CommitOutcome>;

    /// Message of the newest commit overall (`None`), or of the newest commit
    /// that touched `path`. `Ok(None)` when there is no such commit.
    fn last_commit_message(&self, path: Option<&str>) -> Result<Option<String>>;
}

/// Store-relative file name for a pad: `<padId>.<format>`.
pub fn pad_filename(pad_id: &PadId, format: &str) -> Result<String> {
    if pad_id.is_reserved() {
        return Err(BackupError::InvalidPadId(pad_id.as_str().to_string()));
    }
    Ok(format!("{}.{}", pad_id, format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_filename_uses_format_as_extension() {
        let id = PadId::new("AbC_1").unwrap();
        assert_eq!(pad_filename(&id, "html").unwrap(), "AbC_1.html");
        assert_eq!(pad_filename(&id, "md").unwrap(), "AbC_1.md");
    }

    #[test]
    fn pad_filename_refuses_reserved_ids() {
        for raw in [".git", "-rf", ".."] {
            let id = PadId::new(raw).unwrap();
            assert!(pad_filename(&id, "html").is_err());
        }
    }
}
