//! How far a site has been backed up, read back from commit history.
//!
//! There is no state file. The newest commit message in the store carries the
//! timestamp of the last backed-up revision, and the newest commit on a pad's
//! file carries that pad's version. A message that exists but cannot be parsed
//! means the history was edited by hand or is corrupt, and is an error.

use crate::error::Result;
use crate::model::{CommitMessage, PadId};
use crate::store::{pad_filename, VersionedStore};

pub struct Watermarks<'a, S: VersionedStore> {
    store: &'a S,
    format: &'a str,
}

impl<'a, S: VersionedStore> Watermarks<'a, S> {
    pub fn new(store: &'a S, format: &'a str) -> Self {
        Self { store, format }
    }

    /// Timestamp of the newest committed revision, 0 for an empty store.
    pub fn last_backup_time(&self) -> Result<f64> {
        match self.store.last_commit_message(None)? {
            Some(message) => CommitMessage::parse_timestamp(&message),
            None => Ok(0.0),
        }
    }

    /// Version of the newest committed revision of `pad_id`, 0 if never seen.
    pub fn last_committed_version(&self, pad_id: &PadId) -> Result<u64> {
        let path = pad_filename(pad_id, self.format)?;
        match self.store.last_commit_message(Some(&path))? {
            Some(message) => CommitMessage::parse_version(&message),
            None => Ok(0),
        }
    }

    /// The full newest commit message, if any.
    pub fn last_commit(&self) -> Result<Option<CommitMessage>> {
        self.store
            .last_commit_message(None)?
            .map(|message| CommitMessage::parse(&message))
            .transpose()
    }
}
