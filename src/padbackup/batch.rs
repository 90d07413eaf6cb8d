//! Buffers fetched revisions and commits them in timestamp order.
//!
//! Revisions arrive pad by pad, so their timestamps interleave across pads.
//! Sorting before committing keeps the history chronological: each commit's
//! author date is the revision time, and those dates never move backwards
//! along the commit chain of one flush.

use crate::error::Result;
use crate::model::{AuthorDate, CommitMessage, PadId, PendingCommit, RevisionDescriptor};
use crate::store::{pad_filename, CommitOutcome, VersionedStore};
use tracing::debug;

/// Counts from one [`CommitBatch::flush`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub committed: usize,
    pub unchanged: usize,
}

impl FlushReport {
    pub fn merge(&mut self, other: FlushReport) {
        self.committed += other.committed;
        self.unchanged += other.unchanged;
    }
}

#[derive(Debug, Default)]
pub struct CommitBatch {
    pending: Vec<PendingCommit>,
}

impl CommitBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        timestamp: f64,
        revision: RevisionDescriptor,
        pad_id: PadId,
        content: Vec<u8>,
    ) {
        self.pending.push(PendingCommit {
            timestamp,
            revision,
            pad_id,
            content,
        });
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Commit everything buffered, oldest first, and empty the batch.
    ///
    /// The sort is stable, so equal timestamps commit in insertion order. On a
    /// store error the remaining entries are dropped; the next run refetches
    /// them because the watermark only reflects what was committed.
    pub fn flush<S: VersionedStore>(
        &mut self,
        store: &mut S,
        format: &str,
        utc_offset_minutes: i32,
    ) -> Result<FlushReport> {
        let mut pending = std::mem::take(&mut self.pending);
        pending.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));

        let mut report = FlushReport::default();
        for entry in pending {
            let path = pad_filename(&entry.pad_id, format)?;
            let message = CommitMessage::for_revision(&entry.revision).to_string();
            let date = AuthorDate::from_timestamp(entry.timestamp, utc_offset_minutes);
            match store.commit(&path, &entry.content, date, &message)? {
                CommitOutcome::Committed(id) => {
                    debug!(pad = %entry.pad_id, version = entry.revision.end_rev, %id, "committed revision");
                    report.committed += 1;
                }
                CommitOutcome::Unchanged => {
                    debug!(pad = %entry.pad_id, version = entry.revision.end_rev, "content unchanged, skipped");
                    report.unchanged += 1;
                }
            }
        }
        Ok(report)
    }
}
