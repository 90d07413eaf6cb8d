//! One sync pass over a site.
//!
//! ```text
//! ResolvingWatermark → ListingChangedPads
//!   → per pad: ListingRevisions → FilteringRevisions → FetchingContent → Accumulating
//!   → Flushing → Done
//! ```
//!
//! Any error from the service or the store aborts the pass. Nothing about the
//! pass is persisted except the commits themselves, so a failed pass is always
//! safe to rerun.

use super::{CmdMessage, SiteReport};
use crate::batch::CommitBatch;
use crate::client::{Listing, PadService};
use crate::error::Result;
use crate::filter::{is_applicable, DEFAULT_RACE_WINDOW_SECS};
use crate::model::{PadId, SiteName};
use crate::store::VersionedStore;
use crate::watermark::Watermarks;
use std::time::Duration;
use tracing::{debug, info, warn};

/// When buffered revisions are committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushMode {
    /// One flush once every pad is fetched: a single, globally time-sorted history, but
    /// an interrupted run persists nothing.
    EndOfRun,
    /// "Out of order" mode: rescan from time 0 and flush after each pad, so
    /// history is only time-sorted within a pad.
    PerPad,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackupOptions {
    pub format: String,
    pub race_window_secs: f64,
    /// Pause after each content fetch, for the service's rate limits.
    pub delay: Duration,
    pub flush: FlushMode,
    pub utc_offset_minutes: i32,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            format: "html".to_string(),
            race_window_secs: DEFAULT_RACE_WINDOW_SECS,
            delay: Duration::from_secs(1),
            flush: FlushMode::EndOfRun,
            utc_offset_minutes: 480,
        }
    }
}

pub fn run<C: PadService, S: VersionedStore>(
    client: &C,
    store: &mut S,
    site: &SiteName,
    opts: &BackupOptions,
    now: f64,
) -> Result<SiteReport> {
    let mut report = SiteReport::new(site.clone());

    report.watermark = match opts.flush {
        FlushMode::PerPad => 0.0,
        FlushMode::EndOfRun => Watermarks::new(&*store, &opts.format).last_backup_time()?,
    };
    info!(%site, watermark = report.watermark, "listing pads changed since watermark");

    let raw_ids = match client.list_updated_pad_ids(report.watermark)? {
        Listing::Ok(ids) => ids,
        Listing::Failed(error) => {
            warn!(%site, %error, "listing updated pads failed, listing all pads instead");
            report.used_fallback = true;
            report.add_message(CmdMessage::warning(format!(
                "Updated-pad listing failed ({}), backed up from the full pad list",
                error
            )));
            client.list_all_pad_ids()?
        }
    };

    // Validate the whole batch before touching any pad.
    let pad_ids = raw_ids
        .into_iter()
        .map(PadId::new)
        .collect::<Result<Vec<_>>>()?;
    report.pads_listed = pad_ids.len();

    let mut batch = CommitBatch::new();
    for pad_id in &pad_ids {
        if pad_id.is_reserved() {
            warn!(%site, pad = %pad_id, "skipping pad with reserved id");
            report.pads_skipped.push(pad_id.to_string());
            report.add_message(CmdMessage::warning(format!(
                "Skipped pad with unsafe id: {}",
                pad_id
            )));
            continue;
        }

        let accepted = collect_pad(client, &*store, pad_id, opts, now, &mut batch)?;
        if accepted > 0 {
            report.pads_changed += 1;
            report.revisions_fetched += accepted;
        }

        if opts.flush == FlushMode::PerPad {
            report
                .flushed
                .merge(batch.flush(store, &opts.format, opts.utc_offset_minutes)?);
        }
    }

    report
        .flushed
        .merge(batch.flush(store, &opts.format, opts.utc_offset_minutes)?);

    info!(
        %site,
        pads = report.pads_listed,
        committed = report.flushed.committed,
        unchanged = report.flushed.unchanged,
        "site backup finished"
    );
    if report.flushed.committed > 0 {
        report.add_message(CmdMessage::success(format!(
            "{}: committed {} revision(s) across {} pad(s)",
            site, report.flushed.committed, report.pads_changed
        )));
    } else {
        report.add_message(CmdMessage::info(format!("{}: up to date", site)));
    }
    Ok(report)
}

/// Fetch every applicable revision of one pad into `batch`. Returns how many
/// were accepted.
fn collect_pad<C: PadService, S: VersionedStore>(
    client: &C,
    store: &S,
    pad_id: &PadId,
    opts: &BackupOptions,
    now: f64,
    batch: &mut CommitBatch,
) -> Result<usize> {
    let last_version = Watermarks::new(store, &opts.format).last_committed_version(pad_id)?;
    debug!(pad = %pad_id, last_version, "listing revisions");

    let mut accepted = 0;
    for revision in client.list_revisions(pad_id)? {
        if !is_applicable(last_version, &revision, now, opts.race_window_secs) {
            continue;
        }
        debug!(
            pad = %pad_id,
            start = revision.start_rev,
            end = revision.end_rev,
            timestamp = revision.timestamp,
            "fetching revision"
        );
        let content = client.get_content(pad_id, revision.end_rev, &opts.format)?;
        batch.add(revision.timestamp, revision, pad_id.clone(), content);
        accepted += 1;

        if !opts.delay.is_zero() {
            std::thread::sleep(opts.delay);
        }
    }
    Ok(accepted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::memory::MemService;
    use crate::error::BackupError;
    use crate::model::{CommitMessage, RevisionDescriptor};
    use crate::store::memory::MemStore;

    const NOW: f64 = 2_000_000_000.0;

    fn opts() -> BackupOptions {
        BackupOptions {
            delay: Duration::ZERO,
            utc_offset_minutes: 0,
            ..Default::default()
        }
    }

    fn rev(start: u64, end: u64, timestamp: f64, author: &str) -> RevisionDescriptor {
        RevisionDescriptor::new(start, end, timestamp, &[author])
    }

    fn site() -> SiteName {
        SiteName::main()
    }

    #[test]
    fn first_run_commits_single_revision() {
        let service = MemService::new();
        service.add_revision("abc", rev(0, 5, 1_000_000_000.0, "Ann"), b"<p>hi</p>");
        let mut store = MemStore::new();

        let report = run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        assert_eq!(report.flushed.committed, 1);
        let commits = store.commits();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].path, "abc.html");
        assert_eq!(
            commits[0].message,
            "timestamp 1000000000\nversion 5\nauthors Ann\n"
        );
        assert_eq!(commits[0].content, b"<p>hi</p>");
        assert_eq!(commits[0].author_date.seconds, 1_000_000_000);
    }

    #[test]
    fn second_run_is_idempotent() {
        let service = MemService::new();
        service.add_revision("abc", rev(0, 5, 1_000_000_000.0, "Ann"), b"<p>hi</p>");
        let mut store = MemStore::new();

        run(&service, &mut store, &site(), &opts(), NOW).unwrap();
        service.clear_calls();
        let report = run(&service, &mut store, &site(), &opts(), NOW + 10.0).unwrap();

        assert_eq!(report.flushed.committed, 0);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(report.watermark, 1_000_000_000.0);
        assert!(!service.calls().iter().any(|c| c.starts_with("content")));
        assert_eq!(
            Watermarks::new(&store, "html")
                .last_committed_version(&PadId::new("abc").unwrap())
                .unwrap(),
            5
        );
    }

    #[test]
    fn commits_are_sorted_across_pads() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 300.0, "A"), b"a1");
        service.add_revision("b", rev(0, 1, 100.0, "B"), b"b1");
        service.add_revision("c", rev(0, 1, 200.0, "C"), b"c1");
        let mut store = MemStore::new();

        run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        let times: Vec<i64> = store
            .commits()
            .iter()
            .map(|c| c.author_date.seconds)
            .collect();
        assert_eq!(times, vec![100, 200, 300]);
    }

    #[test]
    fn race_window_defers_recent_revisions() {
        let service = MemService::new();
        service.add_revision("p", rev(0, 1, NOW - 600.0, "A"), b"v1");
        service.add_revision("p", rev(1, 2, NOW - 30.0, "A"), b"v2");
        let mut store = MemStore::new();

        run(&service, &mut store, &site(), &opts(), NOW).unwrap();
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.file("p.html").unwrap(), b"v1");

        run(&service, &mut store, &site(), &opts(), NOW + 60.0).unwrap();
        assert_eq!(store.commit_count(), 2);
        assert_eq!(store.file("p.html").unwrap(), b"v2");
    }

    #[test]
    fn versions_per_pad_strictly_increase() {
        let service = MemService::new();
        service.add_revision("p", rev(0, 0, 50.0, "A"), b"created");
        service.add_revision("p", rev(0, 3, 100.0, "A"), b"v3");
        service.add_revision("q", rev(0, 2, 150.0, "B"), b"q2");
        service.add_revision("p", rev(3, 8, 200.0, "A"), b"v8");
        let mut store = MemStore::new();

        run(&service, &mut store, &site(), &opts(), NOW).unwrap();
        service.add_revision("p", rev(8, 11, 300.0, "A"), b"v11");
        run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        let versions: Vec<u64> = store
            .commits()
            .iter()
            .filter(|c| c.path == "p.html")
            .map(|c| CommitMessage::parse_version(&c.message).unwrap())
            .collect();
        assert_eq!(versions, vec![3, 8, 11]);
    }

    #[test]
    fn structured_failure_falls_back_to_all_pads() {
        let service = MemService::new();
        service.add_revision("abc", rev(0, 5, 1000.0, "Ann"), b"x");
        service.fail_updated_listing("edited-since unavailable");
        let mut store = MemStore::new();

        let report = run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        assert!(report.used_fallback);
        assert_eq!(store.commit_count(), 1);
        let calls = service.calls();
        assert_eq!(calls[0], "list_updated 0");
        assert_eq!(calls[1], "list_all");
    }

    #[test]
    fn reserved_ids_are_skipped_without_aborting() {
        let service = MemService::new();
        service.add_revision("-bad", rev(0, 1, 100.0, "A"), b"x");
        service.add_revision("good", rev(0, 1, 100.0, "A"), b"y");
        let mut store = MemStore::new();

        let report = run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        assert_eq!(report.pads_skipped, vec!["-bad"]);
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.commits()[0].path, "good.html");
        assert!(!service.calls().contains(&"revisions -bad".to_string()));
    }

    #[test]
    fn malformed_id_aborts_before_any_pad() {
        let service = MemService::new();
        service.add_revision("good", rev(0, 1, 100.0, "A"), b"y");
        service.add_listed_id("bad id!");
        let mut store = MemStore::new();

        let err = run(&service, &mut store, &site(), &opts(), NOW).unwrap_err();

        assert!(matches!(err, BackupError::InvalidPadId(id) if id == "bad id!"));
        assert_eq!(store.commit_count(), 0);
        assert!(!service.calls().iter().any(|c| c.starts_with("revisions")));
    }

    #[test]
    fn pad_without_new_revisions_contributes_nothing() {
        let service = MemService::new();
        service.add_revision("fresh", rev(0, 0, 100.0, "A"), b"");
        let mut store = MemStore::new();

        let report = run(&service, &mut store, &site(), &opts(), NOW).unwrap();

        assert_eq!(report.pads_listed, 1);
        assert_eq!(report.pads_changed, 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn fetch_failure_aborts_site_without_commits() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 100.0, "A"), b"a1");
        service.add_revision("b", rev(0, 9, 200.0, "B"), b"b9");
        service.fail_content("b");
        let mut store = MemStore::new();

        let err = run(&service, &mut store, &site(), &opts(), NOW).unwrap_err();
        assert!(matches!(err, BackupError::Service(_)));
        // "a" was only buffered; end-of-run mode never reached the flush.
        assert_eq!(store.commit_count(), 0);

        service.restore_content("b");
        run(&service, &mut store, &site(), &opts(), NOW).unwrap();
        assert_eq!(store.commit_count(), 2);
    }

    #[test]
    fn store_failure_is_safe_to_retry() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 100.0, "A"), b"a1");
        service.add_revision("b", rev(0, 1, 200.0, "B"), b"b1");
        let mut store = MemStore::new();
        store.fail_after_commits(1);

        assert!(run(&service, &mut store, &site(), &opts(), NOW).is_err());
        assert_eq!(store.commit_count(), 1);

        store.fail_after_commits(usize::MAX);
        let report = run(&service, &mut store, &site(), &opts(), NOW).unwrap();
        assert_eq!(report.flushed.committed, 1);
        let paths: Vec<String> = store.commits().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec!["a.html", "b.html"]);
    }

    #[test]
    fn per_pad_mode_rescans_and_flushes_each_pad() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 300.0, "A"), b"a1");
        service.add_revision("b", rev(0, 1, 100.0, "B"), b"b1");
        let mut store = MemStore::new();
        store.push_raw_commit("old.html", b"o", "timestamp 5000\nversion 1\nauthors X\n");
        let per_pad = BackupOptions {
            flush: FlushMode::PerPad,
            ..opts()
        };

        let report = run(&service, &mut store, &site(), &per_pad, NOW).unwrap();

        assert_eq!(report.watermark, 0.0);
        assert_eq!(service.calls()[0], "list_updated 0");
        // Pads flush in listing order, so "a" (t=300) lands before "b" (t=100).
        let paths: Vec<String> = store.commits().into_iter().map(|c| c.path).collect();
        assert_eq!(paths, vec!["old.html", "a.html", "b.html"]);
    }

    #[test]
    fn per_pad_mode_keeps_earlier_pads_on_failure() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 100.0, "A"), b"a1");
        service.add_revision("b", rev(0, 1, 200.0, "B"), b"b1");
        let mut store = MemStore::new();
        store.fail_after_commits(1);
        let per_pad = BackupOptions {
            flush: FlushMode::PerPad,
            ..opts()
        };

        assert!(run(&service, &mut store, &site(), &per_pad, NOW).is_err());
        assert_eq!(store.commit_count(), 1);
        assert_eq!(store.commits()[0].path, "a.html");
    }

    #[test]
    fn corrupt_history_halts_the_run() {
        let service = MemService::new();
        service.add_revision("a", rev(0, 1, 100.0, "A"), b"a1");
        let mut store = MemStore::new();
        store.push_raw_commit("a.html", b"manual", "fixed typo by hand\n");

        let err = run(&service, &mut store, &site(), &opts(), NOW).unwrap_err();
        assert!(matches!(err, BackupError::CorruptHistory(_)));
        assert!(service.calls().is_empty());
    }
}
