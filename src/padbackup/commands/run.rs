//! Back up every target in the backup list.
//!
//! Lines are independent: a malformed line, a missing API key or a failed
//! site pass is recorded in the [`RunReport`] and the next line still runs.

use super::backup::{self, BackupOptions};
use super::SiteReport;
use crate::client::PadService;
use crate::error::Result;
use crate::model::SiteName;
use crate::store::VersionedStore;
use crate::targets::TargetLine;
use tracing::{error, info};

/// Opens the collaborators for a site.
pub trait SiteBackends {
    type Service: PadService;
    type Store: VersionedStore;

    fn open_service(&mut self, site: &SiteName) -> Result<Self::Service>;

    /// Open or create the site's store.
    fn open_store(&mut self, site: &SiteName) -> Result<Self::Store>;

    /// The site's store if it was ever created. Used by read-only commands.
    fn existing_store(&mut self, site: &SiteName) -> Result<Option<Self::Store>>;
}

#[derive(Debug)]
pub struct TargetOutcome {
    pub line: usize,
    pub text: String,
    pub result: Result<SiteReport>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TargetOutcome>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.len() - self.failed()
    }

    pub fn committed(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(|r| r.flushed.committed)
            .sum()
    }
}

/// Run one site's pass, opening its service before its store so that a
/// configuration problem never creates or touches a repository.
pub fn backup_site<B: SiteBackends>(
    backends: &mut B,
    site: &SiteName,
    opts: &BackupOptions,
    now: f64,
) -> Result<SiteReport> {
    let service = backends.open_service(site)?;
    let mut store = backends.open_store(site)?;
    backup::run(&service, &mut store, site, opts, now)
}

/// Run every target. `clock` is read once per site, at the start of its pass.
pub fn run<B, F>(backends: &mut B, targets: Vec<TargetLine>, opts: &BackupOptions, clock: F) -> RunReport
where
    B: SiteBackends,
    F: Fn() -> f64,
{
    let mut report = RunReport::default();
    for TargetLine { line, text, target } in targets {
        info!(line, target = %text, "backing up target");
        let result = target.and_then(|target| backup_site(backends, &target.site, opts, clock()));
        if let Err(e) = &result {
            error!(line, target = %text, error = %e, "target failed");
        }
        report.outcomes.push(TargetOutcome { line, text, result });
    }
    report
}
