//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for the
//! binary. It owns the backends and the clock and dispatches to
//! `commands/*.rs`.
//!
//! ## What the API Does NOT Do
//!
//! - **Sync logic**: that belongs in [`commands::backup`]
//! - **Printing**: results are returned as reports
//!
//! ## Generic Over SiteBackends
//!
//! `BackupApi<B: SiteBackends>` works with any backend pair:
//! - Production: `BackupApi<LiveSites>` (Hackpad API + git)
//! - Testing: fakes built from `MemService` and `MemStore`

use crate::commands::backup::BackupOptions;
use crate::commands::run::{self, RunReport, SiteBackends};
use crate::commands::{status, SiteReport};
use crate::error::Result;
use crate::model::SiteName;
use crate::targets::{load_target_list, TargetLine};
use std::path::Path;

/// Seconds since the epoch, as the service reports timestamps.
pub fn wall_clock() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub struct BackupApi<B: SiteBackends> {
    backends: B,
    options: BackupOptions,
    clock: Box<dyn Fn() -> f64>,
}

impl<B: SiteBackends> BackupApi<B> {
    pub fn new(backends: B, options: BackupOptions) -> Self {
        Self {
            backends,
            options,
            clock: Box::new(wall_clock),
        }
    }

    /// Replace the wall clock, for reproducible runs.
    pub fn with_clock(mut self, clock: impl Fn() -> f64 + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// Back up every target listed in the file at `path`.
    pub fn run_list(&mut self, path: &Path) -> Result<RunReport> {
        Ok(self.run_targets(load_target_list(path)?))
    }

    pub fn run_targets(&mut self, targets: Vec<TargetLine>) -> RunReport {
        run::run(&mut self.backends, targets, &self.options, &self.clock)
    }

    /// One sync pass over a single site.
    pub fn backup_site(&mut self, site: &SiteName) -> Result<SiteReport> {
        let now = (self.clock)();
        run::backup_site(&mut self.backends, site, &self.options, now)
    }

    /// Watermarks of a site, from local history only.
    pub fn status(&mut self, site: &SiteName, pad: Option<&str>) -> Result<status::SiteStatus> {
        let format = self.options.format.as_str();
        match self.backends.existing_store(site)? {
            Some(store) => status::run(&store, site, format, pad),
            None => status::never_backed_up(site, pad),
        }
    }
}
