//! # Command Layer
//!
//! The backup engine proper. Each command is a plain function over the
//! [`PadService`](crate::client::PadService) and
//! [`VersionedStore`](crate::store::VersionedStore) traits and returns a
//! structured report.
//!
//! ## What Commands Do NOT Do
//!
//! - **Any terminal I/O**: reports carry [`CmdMessage`]s; the CLI prints them
//! - **Read the clock**: `now` is passed in, so filtering is reproducible
//! - **Load configuration**: options arrive as an immutable struct
//!
//! ## Testing Strategy
//!
//! Command tests run against `MemService` and `MemStore`, covering every
//! branch of the sync algorithm without network or git.
//!
//! ## Command Modules
//!
//! - [`backup`]: one site's sync pass (the orchestrator)
//! - [`run`]: every target of the backup list, failures isolated per line
//! - [`status`]: watermark inspection without touching the network

use crate::batch::FlushReport;
use crate::model::SiteName;

pub mod backup;
pub mod run;
pub mod status;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// What one sync pass over a site did.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteReport {
    pub site: SiteName,
    /// Timestamp the changed-pad listing was requested from.
    pub watermark: f64,
    /// Whether "list updated pads" failed and every pad was listed instead.
    pub used_fallback: bool,
    pub pads_listed: usize,
    pub pads_skipped: Vec<String>,
    pub pads_changed: usize,
    pub revisions_fetched: usize,
    pub flushed: FlushReport,
    pub messages: Vec<CmdMessage>,
}

impl SiteReport {
    pub fn new(site: SiteName) -> Self {
        Self {
            site,
            watermark: 0.0,
            used_fallback: false,
            pads_listed: 0,
            pads_skipped: Vec::new(),
            pads_changed: 0,
            revisions_fetched: 0,
            flushed: FlushReport::default(),
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }
}
