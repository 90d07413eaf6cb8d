//! # Pad Service Client
//!
//! The read-only surface of the hosted pad service that backups need. The
//! [`PadService`] trait keeps the sync engine independent of HTTP, OAuth and
//! JSON.
//!
//! ## Implementations
//!
//! - [`http::HackpadClient`]: the real API, OAuth 1.0 signed.
//! - [`memory::MemService`]: scripted pads and revisions for testing.
//!
//! ## Outcomes
//!
//! Two kinds of failure are kept apart. Transport problems (network, HTTP
//! status, undecodable JSON) are `Err`. A well-formed
//! `{"success": false, ...}` answer to "list updated pads" is
//! `Ok(Listing::Failed)`, which callers recover from by listing every pad.

use crate::error::Result;
use crate::model::{PadId, RevisionDescriptor};

pub mod http;
pub mod memory;
pub mod oauth;

/// Result of a listing call that the service may explicitly refuse.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing<T> {
    Ok(T),
    Failed(String),
}

pub trait PadService {
    /// Ids of every pad on the site.
    fn list_all_pad_ids(&self) -> Result<Vec<String>>;

    /// Ids of pads edited since `since` (epoch seconds).
    fn list_updated_pad_ids(&self, since: f64) -> Result<Listing<Vec<String>>>;

    /// Revision spans of one pad, in service order.
    fn list_revisions(&self, pad_id: &PadId) -> Result<Vec<RevisionDescriptor>>;

    /// Pad body as of `revision`, rendered in `format`.
    fn get_content(&self, pad_id: &PadId, revision: u64, format: &str) -> Result<Vec<u8>>;
}
