use super::{Listing, PadService};
use crate::error::{BackupError, Result};
use crate::model::{PadId, RevisionDescriptor};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

#[derive(Default, Clone)]
struct MemPad {
    revisions: Vec<RevisionDescriptor>,
    contents: HashMap<u64, Vec<u8>>,
}

#[derive(Default)]
struct Inner {
    pads: BTreeMap<String, MemPad>,
    /// Ids the listing endpoints return on top of the real pads.
    extra_ids: Vec<String>,
    updated_failure: Option<String>,
    failing_content: Vec<String>,
    calls: Vec<String>,
}

/// Scripted pad service for testing.
///
/// Clones share state, so tests can add revisions between runs and inspect
/// which endpoints the engine called.
#[derive(Clone, Default)]
pub struct MemService {
    inner: Rc<RefCell<Inner>>,
}

impl MemService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a revision of `pad`, with the content as of that revision.
    pub fn add_revision(&self, pad: &str, revision: RevisionDescriptor, content: &[u8]) {
        let mut inner = self.inner.borrow_mut();
        let entry = inner.pads.entry(pad.to_string()).or_default();
        entry.contents.insert(revision.end_rev, content.to_vec());
        entry.revisions.push(revision);
    }

    /// Make listings return an id that has no pad behind it.
    pub fn add_listed_id(&self, id: &str) {
        self.inner.borrow_mut().extra_ids.push(id.to_string());
    }

    /// Make "list updated pads" answer with a structured failure.
    pub fn fail_updated_listing(&self, error: &str) {
        self.inner.borrow_mut().updated_failure = Some(error.to_string());
    }

    /// Make content fetches for `pad` fail until [`restore_content`](Self::restore_content).
    pub fn fail_content(&self, pad: &str) {
        self.inner.borrow_mut().failing_content.push(pad.to_string());
    }

    pub fn restore_content(&self, pad: &str) {
        self.inner.borrow_mut().failing_content.retain(|p| p != pad);
    }

    /// Endpoint calls so far, e.g. `"list_updated 1000"` or `"content abc 5"`.
    pub fn calls(&self) -> Vec<String> {
        self.inner.borrow().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.inner.borrow_mut().calls.clear();
    }

    fn record(&self, call: String) {
        self.inner.borrow_mut().calls.push(call);
    }

    fn listed_ids<F>(&self, include: F) -> Vec<String>
    where
        F: Fn(&MemPad) -> bool,
    {
        let inner = self.inner.borrow();
        inner
            .pads
            .iter()
            .filter(|(_, pad)| include(pad))
            .map(|(id, _)| id.clone())
            .chain(inner.extra_ids.iter().cloned())
            .collect()
    }
}

impl PadService for MemService {
    fn list_all_pad_ids(&self) -> Result<Vec<String>> {
        self.record("list_all".to_string());
        Ok(self.listed_ids(|_| true))
    }

    fn list_updated_pad_ids(&self, since: f64) -> Result<Listing<Vec<String>>> {
        self.record(format!("list_updated {}", since));
        if let Some(error) = self.inner.borrow().updated_failure.clone() {
            return Ok(Listing::Failed(error));
        }
        Ok(Listing::Ok(self.listed_ids(|pad| {
            pad.revisions.iter().any(|r| r.timestamp >= since)
        })))
    }

    fn list_revisions(&self, pad_id: &PadId) -> Result<Vec<RevisionDescriptor>> {
        self.record(format!("revisions {}", pad_id));
        let inner = self.inner.borrow();
        Ok(inner
            .pads
            .get(pad_id.as_str())
            .map(|pad| pad.revisions.clone())
            .unwrap_or_default())
    }

    fn get_content(&self, pad_id: &PadId, revision: u64, format: &str) -> Result<Vec<u8>> {
        self.record(format!("content {} {}", pad_id, revision));
        let inner = self.inner.borrow();
        if inner.failing_content.iter().any(|p| p == pad_id.as_str()) {
            return Err(BackupError::Service(format!(
                "GET content of {} returned 503 Service Unavailable",
                pad_id
            )));
        }
        inner
            .pads
            .get(pad_id.as_str())
            .and_then(|pad| pad.contents.get(&revision))
            .cloned()
            .ok_or_else(|| {
                BackupError::Service(format!(
                    "no content for {} at revision {} ({})",
                    pad_id, revision, format
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn updated_listing_filters_by_timestamp() {
        let service = MemService::new();
        service.add_revision("old", RevisionDescriptor::new(0, 1, 100.0, &[]), b"o");
        service.add_revision("new", RevisionDescriptor::new(0, 1, 500.0, &[]), b"n");

        let listing = service.list_updated_pad_ids(200.0).unwrap();
        assert_eq!(listing, Listing::Ok(vec!["new".to_string()]));
        assert_eq!(service.list_all_pad_ids().unwrap(), vec!["new", "old"]);
    }

    #[test]
    fn records_calls_and_serves_content() {
        let service = MemService::new();
        service.add_revision("abc", RevisionDescriptor::new(0, 5, 1.0, &["Ann"]), b"hi");
        let id = PadId::new("abc").unwrap();

        assert_eq!(service.get_content(&id, 5, "html").unwrap(), b"hi");
        assert!(service.get_content(&id, 6, "html").is_err());
        assert_eq!(service.calls(), vec!["content abc 5", "content abc 6"]);
    }

    #[test]
    fn structured_failure_on_updated_listing() {
        let service = MemService::new();
        service.fail_updated_listing("nope");
        assert_eq!(
            service.list_updated_pad_ids(0.0).unwrap(),
            Listing::Failed("nope".to_string())
        );
    }
}
