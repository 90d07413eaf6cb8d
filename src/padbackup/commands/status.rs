//! Report how far a site has been backed up, reading only local history.

use crate::error::Result;
use crate::model::{CommitMessage, PadId, SiteName};
use crate::store::VersionedStore;
use crate::watermark::Watermarks;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteStatus {
    pub site: SiteName,
    /// 0 when the site has never been backed up.
    pub last_backup: f64,
    pub last_commit: Option<CommitMessage>,
    pub pad_version: Option<(PadId, u64)>,
}

pub fn run<S: VersionedStore>(
    store: &S,
    site: &SiteName,
    format: &str,
    pad: Option<&str>,
) -> Result<SiteStatus> {
    let marks = Watermarks::new(store, format);
    let pad_version = match pad {
        Some(raw) => {
            let pad_id = PadId::new(raw)?;
            let version = marks.last_committed_version(&pad_id)?;
            Some((pad_id, version))
        }
        None => None,
    };
    Ok(SiteStatus {
        site: site.clone(),
        last_backup: marks.last_backup_time()?,
        last_commit: marks.last_commit()?,
        pad_version,
    })
}

/// Status of a site whose store was never created.
pub fn never_backed_up(site: &SiteName, pad: Option<&str>) -> Result<SiteStatus> {
    let pad_version = pad.map(|raw| PadId::new(raw).map(|id| (id, 0))).transpose()?;
    Ok(SiteStatus {
        site: site.clone(),
        last_backup: 0.0,
        last_commit: None,
        pad_version,
    })
}
