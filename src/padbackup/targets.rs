//! The backup list: which sites to back up.
//!
//! Each non-blank line is `site/selector`, with `#` comments stripped. Only the
//! `*` selector (every pad on the site) is supported. Lines are parsed
//! independently so one bad line never hides the others.

use crate::credentials::strip_comment;
use crate::error::{BackupError, Result};
use crate::model::SiteName;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    AllPads,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteTarget {
    pub site: SiteName,
    pub selector: Selector,
}

/// One meaningful line of the backup list and what it parsed to.
#[derive(Debug)]
pub struct TargetLine {
    pub line: usize,
    pub text: String,
    pub target: Result<SiteTarget>,
}

pub fn load_target_list(path: &Path) -> Result<Vec<TargetLine>> {
    let text = fs::read_to_string(path).map_err(|e| {
        BackupError::Config(format!(
            "cannot read backup list from {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(parse_target_list(&text))
}

pub fn parse_target_list(text: &str) -> Vec<TargetLine> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, raw)| {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                return None;
            }
            Some(TargetLine {
                line: idx + 1,
                text: line.to_string(),
                target: parse_target(idx + 1, line),
            })
        })
        .collect()
}

fn parse_target(line_no: usize, line: &str) -> Result<SiteTarget> {
    let mut parts = line.split('/');
    let (site, selector) = match (parts.next(), parts.next(), parts.next()) {
        (Some(site), Some(selector), None) => (site.trim(), selector.trim()),
        _ => {
            return Err(BackupError::MalformedTarget {
                line: line_no,
                content: line.to_string(),
            })
        }
    };

    let site = SiteName::new(site)?;
    if selector != "*" {
        return Err(BackupError::UnsupportedSelector {
            site: site.as_str().to_string(),
            selector: selector.to_string(),
        });
    }
    Ok(SiteTarget {
        site,
        selector: Selector::AllPads,
    })
}
