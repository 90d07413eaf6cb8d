use crate::error::{BackupError, Result};
use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;

static PAD_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_%.-]+$").unwrap());
static SITE_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]*$").unwrap());
static TIMESTAMP_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^timestamp (\d+(?:\.\d+)?)$").unwrap());
static VERSION_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^version (\d+)$").unwrap());
static AUTHORS_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^authors (.*)$").unwrap());

/// Identifier of a pad on the remote service.
///
/// Construction only checks the safe charset. Ids starting with `.` or `-`
/// still parse but are [reserved](PadId::is_reserved) and never become paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PadId(String);

impl PadId {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if !PAD_ID_RE.is_match(&raw) {
            return Err(BackupError::InvalidPadId(raw));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_reserved(&self) -> bool {
        self.0.starts_with('.') || self.0.starts_with('-')
    }
}

impl fmt::Display for PadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of a hosted site. The empty name is the service's main site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SiteName(String);

impl SiteName {
    pub fn new(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if !SITE_NAME_RE.is_match(&raw) {
            return Err(BackupError::InvalidSiteName(raw));
        }
        Ok(Self(raw))
    }

    pub fn main() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_main(&self) -> bool {
        self.0.is_empty()
    }

    /// Directory name of this site's repository under the data dir.
    pub fn dir_name(&self) -> &str {
        if self.is_main() {
            "main"
        } else {
            &self.0
        }
    }
}

impl fmt::Display for SiteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// One edit span on a pad, as reported by the revisions endpoint.
///
/// The service also sends `htmlDiff`, `authorPics` and `emails`; they are not
/// needed for backups and are dropped while decoding.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionDescriptor {
    #[serde(default)]
    pub start_rev: u64,
    pub end_rev: u64,
    pub timestamp: f64,
    #[serde(default)]
    pub authors: Vec<String>,
}

impl RevisionDescriptor {
    pub fn new(start_rev: u64, end_rev: u64, timestamp: f64, authors: &[&str]) -> Self {
        Self {
            start_rev,
            end_rev,
            timestamp,
            authors: authors.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// A fetched revision waiting in the commit batch.
#[derive(Debug, Clone)]
pub struct PendingCommit {
    pub timestamp: f64,
    pub revision: RevisionDescriptor,
    pub pad_id: PadId,
    pub content: Vec<u8>,
}

/// Author date handed to the store: whole seconds plus a UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthorDate {
    pub seconds: i64,
    pub offset_minutes: i32,
}

impl AuthorDate {
    pub fn from_timestamp(timestamp: f64, offset_minutes: i32) -> Self {
        Self {
            seconds: timestamp.trunc() as i64,
            offset_minutes,
        }
    }
}

/// The self-describing message attached to every backup commit.
///
/// ```text
/// timestamp 1375949266.528
/// version 215
/// authors John Doe,Jane Roe
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CommitMessage {
    pub timestamp: f64,
    pub version: u64,
    pub authors: Vec<String>,
}

impl CommitMessage {
    pub fn for_revision(revision: &RevisionDescriptor) -> Self {
        Self {
            timestamp: revision.timestamp,
            version: revision.end_rev,
            authors: revision.authors.clone(),
        }
    }

    pub fn parse(message: &str) -> Result<Self> {
        let authors = AUTHORS_LINE_RE
            .captures(message)
            .and_then(|c| c.get(1))
            .ok_or_else(|| missing_field("authors", message))?
            .as_str();
        Ok(Self {
            timestamp: Self::parse_timestamp(message)?,
            version: Self::parse_version(message)?,
            authors: if authors.is_empty() {
                Vec::new()
            } else {
                authors.split(',').map(str::to_string).collect()
            },
        })
    }

    pub fn parse_timestamp(message: &str) -> Result<f64> {
        let raw = TIMESTAMP_LINE_RE
            .captures(message)
            .and_then(|c| c.get(1))
            .ok_or_else(|| missing_field("timestamp", message))?;
        raw.as_str()
            .parse()
            .map_err(|_| missing_field("timestamp", message))
    }

    pub fn parse_version(message: &str) -> Result<u64> {
        let raw = VERSION_LINE_RE
            .captures(message)
            .and_then(|c| c.get(1))
            .ok_or_else(|| missing_field("version", message))?;
        raw.as_str()
            .parse()
            .map_err(|_| missing_field("version", message))
    }

    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        let secs = self.timestamp.trunc() as i64;
        let nanos = (self.timestamp.fract() * 1e9) as u32;
        Utc.timestamp_opt(secs, nanos).single()
    }
}

fn missing_field(field: &str, message: &str) -> BackupError {
    BackupError::CorruptHistory(format!(
        "commit message has no valid {} line: {:?}",
        field, message
    ))
}

impl fmt::Display for CommitMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64's Display prints 1e9 as "1000000000" and keeps real fractions.
        writeln!(f, "timestamp {}", self.timestamp)?;
        writeln!(f, "version {}", self.version)?;
        writeln!(f, "authors {}", self.authors.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pad_id_accepts_safe_charset() {
        for raw in ["abc", "Ab_9", "a%20b", "x.y-z", "-leading", ".hidden"] {
            assert!(PadId::new(raw).is_ok(), "{raw} should parse");
        }
    }

    #[test]
    fn pad_id_rejects_unsafe_chars() {
        for raw in ["", "bad id!", "a/b", "../etc", "pad\n", "caf\u{e9}"] {
            assert!(
                matches!(PadId::new(raw), Err(BackupError::InvalidPadId(_))),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn pad_id_reserved_prefixes() {
        assert!(PadId::new("-bad").unwrap().is_reserved());
        assert!(PadId::new(".git").unwrap().is_reserved());
        assert!(!PadId::new("good-pad.1").unwrap().is_reserved());
    }

    #[test]
    fn site_name_validation() {
        assert!(SiteName::new("").unwrap().is_main());
        assert_eq!(SiteName::new("team_1").unwrap().dir_name(), "team_1");
        assert_eq!(SiteName::main().dir_name(), "main");
        assert!(SiteName::new("bad-site").is_err());
        assert!(SiteName::new("../x").is_err());
    }

    #[test]
    fn revision_decoding_drops_extra_fields() {
        let json = r#"{"endRev": 215, "authorPics": ["https://example.com/p.png"],
            "timestamp": 1375949266.528, "startRev": 160, "authors": ["John Doe"],
            "emails": [], "htmlDiff": "<div>...</div>"}"#;
        let rev: RevisionDescriptor = serde_json::from_str(json).unwrap();
        assert_eq!(
            rev,
            RevisionDescriptor::new(160, 215, 1375949266.528, &["John Doe"])
        );
    }

    #[test]
    fn commit_message_format() {
        let rev = RevisionDescriptor::new(0, 5, 1000000000.0, &["Ann"]);
        assert_eq!(
            CommitMessage::for_revision(&rev).to_string(),
            "timestamp 1000000000\nversion 5\nauthors Ann\n"
        );

        let rev = RevisionDescriptor::new(160, 215, 1375949266.528, &["John Doe", "Jane"]);
        assert_eq!(
            CommitMessage::for_revision(&rev).to_string(),
            "timestamp 1375949266.528\nversion 215\nauthors John Doe,Jane\n"
        );
    }

    #[test]
    fn commit_message_parse() {
        let msg = CommitMessage::parse("timestamp 1375949266.528\nversion 215\nauthors A,B\n")
            .unwrap();
        assert_eq!(msg.timestamp, 1375949266.528);
        assert_eq!(msg.version, 215);
        assert_eq!(msg.authors, vec!["A", "B"]);

        let empty = CommitMessage::parse("timestamp 10\nversion 0\nauthors \n").unwrap();
        assert!(empty.authors.is_empty());
    }

    #[test]
    fn commit_message_parse_rejects_foreign_messages() {
        assert!(matches!(
            CommitMessage::parse_timestamp("Initial commit"),
            Err(BackupError::CorruptHistory(_))
        ));
        assert!(matches!(
            CommitMessage::parse_version("timestamp 10\nversion five\n"),
            Err(BackupError::CorruptHistory(_))
        ));
    }

    #[test]
    fn author_date_truncates_to_whole_seconds() {
        let date = AuthorDate::from_timestamp(1375949266.9, 480);
        assert_eq!(date.seconds, 1375949266);
        assert_eq!(date.offset_minutes, 480);
    }
}
