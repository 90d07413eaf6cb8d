//! OAuth consumer keys, one pair per site.
//!
//! The key file is plain text. `#` starts a comment, blank lines are ignored,
//! and every other line is either `key secret` (the main site) or
//! `key secret site`. A later line for the same site replaces an earlier one.

use crate::error::{BackupError, Result};
use crate::model::SiteName;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    pub key: String,
    pub secret: String,
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKey")
            .field("key", &self.key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    keys: HashMap<SiteName, ApiKey>,
}

impl Credentials {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            BackupError::Config(format!("cannot read API keys from {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut keys = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = strip_comment(line);
            let fields: Vec<&str> = line.split_whitespace().collect();
            let (key, secret, site) = match fields.as_slice() {
                [] => continue,
                [key, secret] => (*key, *secret, SiteName::main()),
                [key, secret, site] => (*key, *secret, SiteName::new(*site)?),
                _ => return Err(BackupError::MalformedCredentials(idx + 1)),
            };
            keys.insert(
                site,
                ApiKey {
                    key: key.to_string(),
                    secret: secret.to_string(),
                },
            );
        }
        Ok(Self { keys })
    }

    pub fn get(&self, site: &SiteName) -> Result<&ApiKey> {
        self.keys
            .get(site)
            .ok_or_else(|| BackupError::MissingCredentials(site.as_str().to_string()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Drop everything from the first `#` on.
pub(crate) fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_and_main_site_keys() {
        let creds = Credentials::parse(
            "# keys\n\
             mainkey mainsecret\n\
             \n\
             teamkey teamsecret team   # the team site\n",
        )
        .unwrap();

        assert_eq!(creds.len(), 2);
        let main = creds.get(&SiteName::main()).unwrap();
        assert_eq!(main.key, "mainkey");
        assert_eq!(main.secret, "mainsecret");
        let team = creds.get(&SiteName::new("team").unwrap()).unwrap();
        assert_eq!(team.key, "teamkey");
    }

    #[test]
    fn later_lines_override_earlier_ones() {
        let creds = Credentials::parse("a 1 team\nb 2 team\n").unwrap();
        let team = creds.get(&SiteName::new("team").unwrap()).unwrap();
        assert_eq!(team.key, "b");
        assert_eq!(team.secret, "2");
    }

    #[test]
    fn missing_site_is_an_error() {
        let creds = Credentials::parse("a 1 team\n").unwrap();
        let err = creds.get(&SiteName::main()).unwrap_err();
        assert!(matches!(err, BackupError::MissingCredentials(site) if site.is_empty()));
    }

    #[test]
    fn malformed_lines_report_line_number() {
        let err = Credentials::parse("a 1\nonlykey\n").unwrap_err();
        assert!(matches!(err, BackupError::MalformedCredentials(2)));

        let err = Credentials::parse("a 1 team extra\n").unwrap_err();
        assert!(matches!(err, BackupError::MalformedCredentials(1)));
    }

    #[test]
    fn invalid_site_names_are_rejected() {
        let err = Credentials::parse("a 1 bad-site\n").unwrap_err();
        assert!(matches!(err, BackupError::InvalidSiteName(_)));
    }

    #[test]
    fn debug_output_hides_secret() {
        let key = ApiKey {
            key: "k".into(),
            secret: "hunter2".into(),
        };
        assert!(!format!("{:?}", key).contains("hunter2"));
    }
}
