//! # Configuration
//!
//! Backup configuration is managed by [`confique`], which layers compiled
//! defaults, an optional TOML file and `PADBACKUP_*` environment variables.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `PADBACKUP_FORMAT`, `PADBACKUP_DATA_DIR`, etc.
//! 2. **Config file**: `padbackup.toml` in the working directory, or `--config`.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! CLI flags are applied on top by the binary. Once built, a [`BackupConfig`]
//! is never mutated; it is passed by reference to everything that needs it.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `format` | `html` | Content format fetched and stored per pad |
//! | `delay_secs` | `1.0` | Pause after each content fetch |
//! | `race_window_secs` | `60` | Revisions newer than this are left for the next run |
//! | `out_of_order_commit` | `false` | Full rescan with per-pad commits |
//! | `timezone` | `+0800` | UTC offset recorded on commit author dates |
//! | `data_dir` | `data` | Root of the per-site git repositories |
//! | `api_keys_file` | `api_keys.txt` | OAuth consumer keys per site |
//! | `backup_list_file` | `backup_list.txt` | Sites to back up |
//! | `host` | `hackpad.com` | Service host; sites are subdomains |
//! | `scheme` | `https` | URL scheme for API requests |
//! | `request_timeout_secs` | `30` | Per-request HTTP timeout |
//! | `author_name` / `author_email` | `padbackup` | Fallback commit identity |
//! | `log_file` | unset | Also write logs to this file |

use crate::commands::backup::{BackupOptions, FlushMode};
use crate::error::{BackupError, Result};
use crate::model::SiteName;
use confique::Config;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "padbackup.toml";

/// Configuration for padbackup, stored in `padbackup.toml`.
#[derive(Config, Debug, Clone, PartialEq)]
pub struct BackupConfig {
    /// Format requested from the content endpoint and used as file extension.
    #[config(env = "PADBACKUP_FORMAT", default = "html")]
    pub format: String,

    /// Seconds to sleep after each content fetch.
    #[config(env = "PADBACKUP_DELAY_SECS", default = 1.0)]
    pub delay_secs: f64,

    /// Trailing window, in seconds, of revisions considered still in flux.
    #[config(env = "PADBACKUP_RACE_WINDOW_SECS", default = 60)]
    pub race_window_secs: u64,

    /// Rescan everything and commit after each pad. Only if you know what it is.
    #[config(env = "PADBACKUP_OUT_OF_ORDER_COMMIT", default = false)]
    pub out_of_order_commit: bool,

    /// UTC offset (`+HHMM` / `-HHMM`) for commit author dates.
    #[config(env = "PADBACKUP_TIMEZONE", default = "+0800")]
    pub timezone: String,

    #[config(env = "PADBACKUP_DATA_DIR", default = "data")]
    pub data_dir: PathBuf,

    #[config(env = "PADBACKUP_API_KEYS_FILE", default = "api_keys.txt")]
    pub api_keys_file: PathBuf,

    #[config(env = "PADBACKUP_BACKUP_LIST_FILE", default = "backup_list.txt")]
    pub backup_list_file: PathBuf,

    #[config(env = "PADBACKUP_HOST", default = "hackpad.com")]
    pub host: String,

    #[config(env = "PADBACKUP_SCHEME", default = "https")]
    pub scheme: String,

    #[config(env = "PADBACKUP_REQUEST_TIMEOUT_SECS", default = 30)]
    pub request_timeout_secs: u64,

    /// Commit identity used when the repository has no `user.name`/`user.email`.
    #[config(env = "PADBACKUP_AUTHOR_NAME", default = "padbackup")]
    pub author_name: String,

    #[config(env = "PADBACKUP_AUTHOR_EMAIL", default = "padbackup@localhost")]
    pub author_email: String,

    #[config(env = "PADBACKUP_LOG_FILE")]
    pub log_file: Option<PathBuf>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            format: "html".to_string(),
            delay_secs: 1.0,
            race_window_secs: 60,
            out_of_order_commit: false,
            timezone: "+0800".to_string(),
            data_dir: PathBuf::from("data"),
            api_keys_file: PathBuf::from("api_keys.txt"),
            backup_list_file: PathBuf::from("backup_list.txt"),
            host: "hackpad.com".to_string(),
            scheme: "https".to_string(),
            request_timeout_secs: 30,
            author_name: "padbackup".to_string(),
            author_email: "padbackup@localhost".to_string(),
            log_file: None,
        }
    }
}

impl BackupConfig {
    /// Load from env and `path`. A missing file just means defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::builder()
            .env()
            .file(path)
            .load()
            .map_err(|e| BackupError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        parse_utc_offset(&self.timezone)?;
        if self.format.is_empty() || !self.format.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BackupError::Config(format!(
                "format must be a plain extension like \"html\", got {:?}",
                self.format
            )));
        }
        if !self.delay_secs.is_finite() || self.delay_secs < 0.0 {
            return Err(BackupError::Config(format!(
                "delay_secs must be a non-negative number, got {}",
                self.delay_secs
            )));
        }
        Ok(())
    }

    /// Repository directory for a site: `<data_dir>/<site>` or `<data_dir>/main`.
    pub fn site_dir(&self, site: &SiteName) -> PathBuf {
        self.data_dir.join(site.dir_name())
    }

    /// Offset in minutes east of UTC.
    pub fn utc_offset_minutes(&self) -> Result<i32> {
        parse_utc_offset(&self.timezone)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn backup_options(&self) -> Result<BackupOptions> {
        Ok(BackupOptions {
            format: self.format.clone(),
            race_window_secs: self.race_window_secs as f64,
            delay: Duration::from_secs_f64(self.delay_secs),
            flush: if self.out_of_order_commit {
                FlushMode::PerPad
            } else {
                FlushMode::EndOfRun
            },
            utc_offset_minutes: self.utc_offset_minutes()?,
        })
    }
}

/// Parse a git-style `+HHMM` / `-HHMM` offset into minutes.
pub fn parse_utc_offset(raw: &str) -> Result<i32> {
    let invalid = || BackupError::Config(format!("timezone must look like +0800, got {:?}", raw));
    let bytes = raw.as_bytes();
    if bytes.len() != 5 || !bytes[1..].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    let sign = match bytes[0] {
        b'+' => 1,
        b'-' => -1,
        _ => return Err(invalid()),
    };
    let hours: i32 = raw[1..3].parse().map_err(|_| invalid())?;
    let minutes: i32 = raw[3..5].parse().map_err(|_| invalid())?;
    if hours > 14 || minutes > 59 {
        return Err(invalid());
    }
    Ok(sign * (hours * 60 + minutes))
}
