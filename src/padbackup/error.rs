use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid pad id: {0:?}")]
    InvalidPadId(String),

    #[error("Invalid site name: {0:?}")]
    InvalidSiteName(String),

    #[error("Unsupported pad selector {selector:?} for site {site:?} (only \"*\" is supported)")]
    UnsupportedSelector { site: String, selector: String },

    #[error("Malformed target on line {line}: {content:?}")]
    MalformedTarget { line: usize, content: String },

    #[error("No API key for site {0:?}")]
    MissingCredentials(String),

    #[error("Malformed credentials on line {0}")]
    MalformedCredentials(usize),

    #[error("Service error: {0}")]
    Service(String),

    #[error("Corrupt history: {0}")]
    CorruptHistory(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("{failed} of {total} backup targets failed")]
    SitesFailed { failed: usize, total: usize },
}

pub type Result<T> = std::result::Result<T, BackupError>;
