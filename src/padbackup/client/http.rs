use super::oauth::{authorization_header, Nonce};
use super::{Listing, PadService};
use crate::config::BackupConfig;
use crate::credentials::ApiKey;
use crate::error::{BackupError, Result};
use crate::model::{PadId, RevisionDescriptor, SiteName};
use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Blocking client for the Hackpad 1.0 API of one site.
#[derive(Debug)]
pub struct HackpadClient {
    http: Client,
    base: String,
    key: ApiKey,
}

impl HackpadClient {
    pub fn new(config: &BackupConfig, site: &SiteName, key: ApiKey) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(concat!("padbackup/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base: base_url(&config.scheme, &config.host, site),
            key,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn get(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.base, path);
        debug!(%url, "GET");
        let auth = authorization_header(
            "GET",
            &url,
            &self.key.key,
            &self.key.secret,
            &Nonce::fresh(),
        );
        let response = self.http.get(&url).header(AUTHORIZATION, auth).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(BackupError::Service(format!("GET {} returned {}", url, status)));
        }
        Ok(response.bytes()?.to_vec())
    }

    fn get_listing<T: DeserializeOwned>(&self, path: &str) -> Result<Listing<T>> {
        parse_listing(&self.get(path)?)
    }

    /// Like [`get_listing`](Self::get_listing), but a structured failure is fatal.
    fn get_required<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        match self.get_listing(path)? {
            Listing::Ok(value) => Ok(value),
            Listing::Failed(error) => Err(BackupError::Service(error)),
        }
    }
}

/// `https://<site>.<host>` for named sites, `https://<host>` for the main one.
pub fn base_url(scheme: &str, host: &str, site: &SiteName) -> String {
    if site.is_main() {
        format!("{}://{}", scheme, host)
    } else {
        format!("{}://{}.{}", scheme, site.as_str(), host)
    }
}

/// Decode an API body, recognizing `{"success": false, "error": ...}`.
pub fn parse_listing<T: DeserializeOwned>(body: &[u8]) -> Result<Listing<T>> {
    let value: Value = serde_json::from_slice(body)?;
    if let Some(obj) = value.as_object() {
        if obj.get("success").and_then(Value::as_bool) == Some(false) {
            let error = obj
                .get("error")
                .map(|e| match e {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .unwrap_or_else(|| "unspecified service failure".to_string());
            return Ok(Listing::Failed(error));
        }
    }
    Ok(Listing::Ok(serde_json::from_value(value)?))
}

impl PadService for HackpadClient {
    fn list_all_pad_ids(&self) -> Result<Vec<String>> {
        self.get_required("/api/1.0/pads/all")
    }

    fn list_updated_pad_ids(&self, since: f64) -> Result<Listing<Vec<String>>> {
        self.get_listing(&format!("/api/1.0/edited-since/{}", since.trunc() as i64))
    }

    fn list_revisions(&self, pad_id: &PadId) -> Result<Vec<RevisionDescriptor>> {
        self.get_required(&format!("/api/1.0/pad/{}/revisions", pad_id))
    }

    fn get_content(&self, pad_id: &PadId, revision: u64, format: &str) -> Result<Vec<u8>> {
        self.get(&format!(
            "/api/1.0/pad/{}/content/{}.{}",
            pad_id, revision, format
        ))
    }
}
