//! Two-legged OAuth 1.0 request signing (HMAC-SHA1, consumer key only).

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Per-request values that would otherwise make signatures unrepeatable.
#[derive(Debug, Clone)]
pub struct Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl Nonce {
    pub fn fresh() -> Self {
        Self {
            nonce: uuid::Uuid::new_v4().simple().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

fn encode(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

/// Build the `Authorization` header value for a request without query or
/// body parameters.
pub fn authorization_header(
    method: &str,
    url: &str,
    consumer_key: &str,
    consumer_secret: &str,
    nonce: &Nonce,
) -> String {
    let timestamp = nonce.timestamp.to_string();
    let mut params = vec![
        ("oauth_consumer_key", consumer_key),
        ("oauth_nonce", nonce.nonce.as_str()),
        ("oauth_signature_method", "HMAC-SHA1"),
        ("oauth_timestamp", timestamp.as_str()),
        ("oauth_version", "1.0"),
    ];
    let signature = sign(
        &base_string(method, url, &params),
        consumer_secret,
    );

    params.push(("oauth_signature", signature.as_str()));
    let fields: Vec<String> = params
        .iter()
        .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
        .collect();
    format!("OAuth {}", fields.join(", "))
}

/// The signature base string: `METHOD&url&params`, each part encoded, with
/// parameters sorted by name.
pub fn base_string(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> =
        params.iter().map(|(k, v)| (encode(k), encode(v))).collect();
    encoded.sort();
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&joined)
    )
}

fn sign(base: &str, consumer_secret: &str) -> String {
    // No token secret in two-legged OAuth, hence the trailing '&'.
    let key = format!("{}&", encode(consumer_secret));
    let mut mac =
        HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(base.as_bytes());
    STANDARD.encode(mac.finalize().into_bytes())
}
