// itch.io API HTTP client
//
// Wraps `reqwest::Client` with key-based auth, URL construction and the
// `{"errors": [...]}` envelope. Endpoint groups (profile, games,
// collections) are inherent methods in their own files.

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Default production endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.itch.io";

/// Error strings the server uses for a bad or expired key.
const AUTH_ERRORS: &[&str] = &["invalid key", "not logged in", "invalid api key"];

/// Raw HTTP client for the itch.io server API.
///
/// All endpoint methods return the decoded JSON body untouched: shaping it
/// into entities is the caller's business.
#[derive(Clone)]
pub struct ItchClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
}

impl ItchClient {
    /// Create a new client authenticated with `api_key`.
    pub fn new(
        base_url: Url,
        api_key: SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, api_key))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, api_key: SecretString) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}/{path}`, tolerating trailing slashes on the base.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send an authenticated GET request and decode the JSON body.
    pub(crate) async fn get(&self, url: Url) -> Result<Value, Error> {
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, self.api_key.expose_secret())
            .send()
            .await
            .map_err(Error::Transport)?;

        parse_response(resp).await
    }
}

/// Decode a response, turning error statuses and the `errors` envelope
/// into typed errors.
async fn parse_response(resp: reqwest::Response) -> Result<Value, Error> {
    let status = resp.status();
    let body = resp.text().await.map_err(Error::Transport)?;
    trace!(status = status.as_u16(), len = body.len(), "response received");

    let parsed: Result<Value, _> = serde_json::from_str(&body);
    let errors = parsed
        .as_ref()
        .ok()
        .map(extract_errors)
        .unwrap_or_default();

    let rejected = [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN].contains(&status);
    if rejected || is_auth_failure(&errors) {
        return Err(Error::Authentication {
            message: errors
                .first()
                .cloned()
                .unwrap_or_else(|| "API key rejected".into()),
        });
    }

    if !status.is_success() || !errors.is_empty() {
        let errors = if errors.is_empty() {
            vec![body.chars().take(200).collect()]
        } else {
            errors
        };
        return Err(Error::Api {
            status: status.as_u16(),
            errors,
        });
    }

    parsed.map_err(|e| {
        let preview: String = body.chars().take(200).collect();
        Error::Deserialization {
            message: format!("{e} (body preview: {preview:?})"),
            body: body.clone(),
        }
    })
}

fn extract_errors(value: &Value) -> Vec<String> {
    value
        .get("errors")
        .and_then(Value::as_array)
        .map(|errs| {
            errs.iter()
                .map(|e| match e {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn is_auth_failure(errors: &[String]) -> bool {
    errors
        .iter()
        .any(|e| AUTH_ERRORS.contains(&e.to_ascii_lowercase().as_str()))
}
