use thiserror::Error;

/// Top-level error type for the `itch-api` crate.
///
/// Every failure the remote boundary can raise falls into one of three
/// families: the request never completed (transport), the server refused it
/// (authentication / API errors), or the body was not what we expected
/// (deserialization). `itch-core` maps these into its own taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// API key missing, revoked or rejected.
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Proxy configuration could not be applied to the HTTP client.
    #[error("Invalid proxy '{proxy}': {reason}")]
    Proxy { proxy: String, reason: String },

    // ── API ─────────────────────────────────────────────────────────
    /// The server answered with an error status or an `{"errors": [...]}`
    /// envelope.
    #[error("API error (HTTP {status}): {}", .errors.join(", "))]
    Api { status: u16, errors: Vec<String> },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if re-authenticating might resolve this error.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }

    /// Returns `true` if the request never reached a server answer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::InvalidUrl(_) | Self::Proxy { .. })
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }
}
