// ── Core error types ──
//
// The taxonomy every reactor and fetcher speaks. Consumers never see HTTP
// status codes or reqwest errors directly: the `From<itch_api::Error>` impl
// folds transport-layer failures into the remote categories below.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Remote errors (abort only a fetcher's remote phase) ──────────
    #[error("Not authenticated: {message}")]
    NotAuthenticated { message: String },

    #[error("Network failure: {reason}")]
    NetworkFailure { reason: String },

    #[error("Remote API rejected the request (HTTP {}): {message}", .status.map_or_else(|| "-".to_string(), |s| s.to_string()))]
    RemoteRejected {
        message: String,
        status: Option<u16>,
    },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    // ── Local errors ─────────────────────────────────────────────────
    /// The cache could not answer or apply a write. Always surfaced.
    #[error("Storage failure: {message}")]
    StorageFailure { message: String },

    /// A reactor failed for a reason not covered above.
    #[error("Handler failure: {message}")]
    HandlerFailure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub(crate) fn not_authenticated() -> Self {
        Self::NotAuthenticated {
            message: "no active session".into(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
        }
    }

    /// Errors raised by the remote boundary. These leave the local view
    /// standing; the triggering reactor decides what to do with them.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated { .. }
                | Self::NetworkFailure { .. }
                | Self::RemoteRejected { .. }
                | Self::MalformedResponse { .. }
        )
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::StorageFailure { .. })
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<itch_api::Error> for CoreError {
    fn from(err: itch_api::Error) -> Self {
        match err {
            itch_api::Error::Authentication { message } => CoreError::NotAuthenticated { message },
            itch_api::Error::Transport(ref e) => match e.status() {
                Some(status) => CoreError::RemoteRejected {
                    message: e.to_string(),
                    status: Some(status.as_u16()),
                },
                None => CoreError::NetworkFailure {
                    reason: e.to_string(),
                },
            },
            itch_api::Error::InvalidUrl(e) => CoreError::NetworkFailure {
                reason: format!("invalid URL: {e}"),
            },
            itch_api::Error::Proxy { proxy, reason } => CoreError::NetworkFailure {
                reason: format!("proxy {proxy}: {reason}"),
            },
            itch_api::Error::Api { status, errors } => CoreError::RemoteRejected {
                message: errors.join(", "),
                status: Some(status),
            },
            itch_api::Error::Deserialization { message, body: _ } => {
                CoreError::MalformedResponse { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_to_remote_categories() {
        let auth: CoreError = itch_api::Error::Authentication {
            message: "invalid key".into(),
        }
        .into();
        assert!(matches!(auth, CoreError::NotAuthenticated { .. }));

        let rejected: CoreError = itch_api::Error::Api {
            status: 500,
            errors: vec!["boom".into()],
        }
        .into();
        assert!(matches!(
            rejected,
            CoreError::RemoteRejected {
                status: Some(500),
                ..
            }
        ));

        let malformed: CoreError = itch_api::Error::Deserialization {
            message: "eof".into(),
            body: String::new(),
        }
        .into();
        assert!(malformed.is_remote());
    }

    #[test]
    fn storage_is_not_remote() {
        let err = CoreError::storage("disk on fire");
        assert!(err.is_storage());
        assert!(!err.is_remote());
        assert_eq!(err.to_string(), "Storage failure: disk on fire");
    }
}
