//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use itch_config::ConfigError;
use itch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the itch.io API")]
    #[diagnostic(
        code(itch::connection_failed),
        help("Check your network connection, proxy variables and --api-url.\n{reason}")
    )]
    ConnectionFailed { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {reason}")]
    #[diagnostic(
        code(itch::auth_failed),
        help(
            "Verify your API key at https://itch.io/user/settings/api-keys\n\
             Then run: itch config set-key --profile {profile}"
        )
    )]
    AuthFailed { profile: String, reason: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(itch::no_credentials),
        help(
            "Pass --api-key, set ITCH_API_KEY, or store one with:\n\
             echo $KEY | itch config set-key"
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("Not found: {message}")]
    #[diagnostic(code(itch::not_found))]
    NotFound { message: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("API error ({code}): {message}")]
    #[diagnostic(code(itch::api_error))]
    ApiError { code: String, message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(itch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(itch::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error("{0}")]
    #[diagnostic(code(itch::config))]
    Config(String),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(itch::json))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NotAuthenticated { message } => CliError::AuthFailed {
                profile: "default".into(),
                reason: message,
            },
            CoreError::NetworkFailure { reason } => CliError::ConnectionFailed { reason },
            CoreError::RemoteRejected {
                message,
                status: Some(404),
            } => CliError::NotFound { message },
            CoreError::RemoteRejected { message, status } => CliError::ApiError {
                code: status.map_or_else(|| "rejected".into(), |s| s.to_string()),
                message,
            },
            CoreError::MalformedResponse { message } => CliError::ApiError {
                code: "malformed".into(),
                message,
            },
            CoreError::StorageFailure { message } => CliError::ApiError {
                code: "storage".into(),
                message,
            },
            CoreError::HandlerFailure { message } => CliError::ApiError {
                code: "internal".into(),
                message,
            },
            CoreError::Config { message } => CliError::Config(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}
