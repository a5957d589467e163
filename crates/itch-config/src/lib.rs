//! Shared configuration for the itch tools.
//!
//! TOML profiles, API key resolution (flag, env, keyring, plaintext) and
//! translation to `itch_core::CoreConfig`. The engine never sees these
//! types: it receives a finished `CoreConfig` and a key.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use itch_core::CoreConfig;
use itch_core::config::{DEFAULT_COLLECTION_PAGE_LIMIT, DEFAULT_GAMES_SHOWN_PER_COLLECTION};

/// Service name under which API keys live in the system keyring.
pub const KEYRING_SERVICE: &str = "itch";

/// Prefix of environment variables merged over the config file.
pub const ENV_PREFIX: &str = "ITCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named on the command line.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default = "default_games_shown")]
    pub games_shown_per_collection: usize,

    #[serde(default = "default_page_limit")]
    pub collection_page_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            games_shown_per_collection: default_games_shown(),
            collection_page_limit: default_page_limit(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}
fn default_games_shown() -> usize {
    DEFAULT_GAMES_SHOWN_PER_COLLECTION
}
fn default_page_limit() -> u32 {
    DEFAULT_COLLECTION_PAGE_LIMIT
}

/// A named account profile. Every field falls back to `[defaults]` or the
/// built-in value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL (e.g. "https://api.itch.io").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// API key (plaintext, prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_shown_per_collection: Option<usize>,
}

impl Config {
    /// Active profile name: the explicit choice, then `default_profile`.
    pub fn active_profile_name(&self, explicit: Option<&str>) -> String {
        explicit
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Comma-separated profile names, for error messages.
    pub fn available_profiles(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".into()
        } else {
            self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "itch", "itch").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("itch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    debug!(path = %path.display(), profiles = config.profiles.len(), "loaded config");
    Ok(config)
}

/// Load config, falling back to the defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to the canonical path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve an API key: explicit value, then the profile's `api_key_env`,
/// then the system keyring, then plaintext in the config.
pub fn resolve_api_key(
    profile: Option<&Profile>,
    profile_name: &str,
    explicit: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. Flag (or the env var clap bound to it)
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(SecretString::from(key.to_owned()));
    }

    // 2. Profile's api_key_env → env var lookup
    if let Some(env_name) = profile.and_then(|p| p.api_key_env.as_deref()) {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
        debug!(var = env_name, "api_key_env is not set");
    }

    // 3. System keyring
    if let Ok(secret) = keyring_entry(profile_name).and_then(|e| e.get_password()) {
        return Ok(SecretString::from(secret));
    }

    // 4. Plaintext in config
    if let Some(key) = profile.and_then(|p| p.api_key.clone()) {
        return Ok(SecretString::from(key));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's API key in the system keyring.
pub fn store_api_key(profile_name: &str, key: &SecretString) -> Result<(), ConfigError> {
    if key.expose_secret().is_empty() {
        return Err(ConfigError::Validation {
            field: "api_key".into(),
            reason: "API key cannot be empty".into(),
        });
    }
    keyring_entry(profile_name)?.set_password(key.expose_secret())?;
    Ok(())
}

// ── Translation to CoreConfig ───────────────────────────────────────

/// Command-line values that win over the profile.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub timeout: Option<u64>,
}

/// Build the engine configuration for `profile` (if any) on top of
/// `[defaults]`, with `overrides` applied last.
pub fn to_core_config(
    config: &Config,
    profile: Option<&Profile>,
    overrides: &Overrides,
) -> Result<CoreConfig, ConfigError> {
    let defaults = &config.defaults;

    let api_url = overrides
        .api_url
        .as_deref()
        .or_else(|| profile.and_then(|p| p.api_url.as_deref()))
        .map(parse_api_url)
        .transpose()?;

    let timeout = overrides
        .timeout
        .or_else(|| profile.and_then(|p| p.timeout))
        .unwrap_or(defaults.timeout);
    if timeout == 0 {
        return Err(ConfigError::Validation {
            field: "timeout".into(),
            reason: "must be at least one second".into(),
        });
    }

    Ok(CoreConfig {
        api_url,
        timeout: Duration::from_secs(timeout),
        user_agent: profile.and_then(|p| p.user_agent.clone()),
        games_shown_per_collection: profile
            .and_then(|p| p.games_shown_per_collection)
            .unwrap_or(defaults.games_shown_per_collection),
        collection_page_limit: defaults.collection_page_limit,
    })
}

fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL: {raw}"),
    })
}
