// Shared transport configuration for building reqwest::Client instances.
//
// Timeout, user agent and proxy settings live here so every client built
// during a session agrees on them.

use std::time::Duration;

use url::Url;

use crate::error::Error;

const DEFAULT_USER_AGENT: &str = concat!("itch-sync/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Explicit proxy. `None` lets reqwest fall back to its own detection.
    pub proxy: Option<Url>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.into(),
            proxy: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone());

        if let Some(ref proxy) = self.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str()).map_err(|e| Error::Proxy {
                proxy: proxy.to_string(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        builder.build().map_err(Error::Transport)
    }

    /// Same config, routed through the given proxy.
    pub fn with_proxy(mut self, proxy: Url) -> Self {
        self.proxy = Some(proxy);
        self
    }
}
