// ── Engine configuration ──
//
// Runtime tuning for the sync engine. Built by the caller (usually from
// `itch-config`); the core never reads files or the environment for it.

use std::time::Duration;

use itch_api::TransportConfig;
use url::Url;

/// How many games of each collection the collections tab shows.
pub const DEFAULT_GAMES_SHOWN_PER_COLLECTION: usize = 8;

/// Upper bound on `collection-games` pages fetched for one collection.
pub const DEFAULT_COLLECTION_PAGE_LIMIT: u32 = 20;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// API endpoint. `None` uses the production server.
    pub api_url: Option<Url>,
    /// Request timeout.
    pub timeout: Duration,
    /// `User-Agent` override.
    pub user_agent: Option<String>,
    pub games_shown_per_collection: usize,
    pub collection_page_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            timeout: Duration::from_secs(30),
            user_agent: None,
            games_shown_per_collection: DEFAULT_GAMES_SHOWN_PER_COLLECTION,
            collection_page_limit: DEFAULT_COLLECTION_PAGE_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Transport settings for HTTP clients built from this config.
    pub fn transport(&self) -> TransportConfig {
        let mut transport = TransportConfig {
            timeout: self.timeout,
            ..TransportConfig::default()
        };
        if let Some(ref ua) = self.user_agent {
            transport.user_agent.clone_from(ua);
        }
        transport
    }
}
