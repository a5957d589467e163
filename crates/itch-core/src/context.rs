// ── Operation context ──
//
// Everything a reactor or fetcher needs for one operation: the store to
// dispatch into, the cache, the session and a way to reach the API. Built
// per operation from the long-lived `Services`.

use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use itch_api::{DEFAULT_BASE_URL, ItchApi, ItchClient, TransportConfig};
use secrecy::SecretString;
use tracing::{debug, info};
use url::Url;

use crate::action::ProxySettings;
use crate::config::CoreConfig;
use crate::db::Db;
use crate::error::CoreError;
use crate::session::{Credentials, Session};
use crate::store::Store;

// ── ApiProvider ─────────────────────────────────────────────────────

/// Builds authenticated API clients.
pub trait ApiProvider: Send + Sync {
    /// A client acting on behalf of the owner of `key`.
    fn client(&self, key: &SecretString) -> Result<Arc<dyn ItchApi>, itch_api::Error>;

    /// Route later clients through the given proxy.
    fn apply_proxy(&self, settings: &ProxySettings) -> Result<(), itch_api::Error>;
}

/// [`ApiProvider`] backed by [`ItchClient`].
pub struct HttpApiProvider {
    base_url: Url,
    transport: ArcSwap<TransportConfig>,
}

impl HttpApiProvider {
    pub fn new(config: &CoreConfig) -> Result<Self, itch_api::Error> {
        let base_url = match config.api_url {
            Some(ref url) => url.clone(),
            None => Url::parse(DEFAULT_BASE_URL)?,
        };
        Ok(Self {
            base_url,
            transport: ArcSwap::from_pointee(config.transport()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

impl ApiProvider for HttpApiProvider {
    fn client(&self, key: &SecretString) -> Result<Arc<dyn ItchApi>, itch_api::Error> {
        let transport = self.transport.load();
        let client = ItchClient::new(self.base_url.clone(), key.clone(), &transport)?;
        Ok(Arc::new(client))
    }

    fn apply_proxy(&self, settings: &ProxySettings) -> Result<(), itch_api::Error> {
        let Some(ref proxy) = settings.proxy else {
            debug!("no explicit proxy, keeping system defaults");
            return Ok(());
        };

        // Env proxies are often written without a scheme.
        let spec = if proxy.contains("://") {
            proxy.clone()
        } else {
            format!("http://{proxy}")
        };
        let url = Url::parse(&spec).map_err(|e| itch_api::Error::Proxy {
            proxy: proxy.clone(),
            reason: e.to_string(),
        })?;

        let next = (**self.transport.load()).clone().with_proxy(url);
        // Fail here rather than on the first request.
        next.build_client()?;
        self.transport.store(Arc::new(next));
        info!(proxy = %proxy, source = %settings.source, "proxy applied");
        Ok(())
    }
}

// ── Services ────────────────────────────────────────────────────────

/// Long-lived engine services shared by every reactor.
#[derive(Clone)]
pub struct Services {
    pub db: Arc<Db>,
    pub session: Arc<Session>,
    pub api: Arc<dyn ApiProvider>,
    pub config: Arc<CoreConfig>,
}

impl Services {
    /// Fresh cache and session around the given API provider.
    pub fn new(config: CoreConfig, api: Arc<dyn ApiProvider>) -> Self {
        Self {
            db: Arc::new(Db::new()),
            session: Arc::new(Session::new()),
            api,
            config: Arc::new(config),
        }
    }
}

// ── Context ─────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Context {
    store: Store,
    services: Services,
}

impl Context {
    pub fn new(store: Store, services: &Services) -> Self {
        Self {
            store,
            services: services.clone(),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn db(&self) -> &Db {
        &self.services.db
    }

    pub fn session(&self) -> &Session {
        &self.services.session
    }

    pub fn config(&self) -> &CoreConfig {
        &self.services.config
    }

    /// The current credentials, or `NotAuthenticated`.
    pub fn ensure_credentials(&self) -> Result<Arc<Credentials>, CoreError> {
        self.services
            .session
            .current()
            .ok_or_else(CoreError::not_authenticated)
    }

    /// Run `f` against an API client authenticated as the current user.
    ///
    /// Transport and API failures come back as the remote error categories.
    pub async fn with_api<T, F, Fut>(&self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Arc<dyn ItchApi>) -> Fut,
        Fut: Future<Output = Result<T, itch_api::Error>>,
    {
        let credentials = self.ensure_credentials()?;
        let api = self.services.api.client(&credentials.key)?;
        Ok(f(api).await?)
    }
}
