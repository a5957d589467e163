// ── Engine ──
//
// Wires the store, watcher, reactors and services together and runs the
// watcher loop on the current tokio runtime.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::action::{Action, FetchReason, TabId};
use crate::config::CoreConfig;
use crate::context::{HttpApiProvider, Services};
use crate::db::Db;
use crate::error::CoreError;
use crate::reactors::{self, FetchScheduler};
use crate::session::Session;
use crate::store::Store;
use crate::watcher::Watcher;

/// A running sync engine.
pub struct Engine {
    store: Store,
    services: Services,
    scheduler: Arc<FetchScheduler>,
    cancel: CancellationToken,
    watcher: JoinHandle<()>,
}

impl Engine {
    /// Start an engine talking to the real API. Must be called from within a
    /// tokio runtime.
    pub fn start(config: CoreConfig) -> Result<Self, CoreError> {
        let api = HttpApiProvider::new(&config)?;
        Ok(Self::start_with(Services::new(config, Arc::new(api))))
    }

    /// Start an engine around pre-built services.
    pub fn start_with(services: Services) -> Self {
        Self::start_with_reactors(services, |_| {})
    }

    /// Like [`start_with`](Self::start_with), registering `extra` reactors
    /// after the built-in ones.
    pub fn start_with_reactors(services: Services, extra: impl FnOnce(&mut Watcher)) -> Self {
        let (store, actions) = Store::new();
        let mut watcher = Watcher::new();
        let scheduler = reactors::register_all(&mut watcher, &services);
        extra(&mut watcher);
        Self::spawn(store, actions, watcher, services, scheduler)
    }

    fn spawn(
        store: Store,
        actions: tokio::sync::mpsc::UnboundedReceiver<Action>,
        watcher: Watcher,
        services: Services,
        scheduler: Arc<FetchScheduler>,
    ) -> Self {
        let cancel = CancellationToken::new();
        let watcher = tokio::spawn(Arc::new(watcher).run(store.clone(), actions, cancel.clone()));
        info!("engine started");
        Self {
            store,
            services,
            scheduler,
            cancel,
            watcher,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn db(&self) -> &Arc<Db> {
        &self.services.db
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.services.session
    }

    pub fn scheduler(&self) -> &Arc<FetchScheduler> {
        &self.scheduler
    }

    pub fn dispatch(&self, action: impl Into<Action>) {
        self.store.dispatch(action);
    }

    /// Fetch `tab` in the foreground, surfacing remote failures too.
    pub async fn fetch_now(&self, tab: TabId, reason: FetchReason) -> Result<(), CoreError> {
        self.scheduler.fetch_now(self.store.clone(), tab, reason).await
    }

    /// Wait until every dispatched action has been handled.
    pub async fn settled(&self) {
        self.store.settled().await;
    }

    /// Stop the watcher loop. Reactors already running finish on their own.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.watcher.await {
            debug!(error = %e, "watcher task ended abnormally");
        }
        info!("engine stopped");
    }
}
