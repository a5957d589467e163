// ── Fetch scheduling ──
//
// Turns tab lifecycle actions into fetcher runs. At most one run per tab is
// in flight; triggers arriving meanwhile collapse into a single follow-up
// run carrying the latest reason.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, error, warn};

use crate::action::{
    FetchReason, LoginSucceeded, StatusMessage, TabChanged, TabId, TabParamsChanged, TabReloaded,
    WindowFocusChanged,
};
use crate::context::{Context, Services};
use crate::error::CoreError;
use crate::fetcher::{FetchTask, TabFetcher};
use crate::store::Store;
use crate::watcher::Watcher;

struct InFlight {
    /// Reason of the follow-up run, if a trigger arrived mid-fetch.
    next: Option<FetchReason>,
}

pub struct FetchScheduler {
    services: Services,
    in_flight: DashMap<TabId, InFlight>,
    generation: AtomicU64,
}

impl FetchScheduler {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            in_flight: DashMap::new(),
            generation: AtomicU64::new(0),
        }
    }

    /// Whether a fetch for `tab` is currently running.
    pub fn is_in_flight(&self, tab: &TabId) -> bool {
        self.in_flight.contains_key(tab)
    }

    /// Fetch `tab` for `reason`, or fold the trigger into the run already in
    /// flight for it.
    ///
    /// Remote failures are logged and swallowed: the local view stays up.
    /// Anything else is surfaced as a status message and returned.
    pub async fn queue(&self, store: Store, tab: TabId, reason: FetchReason) -> Result<(), CoreError> {
        if !self.services.session.is_logged_in() {
            debug!(tab = %tab, %reason, "not logged in, skipping fetch");
            return Ok(());
        }
        if !TabFetcher::handles(&tab) {
            debug!(tab = %tab, "tab has no fetcher");
            return Ok(());
        }

        match self.in_flight.entry(tab.clone()) {
            Entry::Occupied(mut e) => {
                debug!(tab = %tab, %reason, "fetch in flight, coalescing");
                e.get_mut().next = Some(reason);
                return Ok(());
            }
            Entry::Vacant(e) => {
                e.insert(InFlight { next: None });
            }
        }

        let mut reason = reason;
        let mut first_error = None;
        loop {
            if let Err(e) = self.run_once(&store, &tab, reason).await {
                first_error.get_or_insert(e);
            }

            if self
                .in_flight
                .remove_if(&tab, |_, f| f.next.is_none())
                .is_some()
            {
                break;
            }
            match self.in_flight.get_mut(&tab).and_then(|mut f| f.next.take()) {
                Some(next) => reason = next,
                None => {
                    self.in_flight.remove(&tab);
                    break;
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Run one fetch for `tab` right away and report every failure, remote
    /// ones included. For headless callers with no view to keep standing;
    /// bypasses the single-flight bookkeeping.
    pub async fn fetch_now(&self, store: Store, tab: TabId, reason: FetchReason) -> Result<(), CoreError> {
        let Some(mut fetcher) = self.fetcher(&store, &tab, reason) else {
            return Err(CoreError::HandlerFailure {
                message: format!("no fetcher for tab {tab}"),
            });
        };
        fetcher.work().await
    }

    fn fetcher(&self, store: &Store, tab: &TabId, reason: FetchReason) -> Option<TabFetcher> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = Context::new(store.clone(), &self.services);
        TabFetcher::for_task(FetchTask::new(ctx, tab.clone(), reason, generation))
    }

    async fn run_once(&self, store: &Store, tab: &TabId, reason: FetchReason) -> Result<(), CoreError> {
        let Some(mut fetcher) = self.fetcher(store, tab, reason) else {
            return Ok(());
        };

        debug!(tab = %tab, %reason, generation = fetcher.task().generation(), "fetching");
        match fetcher.work().await {
            Ok(()) => Ok(()),
            Err(e) if e.is_remote() => {
                warn!(tab = %tab, %reason, error = %e, "remote fetch failed, keeping local data");
                Ok(())
            }
            Err(e) => {
                error!(tab = %tab, %reason, error = %e, state = %fetcher.state(), "fetch failed");
                store.dispatch(StatusMessage {
                    message: format!("Could not load {tab}: {e}"),
                });
                Err(e)
            }
        }
    }
}

// ── Registration ────────────────────────────────────────────────────

pub(crate) fn register(watcher: &mut Watcher, scheduler: &Arc<FetchScheduler>) {
    let s = Arc::clone(scheduler);
    watcher.on(move |store: Store, _: LoginSucceeded| {
        fetch_current(Arc::clone(&s), store, FetchReason::Launch)
    });

    let s = Arc::clone(scheduler);
    watcher.on(move |store: Store, p: TabChanged| {
        fetch(Arc::clone(&s), store, p.tab, FetchReason::TabChanged)
    });

    let s = Arc::clone(scheduler);
    watcher.on(move |store: Store, p: TabReloaded| {
        fetch(Arc::clone(&s), store, p.tab, FetchReason::TabReloaded)
    });

    let s = Arc::clone(scheduler);
    watcher.on(move |store: Store, p: TabParamsChanged| {
        fetch(Arc::clone(&s), store, p.tab, FetchReason::TabParamsChanged)
    });

    let s = Arc::clone(scheduler);
    watcher.on(move |store: Store, p: WindowFocusChanged| {
        let s = Arc::clone(&s);
        async move {
            if !p.focused {
                return Ok(());
            }
            fetch_current(s, store, FetchReason::WindowFocused).await
        }
    });
}

async fn fetch(
    scheduler: Arc<FetchScheduler>,
    store: Store,
    tab: TabId,
    reason: FetchReason,
) -> Result<(), CoreError> {
    scheduler.queue(store, tab, reason).await
}

async fn fetch_current(
    scheduler: Arc<FetchScheduler>,
    store: Store,
    reason: FetchReason,
) -> Result<(), CoreError> {
    let Some(tab) = store.state().current_tab.clone() else {
        debug!(%reason, "no current tab");
        return Ok(());
    };
    scheduler.queue(store, tab, reason).await
}
