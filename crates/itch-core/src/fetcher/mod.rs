// ── Fetchers ──
//
// A fetcher reconciles one tab's view with the cache and, when the trigger
// warrants it, with the remote API. The UI only ever sees data re-derived
// from the cache: `remote` writes, `push_local` reads and pushes.

mod collection;
mod collections;
mod game;
mod lazy;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::action::{FetchReason, PushPayload, TabDataFetched, TabId};
use crate::context::Context;
use crate::db::Record;
use crate::error::CoreError;
use crate::model::EntityId;

pub use collection::CollectionFetcher;
pub use collections::CollectionsFetcher;
pub use game::GameFetcher;
pub use lazy::lazy_get_game;

/// Lifecycle of one fetch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "camelCase")]
pub enum FetcherState {
    Idle,
    RunningLocal,
    RunningRemote,
    Done,
    Failed,
}

// ── FetchTask ───────────────────────────────────────────────────────

/// One fetch run for one tab, created per trigger.
pub struct FetchTask {
    ctx: Context,
    tab: TabId,
    reason: FetchReason,
    generation: u64,
    state: FetcherState,
}

impl FetchTask {
    pub fn new(ctx: Context, tab: TabId, reason: FetchReason, generation: u64) -> Self {
        Self {
            ctx,
            tab,
            reason,
            generation,
            state: FetcherState::Idle,
        }
    }

    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    pub fn tab(&self) -> &TabId {
        &self.tab
    }

    pub fn reason(&self) -> FetchReason {
        self.reason
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> FetcherState {
        self.state
    }

    fn transition(&mut self, next: FetcherState) {
        trace!(tab = %self.tab, from = %self.state, to = %next, "fetcher state");
        self.state = next;
    }

    /// Send view data for this tab, tagged with this run's generation.
    pub fn push(&self, data: PushPayload) {
        self.ctx.store().dispatch(TabDataFetched {
            tab: self.tab.clone(),
            generation: self.generation,
            data,
        });
    }
}

// ── Fetcher ─────────────────────────────────────────────────────────

pub trait Fetcher: Send + Sync {
    fn task(&self) -> &FetchTask;

    fn task_mut(&mut self) -> &mut FetchTask;

    /// Derive view data from the cache and push it.
    fn push_local(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    /// Fetch from the API, normalize, and write the cache in one batch.
    fn remote(&self) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn warrants_remote(&self, reason: FetchReason) -> bool {
        reason.warrants_remote()
    }

    /// `push_local`, then `remote` and `push_local` again if the reason
    /// warrants it. A remote failure leaves the first push standing.
    fn work(&mut self) -> impl Future<Output = Result<(), CoreError>> + Send {
        async move {
            self.task_mut().transition(FetcherState::RunningLocal);
            if let Err(e) = self.push_local().await {
                self.task_mut().transition(FetcherState::Failed);
                return Err(e);
            }

            if self.warrants_remote(self.task().reason()) {
                self.task_mut().transition(FetcherState::RunningRemote);
                if let Err(e) = self.remote().await {
                    self.task_mut().transition(FetcherState::Failed);
                    return Err(e);
                }

                self.task_mut().transition(FetcherState::RunningLocal);
                if let Err(e) = self.push_local().await {
                    self.task_mut().transition(FetcherState::Failed);
                    return Err(e);
                }
            }

            self.task_mut().transition(FetcherState::Done);
            Ok(())
        }
    }
}

// ── Tab routing ─────────────────────────────────────────────────────

/// The fetcher responsible for a tab.
pub enum TabFetcher {
    Collections(CollectionsFetcher),
    Collection(CollectionFetcher),
    Game(GameFetcher),
}

impl TabFetcher {
    /// Pick the fetcher for `task`'s tab. `None` for tabs without remote
    /// data.
    pub fn for_task(task: FetchTask) -> Option<Self> {
        let (kind, rest) = task.tab().split();
        match (kind, rest.map(str::parse::<i64>)) {
            ("collections", None) => Some(Self::Collections(CollectionsFetcher::new(task))),
            ("collections", Some(Ok(id))) => Some(Self::Collection(CollectionFetcher::new(task, id))),
            ("games", Some(Ok(id))) => Some(Self::Game(GameFetcher::new(task, id))),
            _ => {
                debug!(tab = %task.tab(), "no fetcher for tab");
                None
            }
        }
    }

    /// Whether `tab` has a fetcher at all.
    pub fn handles(tab: &TabId) -> bool {
        let (kind, rest) = tab.split();
        match (kind, rest.map(str::parse::<i64>)) {
            ("collections", None | Some(Ok(_))) | ("games", Some(Ok(_))) => true,
            _ => false,
        }
    }

    pub async fn work(&mut self) -> Result<(), CoreError> {
        match self {
            Self::Collections(f) => f.work().await,
            Self::Collection(f) => f.work().await,
            Self::Game(f) => f.work().await,
        }
    }

    pub fn task(&self) -> &FetchTask {
        match self {
            Self::Collections(f) => f.task(),
            Self::Collection(f) => f.task(),
            Self::Game(f) => f.task(),
        }
    }

    pub fn state(&self) -> FetcherState {
        self.task().state()
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Key cache rows by id for a push `set`.
pub(crate) fn index_by_id(rows: Vec<Arc<Record>>) -> BTreeMap<EntityId, Record> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(EntityId::from_value)?;
            Some((id, Arc::unwrap_or_clone(row)))
        })
        .collect()
}

/// Drop repeated ids, keeping first occurrences in order.
pub(crate) fn dedup_ids(ids: impl IntoIterator<Item = EntityId>) -> Vec<EntityId> {
    let mut seen = std::collections::BTreeSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}
