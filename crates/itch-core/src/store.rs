// ── Store ──
//
// Action intake and derived view state. `dispatch` queues an action for the
// watcher; the watcher reduces it into `ViewState` before any reactor sees
// it. Presentation renders from `ViewState` snapshots.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, warn};

use crate::action::{
    Action, Modal, PushPayload, ProxySettings, QueueCaveReinstall, QueueCaveUninstall, TabId,
};
use crate::model::{EntityId, User};

// ── ViewState ───────────────────────────────────────────────────────

/// Status messages kept for display; older ones are dropped first.
pub const MAX_STATUS_MESSAGES: usize = 20;

/// Data pushed for one tab, tagged with the generation of the fetch run
/// that produced it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TabData {
    pub generation: u64,
    pub data: PushPayload,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaveOperation {
    Uninstall,
    Reinstall,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedCaveOperation {
    pub cave_id: EntityId,
    pub operation: CaveOperation,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    pub booted: bool,
    pub me: Option<User>,
    pub current_tab: Option<TabId>,
    pub window_focused: bool,
    pub tabs: BTreeMap<TabId, TabData>,
    pub tab_params: BTreeMap<TabId, BTreeMap<String, String>>,
    pub modals: Vec<Modal>,
    pub proxy: Option<ProxySettings>,
    pub status_messages: Vec<String>,
    pub login_errors: Vec<String>,
    pub cave_queue: Vec<QueuedCaveOperation>,
    pub quitting: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            booted: false,
            me: None,
            current_tab: None,
            window_focused: true,
            tabs: BTreeMap::new(),
            tab_params: BTreeMap::new(),
            modals: Vec::new(),
            proxy: None,
            status_messages: Vec::new(),
            login_errors: Vec::new(),
            cave_queue: Vec::new(),
            quitting: false,
        }
    }
}

impl ViewState {
    pub fn tab(&self, tab: &TabId) -> Option<&TabData> {
        self.tabs.get(tab)
    }

    /// Apply one action. Returns `false` if nothing changed.
    pub(crate) fn apply(&mut self, action: &Action) -> bool {
        match action {
            Action::Boot(_) => self.booted = true,
            Action::ProxySettingsDetected(p) => self.proxy = Some(p.settings.clone()),
            Action::LoginSucceeded(p) => {
                self.me = Some(p.me.clone());
                self.login_errors.clear();
            }
            Action::LoginFailed(p) => self.login_errors.clone_from(&p.errors),
            Action::LoggedOut(_) => {
                self.me = None;
                self.tabs.clear();
            }
            Action::TabChanged(p) => self.current_tab = Some(p.tab.clone()),
            Action::TabParamsChanged(p) => {
                self.tab_params.insert(p.tab.clone(), p.params.clone());
            }
            Action::WindowFocusChanged(p) => self.window_focused = p.focused,
            Action::TabDataFetched(p) => {
                let entry = self.tabs.entry(p.tab.clone()).or_default();
                if p.generation < entry.generation {
                    debug!(
                        tab = %p.tab,
                        generation = p.generation,
                        newest = entry.generation,
                        "dropping stale push"
                    );
                    return false;
                }
                entry.generation = p.generation;
                entry.data.absorb(p.data.clone());
            }
            Action::QueueCaveUninstall(QueueCaveUninstall { cave_id }) => {
                return self.queue_cave(cave_id, CaveOperation::Uninstall);
            }
            Action::QueueCaveReinstall(QueueCaveReinstall { cave_id }) => {
                return self.queue_cave(cave_id, CaveOperation::Reinstall);
            }
            Action::OpenModal(p) => self.modals.push(p.modal.clone()),
            Action::CloseModal(_) => return self.modals.pop().is_some(),
            Action::StatusMessage(p) => {
                if self.status_messages.len() >= MAX_STATUS_MESSAGES {
                    self.status_messages.remove(0);
                }
                self.status_messages.push(p.message.clone());
            }
            Action::Quit(_) => self.quitting = true,
            Action::Preboot(_)
            | Action::AttemptLogin(_)
            | Action::Logout(_)
            | Action::TabReloaded(_)
            | Action::RequestCaveUninstall(_) => return false,
        }
        true
    }

    /// One pending operation per cave; a later request replaces an earlier
    /// one.
    fn queue_cave(&mut self, cave_id: &EntityId, operation: CaveOperation) -> bool {
        if let Some(queued) = self.cave_queue.iter_mut().find(|q| &q.cave_id == cave_id) {
            if queued.operation == operation {
                return false;
            }
            queued.operation = operation;
            return true;
        }
        self.cave_queue.push(QueuedCaveOperation {
            cave_id: cave_id.clone(),
            operation,
        });
        true
    }
}

// ── Store ───────────────────────────────────────────────────────────

/// Handle through which actions are dispatched and view state observed.
///
/// Cheaply cloneable.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    action_tx: mpsc::UnboundedSender<Action>,
    state: watch::Sender<Arc<ViewState>>,
    /// Actions dispatched but not yet settled by the watcher.
    pending: watch::Sender<usize>,
}

impl Store {
    /// Create a store and the receiving end of its action queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Action>) {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let (state, _) = watch::channel(Arc::new(ViewState::default()));
        let (pending, _) = watch::channel(0usize);
        let store = Self {
            inner: Arc::new(StoreInner {
                action_tx,
                state,
                pending,
            }),
        };
        (store, action_rx)
    }

    /// Queue an action. Never blocks; actions are delivered in dispatch
    /// order.
    pub fn dispatch(&self, action: impl Into<Action>) {
        let action = action.into();
        let kind = action.kind();
        self.inner.pending.send_modify(|n| *n += 1);
        if self.inner.action_tx.send(action).is_err() {
            warn!(action = %kind, "action dropped: watcher has stopped");
            self.settle();
        }
    }

    /// Current view state snapshot.
    pub fn state(&self) -> Arc<ViewState> {
        Arc::clone(&self.inner.state.borrow())
    }

    /// Subscribe to view state changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.inner.state.subscribe()
    }

    /// View state changes as a `Stream`.
    pub fn state_stream(&self) -> WatchStream<Arc<ViewState>> {
        WatchStream::new(self.subscribe())
    }

    /// Resolve once every dispatched action, including follow-ups dispatched
    /// by reactors, has been handled.
    pub async fn settled(&self) {
        let mut rx = self.inner.pending.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Number of actions not yet settled.
    pub fn pending(&self) -> usize {
        *self.inner.pending.borrow()
    }

    pub(crate) fn reduce(&self, action: &Action) {
        self.inner.state.send_if_modified(|state| Arc::make_mut(state).apply(action));
    }

    pub(crate) fn settle(&self) {
        self.inner.pending.send_modify(|n| *n = n.saturating_sub(1));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::action::{
        CloseModal, LocalizedString, OpenModal, PushSlice, StatusMessage, TabDataFetched,
    };

    fn push(tab: &str, generation: u64, ids: &[i64]) -> Action {
        Action::from(TabDataFetched {
            tab: TabId::new(tab),
            generation,
            data: PushPayload::new().with(
                "games",
                PushSlice::new(
                    BTreeMap::new(),
                    ids.iter().copied().map(EntityId::Int).collect(),
                ),
            ),
        })
    }

    #[test]
    fn stale_pushes_are_dropped() {
        let (store, _rx) = Store::new();
        store.reduce(&push("collections", 2, &[1]));
        store.reduce(&push("collections", 1, &[9]));

        let state = store.state();
        let tab = state.tab(&TabId::new("collections")).unwrap();
        assert_eq!(tab.generation, 2);
        assert_eq!(tab.data.get("games").unwrap().ids, vec![EntityId::Int(1)]);
    }

    #[test]
    fn same_generation_pushes_merge() {
        let (store, _rx) = Store::new();
        store.reduce(&push("collections", 1, &[1]));
        store.reduce(&push("collections", 1, &[2]));
        let state = store.state();
        let tab = state.tab(&TabId::new("collections")).unwrap();
        assert_eq!(tab.data.get("games").unwrap().ids, vec![EntityId::Int(2)]);
    }

    #[test]
    fn modals_stack() {
        let (store, _rx) = Store::new();
        let modal = Modal {
            title: String::new(),
            message: LocalizedString::new("prompt.test"),
            buttons: Vec::new(),
        };
        store.reduce(&Action::from(OpenModal { modal }));
        assert_eq!(store.state().modals.len(), 1);
        store.reduce(&Action::from(CloseModal));
        assert!(store.state().modals.is_empty());
    }

    #[test]
    fn status_messages_are_capped() {
        let (store, _rx) = Store::new();
        for i in 0..=MAX_STATUS_MESSAGES {
            store.reduce(&Action::from(StatusMessage {
                message: format!("problem {i}"),
            }));
        }
        let state = store.state();
        assert_eq!(state.status_messages.len(), MAX_STATUS_MESSAGES);
        assert_eq!(state.status_messages[0], "problem 1");
    }

    #[test]
    fn cave_queue_keeps_latest_operation_per_cave() {
        let (store, _rx) = Store::new();
        let cave = EntityId::from("cave-1");
        store.reduce(&Action::from(QueueCaveUninstall { cave_id: cave.clone() }));
        store.reduce(&Action::from(QueueCaveUninstall { cave_id: cave.clone() }));
        store.reduce(&Action::from(QueueCaveReinstall { cave_id: cave.clone() }));

        assert_eq!(
            store.state().cave_queue,
            vec![QueuedCaveOperation {
                cave_id: cave,
                operation: CaveOperation::Reinstall,
            }]
        );
    }

    #[tokio::test]
    async fn settled_tracks_pending_dispatches() {
        let (store, mut rx) = Store::new();
        store.dispatch(CloseModal);
        assert_eq!(store.pending(), 1);

        let action = rx.recv().await.unwrap();
        assert_eq!(action.kind(), crate::action::ActionKind::CloseModal);
        store.settle();
        store.settled().await;
        assert_eq!(store.pending(), 0);
    }

    #[tokio::test]
    async fn state_stream_yields_current_then_updates() {
        use tokio_stream::StreamExt;

        let (store, _rx) = Store::new();
        let mut states = store.state_stream();
        assert!(states.next().await.unwrap().tabs.is_empty());

        store.reduce(&push("collections", 1, &[1]));
        let next = states.next().await.unwrap();
        assert!(next.tab(&TabId::new("collections")).is_some());
    }

    #[tokio::test]
    async fn dispatch_after_watcher_stops_does_not_hang() {
        let (store, rx) = Store::new();
        drop(rx);
        store.dispatch(CloseModal);
        store.settled().await;
    }
}
