// ── Watcher ──
//
// Routes each action to the reactors registered for its kind. The store's
// reducer runs first, then every matching reactor is started in
// registration order and driven concurrently. A failing or panicking
// reactor is logged here and affects nothing else.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, join_all};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::action::{Action, ActionKind, ActionPayload};
use crate::error::CoreError;
use crate::store::Store;

type Reactor = Arc<dyn Fn(Store, Action) -> BoxFuture<'static, Result<(), CoreError>> + Send + Sync>;

#[derive(Default)]
pub struct Watcher {
    reactors: HashMap<ActionKind, Vec<Reactor>>,
}

impl Watcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for the action kind carrying payload `P`.
    pub fn on<P, F, Fut>(&mut self, handler: F) -> &mut Self
    where
        P: ActionPayload,
        F: Fn(Store, P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), CoreError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let reactor: Reactor = Arc::new(
            move |store: Store, action: Action| -> BoxFuture<'static, Result<(), CoreError>> {
                let handler = Arc::clone(&handler);
                Box::pin(async move {
                    match P::from_action(action) {
                        Some(payload) => handler(store, payload).await,
                        None => Err(CoreError::HandlerFailure {
                            message: format!("action routed to a {} reactor", P::KIND),
                        }),
                    }
                })
            },
        );
        self.reactors.entry(P::KIND).or_default().push(reactor);
        self
    }

    /// Number of reactors registered for `kind`.
    pub fn reactor_count(&self, kind: ActionKind) -> usize {
        self.reactors.get(&kind).map_or(0, Vec::len)
    }

    /// Process actions until the queue closes or `cancel` fires.
    pub async fn run(
        self: Arc<Self>,
        store: Store,
        mut actions: mpsc::UnboundedReceiver<Action>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                action = actions.recv() => {
                    let Some(action) = action else { break };
                    store.reduce(&action);
                    self.route(&store, action);
                }
            }
        }
        debug!("watcher stopped");
    }

    /// Start every reactor for `action` and settle it once all are done.
    fn route(&self, store: &Store, action: Action) {
        let kind = action.kind();
        let Some(reactors) = self.reactors.get(&kind).filter(|r| !r.is_empty()) else {
            trace!(action = %kind, "no reactors");
            store.settle();
            return;
        };

        trace!(action = %kind, reactors = reactors.len(), "routing");
        let runs: Vec<_> = reactors
            .iter()
            .map(|reactor| {
                let run = reactor(store.clone(), action.clone());
                async move {
                    match AssertUnwindSafe(run).catch_unwind().await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => error!(action = %kind, error = %e, "reactor failed"),
                        Err(panic) => error!(
                            action = %kind,
                            panic = panic_message(panic.as_ref()),
                            "reactor panicked"
                        ),
                    }
                }
            })
            .collect();

        let store = store.clone();
        tokio::spawn(async move {
            join_all(runs).await;
            store.settle();
        });
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
