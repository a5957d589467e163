//! Scripted API fakes and engine helpers shared by the engine tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use itch_api::{Error as ApiError, ItchApi};
use itch_core::action::{AttemptLogin, ProxySettings, TabDataFetched};
use itch_core::{ApiProvider, CoreConfig, Engine, Services};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::Semaphore;

pub const API_KEY: &str = "test-key";
pub const ME_ID: i64 = 42;

// ── FakeApi ─────────────────────────────────────────────────────────

/// An `ItchApi` answering from a route table. Unknown routes are 404s.
#[derive(Default)]
pub struct FakeApi {
    routes: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<String>>,
    gates: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let api = Arc::new(Self::default());
        api.route(
            "me",
            json!({"user": {"id": ME_ID, "username": "amos", "display_name": "Amos"}}),
        );
        api
    }

    pub fn route(&self, route: &str, body: Value) {
        self.routes.lock().unwrap().insert(route.to_owned(), body);
    }

    pub fn unroute(&self, route: &str) {
        self.routes.lock().unwrap().remove(route);
    }

    /// Make calls to `route` wait for a permit on the returned semaphore.
    pub fn gate(&self, route: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.gates
            .lock()
            .unwrap()
            .insert(route.to_owned(), Arc::clone(&gate));
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, route: &str) -> usize {
        self.calls().iter().filter(|c| *c == route).count()
    }

    fn answer(&self, route: String) -> BoxFuture<'_, Result<Value, ApiError>> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(route.clone());
            let gate = self.gates.lock().unwrap().get(&route).cloned();
            if let Some(gate) = gate {
                gate.acquire().await.unwrap().forget();
            }
            let body = self.routes.lock().unwrap().get(&route).cloned();
            match body {
                Some(body) => Ok(body),
                None if route == "me" => Err(ApiError::Authentication {
                    message: "invalid key".into(),
                }),
                None => Err(ApiError::Api {
                    status: 404,
                    errors: vec!["not found".into()],
                }),
            }
        })
    }
}

impl ItchApi for FakeApi {
    fn me(&self) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.answer("me".into())
    }

    fn my_collections(&self) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.answer("my_collections".into())
    }

    fn collection(&self, collection_id: i64) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.answer(format!("collection/{collection_id}"))
    }

    fn collection_games(
        &self,
        collection_id: i64,
        page: u32,
    ) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.answer(format!("collection_games/{collection_id}/{page}"))
    }

    fn game(&self, game_id: i64) -> BoxFuture<'_, Result<Value, ApiError>> {
        self.answer(format!("game/{game_id}"))
    }
}

// ── FakeProvider ────────────────────────────────────────────────────

pub struct FakeProvider {
    pub api: Arc<FakeApi>,
    pub proxies: Mutex<Vec<ProxySettings>>,
}

impl FakeProvider {
    pub fn new(api: Arc<FakeApi>) -> Arc<Self> {
        Arc::new(Self {
            api,
            proxies: Mutex::new(Vec::new()),
        })
    }
}

impl ApiProvider for FakeProvider {
    fn client(&self, key: &SecretString) -> Result<Arc<dyn ItchApi>, ApiError> {
        if key.expose_secret() != API_KEY {
            return Err(ApiError::Authentication {
                message: "invalid key".into(),
            });
        }
        Ok(Arc::clone(&self.api) as Arc<dyn ItchApi>)
    }

    fn apply_proxy(&self, settings: &ProxySettings) -> Result<(), ApiError> {
        self.proxies.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

// ── Engine helpers ──────────────────────────────────────────────────

pub fn config() -> CoreConfig {
    CoreConfig {
        games_shown_per_collection: 2,
        ..CoreConfig::default()
    }
}

pub fn services(api: &Arc<FakeApi>) -> Services {
    Services::new(config(), FakeProvider::new(Arc::clone(api)))
}

/// Engine that also records every push it routes.
pub fn engine(api: &Arc<FakeApi>) -> (Engine, Arc<Mutex<Vec<TabDataFetched>>>) {
    let pushes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&pushes);
    let engine = Engine::start_with_reactors(services(api), move |watcher| {
        watcher.on(move |_, push: TabDataFetched| {
            sink.lock().unwrap().push(push);
            std::future::ready(Ok(()))
        });
    });
    (engine, pushes)
}

pub async fn settle(engine: &Engine) {
    tokio::time::timeout(Duration::from_secs(5), engine.settled())
        .await
        .expect("engine did not settle");
}

pub async fn login(engine: &Engine) {
    engine.dispatch(AttemptLogin {
        api_key: SecretString::from(API_KEY),
    });
    settle(engine).await;
    assert!(engine.session().is_logged_in(), "login failed");
}
