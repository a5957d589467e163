//! End-to-end fetcher behaviour through the engine, against a scripted API.
#![allow(clippy::unwrap_used)]

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{FakeApi, ME_ID, engine, login, settle};
use itch_core::action::{Quit, TabChanged, TabReloaded};
use itch_core::db::json_field;
use itch_core::{CoreError, Engine, EntityId, FetchReason, Filter, Store, TableName, TabId};

fn collections_tab() -> TabId {
    TabId::new("collections")
}

fn jam_picks(api: &FakeApi) {
    api.route(
        "my_collections",
        json!({"collections": [{"id": 7, "title": "Jam picks", "game_ids": [101, 102, 103]}]}),
    );
    api.route("game/101", json!({"game": {"id": 101, "title": "Overland"}}));
    api.route("game/102", json!({"game": {"id": 102, "title": "Mini Metro"}}));
}

fn ids(raw: &[i64]) -> Vec<EntityId> {
    raw.iter().copied().map(EntityId::Int).collect()
}

// ── Launch with an empty cache ──────────────────────────────────────

#[tokio::test]
async fn launch_first_push_is_empty_shape() {
    let api = FakeApi::new();
    api.route("my_collections", json!({"collections": []}));
    let (engine, pushes) = engine(&api);

    // Selected before login, so the login fetch runs with reason Launch.
    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    login(&engine).await;

    let pushes = pushes.lock().unwrap();
    assert!(!pushes.is_empty());
    assert_eq!(
        serde_json::to_value(&pushes[0].data).unwrap(),
        json!({
            "collections": {"set": {}, "ids": []},
            "games": {"set": {}, "ids": []}
        })
    );
    assert_eq!(api.call_count("my_collections"), 1);
}

// ── Remote sync ─────────────────────────────────────────────────────

#[tokio::test]
async fn remote_sync_fetches_displayed_games_eagerly() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, _) = engine(&api);
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let state = engine.store().state();
    let data = &state.tab(&collections_tab()).unwrap().data;
    let collections = data.get("collections").unwrap();
    assert_eq!(collections.ids, ids(&[7]));

    let row = collections.set.get(&EntityId::Int(7)).unwrap();
    let game_ids: Vec<EntityId> = json_field::decode_value(row.get("gameIds"), Vec::new());
    assert_eq!(game_ids, ids(&[101, 102, 103]));

    let games = data.get("games").unwrap();
    assert!(games.set.contains_key(&EntityId::Int(101)));
    assert!(games.set.contains_key(&EntityId::Int(102)));
    assert!(!games.set.contains_key(&EntityId::Int(103)));

    // Only the games on display were fetched.
    assert_eq!(api.call_count("game/101"), 1);
    assert_eq!(api.call_count("game/102"), 1);
    assert_eq!(api.call_count("game/103"), 0);
}

#[tokio::test]
async fn remote_sync_writes_back_profile_and_owner() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, _) = engine(&api);
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let db = engine.db();
    let profile = db
        .profiles()
        .find_one_by_id(&EntityId::Int(ME_ID))
        .unwrap()
        .unwrap();
    assert_eq!(profile.my_collection_ids(), ids(&[7]));

    let collection = db.collections().find_one_by_id(&EntityId::Int(7)).unwrap().unwrap();
    assert_eq!(collection.user_id, Some(EntityId::Int(ME_ID)));
    assert_eq!(collection.title, "Jam picks");
}

#[tokio::test]
async fn shared_games_are_stored_once() {
    let api = FakeApi::new();
    api.route(
        "my_collections",
        json!({"collections": [
            {"id": 1, "title": "A", "games": [{"id": 5, "title": "Shared"}, {"id": 6, "title": "Only A"}]},
            {"id": 2, "title": "B", "games": [{"id": 5, "title": "Shared, renamed"}]}
        ]}),
    );
    let (engine, _) = engine(&api);
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let games = engine.db().games().all(&Filter::All).unwrap();
    assert_eq!(games.len(), 2);
    let shared = engine
        .db()
        .games()
        .find_one_by_id(&EntityId::Int(5))
        .unwrap()
        .unwrap();
    assert_eq!(shared.title, "Shared, renamed");
    // Nothing missing, nothing fetched one by one.
    assert!(api.calls().iter().all(|c| !c.starts_with("game/")));
}

#[tokio::test]
async fn repeated_sync_leaves_cache_unchanged() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, _) = engine(&api);
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let db = engine.db();
    let versions: Vec<u64> = [TableName::Collections, TableName::Games, TableName::Profiles]
        .into_iter()
        .map(|t| db.version(t))
        .collect();
    let before = db.table(TableName::Collections).all(&Filter::All);

    engine.dispatch(TabReloaded {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let after_versions: Vec<u64> = [TableName::Collections, TableName::Games, TableName::Profiles]
        .into_iter()
        .map(|t| db.version(t))
        .collect();
    assert_eq!(versions, after_versions);
    assert_eq!(before, db.table(TableName::Collections).all(&Filter::All));
    assert_eq!(api.call_count("my_collections"), 2);
}

// ── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn remote_failure_keeps_local_view() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, pushes) = engine(&api);
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    api.unroute("my_collections");
    let pushed_before = pushes.lock().unwrap().len();
    engine.dispatch(TabReloaded {
        tab: collections_tab(),
    });
    settle(&engine).await;

    // The local push of the failed run still went out.
    assert_eq!(pushes.lock().unwrap().len(), pushed_before + 1);

    let state = engine.store().state();
    let data = &state.tab(&collections_tab()).unwrap().data;
    assert_eq!(data.get("collections").unwrap().ids, ids(&[7]));
    assert!(state.status_messages.is_empty());
}

#[tokio::test]
async fn unreadable_cache_aborts_the_fetch_and_reports_it() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, pushes) = engine(&api);
    login(&engine).await;

    let corrupt = json!({"userId": true}).as_object().unwrap().clone();
    engine
        .db()
        .save_one(TableName::Profiles, &EntityId::Int(ME_ID), corrupt)
        .unwrap();

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    assert!(
        pushes
            .lock()
            .unwrap()
            .iter()
            .all(|p| p.tab != collections_tab())
    );
    let state = engine.store().state();
    assert_eq!(state.status_messages.len(), 1);
    assert!(state.status_messages[0].contains("collections"));
    assert_eq!(api.call_count("my_collections"), 0);
}

#[tokio::test]
async fn fetches_are_skipped_when_logged_out() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, pushes) = engine(&api);

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    assert!(pushes.lock().unwrap().is_empty());
    assert!(api.calls().is_empty());
}

// ── Single flight ───────────────────────────────────────────────────

#[tokio::test]
async fn triggers_during_a_fetch_coalesce_into_one_follow_up() {
    let api = FakeApi::new();
    jam_picks(&api);
    let (engine, pushes) = engine(&api);
    login(&engine).await;

    let gate = api.gate("my_collections");
    let tab = collections_tab();
    engine.dispatch(TabReloaded { tab: tab.clone() });
    while !engine.scheduler().is_in_flight(&tab) {
        tokio::task::yield_now().await;
    }

    engine.dispatch(TabReloaded { tab: tab.clone() });
    engine.dispatch(TabReloaded { tab: tab.clone() });
    // Only the blocked fetch is left once both triggers are folded in.
    while engine.store().pending() > 1 {
        tokio::task::yield_now().await;
    }

    gate.add_permits(2);
    settle(&engine).await;

    assert_eq!(api.call_count("my_collections"), 2);
    assert!(!engine.scheduler().is_in_flight(&tab));

    let generations: Vec<u64> = pushes.lock().unwrap().iter().map(|p| p.generation).collect();
    assert!(generations.windows(2).all(|w| w[0] <= w[1]));
    let state = engine.store().state();
    assert_eq!(state.tab(&tab).unwrap().generation, *generations.last().unwrap());
}

// ── Routing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn action_without_reactors_leaves_cache_alone() {
    let api = FakeApi::new();
    let (engine, _) = engine(&api);
    login(&engine).await;

    let tables = [
        TableName::Profiles,
        TableName::Collections,
        TableName::Games,
        TableName::Users,
        TableName::Caves,
    ];
    let before: Vec<u64> = tables.iter().map(|t| engine.db().version(*t)).collect();

    engine.dispatch(Quit);
    settle(&engine).await;

    let after: Vec<u64> = tables.iter().map(|t| engine.db().version(*t)).collect();
    assert_eq!(before, after);
    assert!(engine.store().state().quitting);
}

async fn refuse(_: Store, _: TabChanged) -> Result<(), CoreError> {
    Err(CoreError::HandlerFailure {
        message: "nope".into(),
    })
}

async fn explode(_: Store, _: TabChanged) -> Result<(), CoreError> {
    panic!("reactor exploded")
}

#[tokio::test]
async fn failing_reactors_do_not_block_others() {
    let api = FakeApi::new();
    jam_picks(&api);
    let engine = Engine::start_with_reactors(common::services(&api), |watcher| {
        watcher.on(refuse).on(explode);
    });
    login(&engine).await;

    engine.dispatch(TabChanged {
        tab: collections_tab(),
    });
    settle(&engine).await;

    let state = engine.store().state();
    assert_eq!(
        state.tab(&collections_tab()).unwrap().data.get("collections").unwrap().ids,
        ids(&[7])
    );

    // Later actions are still routed.
    engine.dispatch(Quit);
    settle(&engine).await;
    assert!(engine.store().state().quitting);
    engine.shutdown().await;
}

// ── Single collection and game tabs ─────────────────────────────────

#[tokio::test]
async fn collection_tab_pages_through_games() {
    let api = FakeApi::new();
    api.route(
        "collection/7",
        json!({"collection": {"id": 7, "title": "Jam picks", "games_count": 3}}),
    );
    api.route(
        "collection_games/7/1",
        json!({"collection_games": [
            {"position": 0, "game": {"id": 103, "title": "C"}},
            {"position": 1, "game": {"id": 101, "title": "A"}}
        ]}),
    );
    api.route(
        "collection_games/7/2",
        json!({"collection_games": [{"position": 2, "game": {"id": 102, "title": "B"}}]}),
    );
    let (engine, _) = engine(&api);
    login(&engine).await;

    let tab = TabId::new("collections/7");
    engine.dispatch(TabChanged { tab: tab.clone() });
    settle(&engine).await;

    let state = engine.store().state();
    let games = state.tab(&tab).unwrap().data.get("games").unwrap().clone();
    assert_eq!(games.ids, ids(&[103, 101, 102]));
    assert_eq!(games.set.len(), 3);
    // Stopped once `games_count` entries were seen.
    assert_eq!(api.call_count("collection_games/7/3"), 0);

    let collection = engine
        .db()
        .collections()
        .find_one_by_id(&EntityId::Int(7))
        .unwrap()
        .unwrap();
    assert_eq!(collection.game_ids(), ids(&[103, 101, 102]));
}

#[tokio::test]
async fn local_only_reason_does_not_hit_the_api() {
    let api = FakeApi::new();
    api.route("game/5", json!({"game": {"id": 5, "title": "Celeste Classic"}}));
    let (engine, _) = engine(&api);
    login(&engine).await;

    let tab = TabId::new("games/5");
    engine.dispatch(itch_core::action::TabParamsChanged {
        tab: tab.clone(),
        params: [("sort".to_owned(), "title".to_owned())].into(),
    });
    settle(&engine).await;
    assert_eq!(api.call_count("game/5"), 0);

    engine.dispatch(TabChanged { tab: tab.clone() });
    settle(&engine).await;
    assert_eq!(api.call_count("game/5"), 1);

    let state = engine.store().state();
    let games = state.tab(&tab).unwrap().data.get("games").unwrap().clone();
    assert_eq!(games.ids, ids(&[5]));
    assert_eq!(
        games.set.get(&EntityId::Int(5)).unwrap().get("title"),
        Some(&json!("Celeste Classic"))
    );
}

// ── Foreground fetch ────────────────────────────────────────────────

#[tokio::test]
async fn foreground_fetch_reports_remote_failures() {
    let api = FakeApi::new();
    let (engine, _) = engine(&api);
    login(&engine).await;

    let err = engine
        .fetch_now(TabId::new("games/9"), FetchReason::TabChanged)
        .await
        .unwrap_err();
    assert!(err.is_remote());

    api.route("game/9", json!({"game": {"id": 9, "title": "Nine"}}));
    engine
        .fetch_now(TabId::new("games/9"), FetchReason::TabChanged)
        .await
        .unwrap();
    settle(&engine).await;
    let state = engine.store().state();
    let games = state.tab(&TabId::new("games/9")).unwrap().data.get("games").unwrap().clone();
    assert!(games.set.contains_key(&EntityId::Int(9)));

    let err = engine
        .fetch_now(TabId::new("library"), FetchReason::TabChanged)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::HandlerFailure { .. }));
}
