//! Action-driven sync engine between the itch.io API and a local entity
//! cache.
//!
//! - **[`Watcher`]** routes every dispatched [`Action`] to the reactors
//!   registered for its kind, after the [`Store`] has reduced it into
//!   [`ViewState`].
//!
//! - **Fetchers** ([`fetcher`]) reconcile one tab's view with the cache and,
//!   when the trigger warrants it, with the remote API. A
//!   [`FetchScheduler`] keeps one run per tab in flight.
//!
//! - **[`Db`]** is the relational cache: named tables of camelCase JSON rows
//!   with merge-upsert writes. [`normalize`] flattens API payloads into it.
//!
//! - **[`Context`]** bundles the store, cache, [`Session`] and API access for
//!   one operation.

pub mod action;
pub mod config;
pub mod context;
pub mod db;
pub mod engine;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod normalize;
pub mod reactors;
pub mod session;
pub mod store;
pub mod watcher;

// ── Primary re-exports ──────────────────────────────────────────────
pub use action::{Action, ActionKind, ActionPayload, FetchReason, PushPayload, PushSlice, TabId};
pub use config::CoreConfig;
pub use context::{ApiProvider, Context, HttpApiProvider, Services};
pub use db::{Db, EntityMap, Filter, Record, TableName};
pub use engine::Engine;
pub use error::CoreError;
pub use fetcher::{Fetcher, FetcherState, lazy_get_game};
pub use model::{Cave, Collection, Entity, EntityId, Game, Profile, User};
pub use normalize::{Normalized, Schema, normalize};
pub use reactors::FetchScheduler;
pub use session::{Credentials, Session};
pub use store::{Store, TabData, ViewState};
pub use watcher::Watcher;
