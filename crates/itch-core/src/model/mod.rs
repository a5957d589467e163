// ── Domain model ──
//
// Typed views over cache rows. Rows are stored as camelCase JSON objects;
// these structs are what fetchers and reactors read them back as.

pub mod entity_id;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::TableName;
use crate::db::json_field;

pub use entity_id::EntityId;

/// A typed row of one cache table.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: TableName;

    fn id(&self) -> &EntityId;
}

// ── Game ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Entity for Game {
    const TABLE: TableName = TableName::Games;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ── Collection ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: EntityId,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    /// JSON-encoded list of game ids, in collection order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_ids: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Collection {
    pub fn game_ids(&self) -> Vec<EntityId> {
        json_field::decode(self.game_ids.as_deref(), Vec::new())
    }
}

impl Entity for Collection {
    const TABLE: TableName = TableName::Collections;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ── Profile ─────────────────────────────────────────────────────────

/// Local-only record of the logged-in account: which collections are
/// "mine", in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<EntityId>,
    /// JSON-encoded list of collection ids.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_collection_ids: Option<String>,
}

impl Profile {
    pub fn my_collection_ids(&self) -> Vec<EntityId> {
        json_field::decode(self.my_collection_ids.as_deref(), Vec::new())
    }
}

impl Entity for Profile {
    const TABLE: TableName = TableName::Profiles;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ── User ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl Entity for User {
    const TABLE: TableName = TableName::Users;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

// ── Cave ────────────────────────────────────────────────────────────

/// A local installation of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cave {
    pub id: EntityId,
    pub game_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_size: Option<i64>,
}

impl Entity for Cave {
    const TABLE: TableName = TableName::Caves;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
