// ── Response schemas ──
//
// Declarative shapes of remote payloads: which subtrees are entities, which
// table they belong to, and where nested entities hide inside them.

use std::sync::Arc;

use crate::db::TableName;

/// A node of a response schema.
#[derive(Debug, Clone)]
pub enum Schema {
    /// An entity stored in its own table and replaced by its id.
    Entity(Arc<EntitySchema>),
    /// A list whose elements all follow the inner schema.
    ArrayOf(Box<Schema>),
    /// A plain object with some keys following a schema. Unlisted keys are
    /// copied through.
    Object(Vec<(String, Schema)>),
}

#[derive(Debug)]
pub struct EntitySchema {
    pub table: TableName,
    pub id_attribute: String,
    /// Keys (as sent by the server) holding nested entities.
    pub relations: Vec<(String, Schema)>,
}

impl Schema {
    pub fn entity(table: TableName, relations: Vec<(&str, Schema)>) -> Self {
        Self::Entity(Arc::new(EntitySchema {
            table,
            id_attribute: "id".into(),
            relations: relations
                .into_iter()
                .map(|(k, s)| (k.to_owned(), s))
                .collect(),
        }))
    }

    pub fn array_of(inner: Schema) -> Self {
        Self::ArrayOf(Box::new(inner))
    }

    pub fn object(fields: Vec<(&str, Schema)>) -> Self {
        Self::Object(fields.into_iter().map(|(k, s)| (k.to_owned(), s)).collect())
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::Entity(_) => "an entity object",
            Self::ArrayOf(_) => "an array",
            Self::Object(_) => "an object",
        }
    }
}

// ── itch.io schemas ─────────────────────────────────────────────────

pub fn user() -> Schema {
    Schema::entity(TableName::Users, Vec::new())
}

pub fn game() -> Schema {
    Schema::entity(TableName::Games, vec![("user", user())])
}

pub fn collection() -> Schema {
    Schema::entity(TableName::Collections, vec![("games", Schema::array_of(game()))])
}

/// One entry of a collection's game listing: `{position, game}`.
pub fn collection_game() -> Schema {
    Schema::object(vec![("game", game())])
}
