// ── Relational cache ──
//
// The local source of truth the presentation layer renders from. A fixed
// set of named tables, each an `EntityCollection` of camelCase JSON rows.
// All mutation goes through merge-upsert (`save_many` / `save_one`).

pub mod collection;
pub mod json_field;
pub mod query;

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::CoreError;
use crate::model::{Cave, Collection, Entity, EntityId, Game, Profile, User};

pub use collection::EntityCollection;
pub use query::Filter;

/// One cache row: a flat JSON object with camelCase keys.
pub type Record = serde_json::Map<String, Value>;

/// Names of the cache tables.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum TableName {
    Profiles,
    Collections,
    Games,
    Users,
    Caves,
}

// ── EntityMap ───────────────────────────────────────────────────────

/// Rows grouped by table then id: the output of normalization and the
/// input of a batched write.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EntityMap(BTreeMap<TableName, BTreeMap<EntityId, Record>>);

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a record into `(table, id)`, later fields winning.
    pub fn merge_record(&mut self, table: TableName, id: EntityId, record: Record) {
        self.0
            .entry(table)
            .or_default()
            .entry(id)
            .and_modify(|existing| existing.extend(record.clone()))
            .or_insert(record);
    }

    /// Merge every record of `other` into `self`.
    pub fn merge(&mut self, other: EntityMap) {
        for (table, rows) in other.0 {
            for (id, record) in rows {
                self.merge_record(table, id, record);
            }
        }
    }

    pub fn table(&self, table: TableName) -> Option<&BTreeMap<EntityId, Record>> {
        self.0.get(&table)
    }

    pub fn table_mut(&mut self, table: TableName) -> Option<&mut BTreeMap<EntityId, Record>> {
        self.0.get_mut(&table)
    }

    pub fn get(&self, table: TableName, id: &EntityId) -> Option<&Record> {
        self.0.get(&table).and_then(|rows| rows.get(id))
    }

    pub fn contains(&self, table: TableName, id: &EntityId) -> bool {
        self.get(table, id).is_some()
    }

    /// Total number of rows across all tables.
    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (TableName, &BTreeMap<EntityId, Record>)> {
        self.0.iter().map(|(t, rows)| (*t, rows))
    }
}

// ── Db ──────────────────────────────────────────────────────────────

/// The process-wide entity cache.
pub struct Db {
    profiles: EntityCollection,
    collections: EntityCollection,
    games: EntityCollection,
    users: EntityCollection,
    caves: EntityCollection,
}

impl Db {
    pub fn new() -> Self {
        Self {
            profiles: EntityCollection::new(TableName::Profiles),
            collections: EntityCollection::new(TableName::Collections),
            games: EntityCollection::new(TableName::Games),
            users: EntityCollection::new(TableName::Users),
            caves: EntityCollection::new(TableName::Caves),
        }
    }

    /// Untyped access to a table.
    pub fn table(&self, name: TableName) -> &EntityCollection {
        match name {
            TableName::Profiles => &self.profiles,
            TableName::Collections => &self.collections,
            TableName::Games => &self.games,
            TableName::Users => &self.users,
            TableName::Caves => &self.caves,
        }
    }

    // ── Typed accessors ──────────────────────────────────────────────

    pub fn of<T: Entity>(&self) -> Table<'_, T> {
        Table {
            collection: self.table(T::TABLE),
            _marker: PhantomData,
        }
    }

    pub fn profiles(&self) -> Table<'_, Profile> {
        self.of()
    }

    pub fn collections(&self) -> Table<'_, Collection> {
        self.of()
    }

    pub fn games(&self) -> Table<'_, Game> {
        self.of()
    }

    pub fn users(&self) -> Table<'_, User> {
        self.of()
    }

    pub fn caves(&self) -> Table<'_, Cave> {
        self.of()
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Merge-upsert every row of `entities`.
    ///
    /// The whole batch is validated before the first row is touched, so a
    /// rejected batch leaves the cache as it was. Returns the number of rows
    /// that changed.
    pub fn save_many(&self, entities: &EntityMap) -> Result<usize, CoreError> {
        for (table, rows) in entities.iter() {
            for (id, record) in rows {
                check_row_id(table, id, record)?;
            }
        }

        let mut changed = 0;
        for (table, rows) in entities.iter() {
            let collection = self.table(table);
            let before = changed;
            for (id, record) in rows {
                if collection.merge(id, record) {
                    changed += 1;
                }
            }
            if changed > before {
                collection.bump_version();
            }
            trace!(%table, rows = rows.len(), changed = changed - before, "saved rows");
        }

        debug!(rows = entities.len(), changed, "save_many");
        Ok(changed)
    }

    /// Merge-upsert a single row.
    pub fn save_one(&self, table: TableName, id: &EntityId, patch: Record) -> Result<(), CoreError> {
        check_row_id(table, id, &patch)?;
        let collection = self.table(table);
        if collection.merge(id, &patch) {
            collection.bump_version();
        }
        Ok(())
    }

    /// Current version counter of a table.
    pub fn version(&self, table: TableName) -> u64 {
        self.table(table).version()
    }
}

impl Default for Db {
    fn default() -> Self {
        Self::new()
    }
}

/// A row that carries an `id` field must agree with the key it is stored
/// under.
fn check_row_id(table: TableName, id: &EntityId, record: &Record) -> Result<(), CoreError> {
    match record.get("id") {
        None => Ok(()),
        Some(v) if EntityId::from_value(v).as_ref() == Some(id) => Ok(()),
        Some(v) => Err(CoreError::storage(format!(
            "{table}: row keyed {id} carries id {v}"
        ))),
    }
}

// ── Table ───────────────────────────────────────────────────────────

/// Typed view over one table.
pub struct Table<'a, T> {
    collection: &'a EntityCollection,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Entity> Table<'_, T> {
    pub fn find_one_by_id(&self, id: &EntityId) -> Result<Option<T>, CoreError> {
        self.collection
            .find_one_by_id(id)
            .map(|row| decode_row(self.collection.name(), &row))
            .transpose()
    }

    /// Every row matching `filter`, ordered by id.
    pub fn all(&self, filter: &Filter) -> Result<Vec<T>, CoreError> {
        self.collection
            .all(filter)
            .iter()
            .map(|row| decode_row(self.collection.name(), row))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }
}

fn decode_row<T: Entity>(table: TableName, row: &Arc<Record>) -> Result<T, CoreError> {
    serde_json::from_value(Value::Object((**row).clone()))
        .map_err(|e| CoreError::storage(format!("{table}: cannot decode row: {e}")))
}
