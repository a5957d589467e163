// A single collection tab (`collections/<id>`): the collection and all of
// its games, in collection order.

use serde_json::Value;
use tracing::debug;

use super::{FetchTask, Fetcher, dedup_ids, index_by_id};
use crate::action::{PushPayload, PushSlice};
use crate::db::{Filter, Record, TableName, json_field};
use crate::error::CoreError;
use crate::model::EntityId;
use crate::normalize::{Schema, normalize, schema};

pub struct CollectionFetcher {
    task: FetchTask,
    collection_id: i64,
}

impl CollectionFetcher {
    pub fn new(task: FetchTask, collection_id: i64) -> Self {
        Self {
            task,
            collection_id,
        }
    }
}

impl Fetcher for CollectionFetcher {
    fn task(&self) -> &FetchTask {
        &self.task
    }

    fn task_mut(&mut self) -> &mut FetchTask {
        &mut self.task
    }

    async fn push_local(&self) -> Result<(), CoreError> {
        let db = self.task.ctx().db();
        let id = EntityId::Int(self.collection_id);

        let collection = db.table(TableName::Collections).find_one_by_id(&id);
        let game_ids: Vec<EntityId> = collection
            .as_ref()
            .map(|c| json_field::decode_value(c.get("gameIds"), Vec::new()))
            .unwrap_or_default();
        let games = if game_ids.is_empty() {
            Vec::new()
        } else {
            db.table(TableName::Games).all(&Filter::id_in(&game_ids))
        };

        self.task.push(
            PushPayload::new()
                .with(
                    "collections",
                    PushSlice::new(index_by_id(collection.into_iter().collect()), vec![id]),
                )
                .with("games", PushSlice::new(index_by_id(games), game_ids)),
        );
        Ok(())
    }

    async fn remote(&self) -> Result<(), CoreError> {
        let ctx = self.task.ctx();
        let collection_id = self.collection_id;

        let raw = ctx
            .with_api(|api| async move { api.collection(collection_id).await })
            .await?;
        let mut normalized = normalize(
            &raw,
            &Schema::object(vec![("collection", schema::collection())]),
        )?;

        let id = EntityId::Int(collection_id);
        let expected = normalized
            .entities
            .get(TableName::Collections, &id)
            .and_then(|row| row.get("gamesCount"))
            .and_then(Value::as_u64);

        let page_schema =
            Schema::object(vec![("collection_games", Schema::array_of(schema::collection_game()))]);
        let mut game_ids = Vec::new();
        for page in 1..=ctx.config().collection_page_limit {
            let raw = ctx
                .with_api(|api| async move { api.collection_games(collection_id, page).await })
                .await?;
            let listing = normalize(&raw, &page_schema)?;

            let entries = listing
                .result
                .get("collectionGames")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            if entries.is_empty() {
                break;
            }
            game_ids.extend(
                entries
                    .iter()
                    .filter_map(|entry| entry.get("gameId").and_then(EntityId::from_value)),
            );
            normalized.entities.merge(listing.entities);

            if expected.is_some_and(|n| u64::try_from(game_ids.len()).is_ok_and(|got| got >= n)) {
                break;
            }
        }
        let game_ids = dedup_ids(game_ids);
        debug!(collection = collection_id, games = game_ids.len(), "fetched collection games");

        let mut patch = Record::new();
        patch.insert("id".into(), Value::from(&id));
        patch.insert(
            "gameIds".into(),
            Value::Array(game_ids.iter().map(Value::from).collect()),
        );
        normalized
            .entities
            .merge_record(TableName::Collections, id, patch);

        ctx.db().save_many(&normalized.entities)?;
        Ok(())
    }
}
