// The "collections" tab: every collection the user owns, plus the first few
// games of each.

use futures_util::future::join_all;
use serde_json::Value;
use tracing::{debug, warn};

use super::{FetchTask, Fetcher, dedup_ids, index_by_id};
use crate::action::{PushPayload, PushSlice};
use crate::db::{Filter, Record, TableName, json_field};
use crate::error::CoreError;
use crate::model::EntityId;
use crate::normalize::{Schema, normalize, schema};

pub struct CollectionsFetcher {
    task: FetchTask,
}

impl CollectionsFetcher {
    pub fn new(task: FetchTask) -> Self {
        Self { task }
    }

    fn games_shown(&self) -> usize {
        self.task.ctx().config().games_shown_per_collection
    }
}

impl Fetcher for CollectionsFetcher {
    fn task(&self) -> &FetchTask {
        &self.task
    }

    fn task_mut(&mut self) -> &mut FetchTask {
        &mut self.task
    }

    async fn push_local(&self) -> Result<(), CoreError> {
        let ctx = self.task.ctx();
        let db = ctx.db();
        let me = ctx.ensure_credentials()?.me.id.clone();

        let Some(profile) = db.profiles().find_one_by_id(&me)? else {
            debug!(user = %me, "no local profile yet, nothing to push");
            return Ok(());
        };

        let collection_ids = profile.my_collection_ids();
        let collections = db
            .table(TableName::Collections)
            .all(&Filter::id_in(&collection_ids));

        let shown = self.games_shown();
        let game_ids = dedup_ids(collections.iter().flat_map(|c| {
            json_field::decode_value::<Vec<EntityId>>(c.get("gameIds"), Vec::new())
                .into_iter()
                .take(shown)
        }));
        let games = if game_ids.is_empty() {
            Vec::new()
        } else {
            db.table(TableName::Games).all(&Filter::id_in(&game_ids))
        };

        self.task.push(
            PushPayload::new()
                .with(
                    "collections",
                    PushSlice::new(index_by_id(collections), collection_ids),
                )
                .with("games", PushSlice::new(index_by_id(games), Vec::new())),
        );
        Ok(())
    }

    async fn remote(&self) -> Result<(), CoreError> {
        let ctx = self.task.ctx();
        let me = ctx.ensure_credentials()?.me.id.clone();

        let raw = ctx
            .with_api(|api| async move { api.my_collections().await })
            .await?;
        let mut normalized = normalize(
            &raw,
            &Schema::object(vec![("collections", Schema::array_of(schema::collection()))]),
        )?;

        if let Some(rows) = normalized.entities.table_mut(TableName::Collections) {
            for row in rows.values_mut() {
                row.entry("userId").or_insert_with(|| Value::from(&me));
            }
        }

        let collection_ids: Vec<EntityId> =
            json_field::decode_value(normalized.result.get("collectionIds"), Vec::new());

        // Games on display that neither the response nor the cache has.
        let shown = self.games_shown();
        let wanted = dedup_ids(collection_ids.iter().flat_map(|id| {
            normalized
                .entities
                .get(TableName::Collections, id)
                .map(|row| {
                    json_field::decode_value::<Vec<EntityId>>(row.get("gameIds"), Vec::new())
                })
                .unwrap_or_default()
                .into_iter()
                .take(shown)
        }));
        let games = ctx.db().table(TableName::Games);
        let missing: Vec<i64> = wanted
            .iter()
            .filter(|id| {
                !normalized.entities.contains(TableName::Games, id)
                    && games.find_one_by_id(id).is_none()
            })
            .filter_map(EntityId::as_int)
            .collect();

        if !missing.is_empty() {
            debug!(count = missing.len(), "fetching missing games eagerly");
            let fetches = missing.iter().map(|&game_id| async move {
                let result = ctx
                    .with_api(|api| async move { api.game(game_id).await })
                    .await
                    .and_then(|raw| {
                        normalize(&raw, &Schema::object(vec![("game", schema::game())]))
                    });
                (game_id, result)
            });
            for (game_id, result) in join_all(fetches).await {
                match result {
                    Ok(game) => normalized.entities.merge(game.entities),
                    Err(e) => warn!(game_id, error = %e, "could not fetch game, skipping"),
                }
            }
        }

        let mut profile = Record::new();
        profile.insert("id".into(), Value::from(&me));
        profile.insert("userId".into(), Value::from(&me));
        profile.insert(
            "myCollectionIds".into(),
            Value::Array(collection_ids.iter().map(Value::from).collect()),
        );
        normalized
            .entities
            .merge_record(TableName::Profiles, me, profile);

        ctx.db().save_many(&normalized.entities)?;
        Ok(())
    }
}
