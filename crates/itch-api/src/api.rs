// Object-safe view of the remote API.
//
// The sync engine only ever talks to `dyn ItchApi`, so tests and offline
// modes can swap in a fake without touching HTTP.

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::client::ItchClient;
use crate::error::Error;

/// Domain operations of the remote API, returning raw JSON trees.
pub trait ItchApi: Send + Sync {
    /// `{"user": {...}}` for the key owner.
    fn me(&self) -> BoxFuture<'_, Result<Value, Error>>;

    /// `{"collections": [...]}` owned by the key owner.
    fn my_collections(&self) -> BoxFuture<'_, Result<Value, Error>>;

    /// `{"collection": {...}}`.
    fn collection(&self, collection_id: i64) -> BoxFuture<'_, Result<Value, Error>>;

    /// One page of `{"collection_games": [{"game": {...}}]}`.
    fn collection_games(
        &self,
        collection_id: i64,
        page: u32,
    ) -> BoxFuture<'_, Result<Value, Error>>;

    /// `{"game": {...}}`.
    fn game(&self, game_id: i64) -> BoxFuture<'_, Result<Value, Error>>;
}

impl ItchApi for ItchClient {
    fn me(&self) -> BoxFuture<'_, Result<Value, Error>> {
        Box::pin(self.get_profile())
    }

    fn my_collections(&self) -> BoxFuture<'_, Result<Value, Error>> {
        Box::pin(self.list_my_collections())
    }

    fn collection(&self, collection_id: i64) -> BoxFuture<'_, Result<Value, Error>> {
        Box::pin(self.get_collection(collection_id))
    }

    fn collection_games(
        &self,
        collection_id: i64,
        page: u32,
    ) -> BoxFuture<'_, Result<Value, Error>> {
        Box::pin(self.list_collection_games(collection_id, page))
    }

    fn game(&self, game_id: i64) -> BoxFuture<'_, Result<Value, Error>> {
        Box::pin(self.get_game(game_id))
    }
}
