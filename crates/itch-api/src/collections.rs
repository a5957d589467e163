// Collection endpoints

use serde_json::Value;
use tracing::debug;

use crate::client::ItchClient;
use crate::error::Error;

impl ItchClient {
    /// A single collection.
    ///
    /// `GET /collections/{id}` → `{"collection": {...}}`
    pub async fn get_collection(&self, collection_id: i64) -> Result<Value, Error> {
        let url = self.url(&format!("collections/{collection_id}"))?;
        debug!(collection_id, "fetching collection");
        self.get(url).await
    }

    /// One page of a collection's games, in collection order.
    ///
    /// `GET /collections/{id}/collection-games?page={page}` →
    /// `{"page": 1, "per_page": 50, "collection_games": [{"position": 0, "game": {...}}]}`
    pub async fn list_collection_games(
        &self,
        collection_id: i64,
        page: u32,
    ) -> Result<Value, Error> {
        let mut url = self.url(&format!("collections/{collection_id}/collection-games"))?;
        url.query_pairs_mut().append_pair("page", &page.to_string());
        debug!(collection_id, page, "listing collection games");
        self.get(url).await
    }
}
