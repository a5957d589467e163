use serde_json::Value;
use tracing::debug;

use crate::client::ItchClient;
use crate::error::Error;

impl ItchClient {
    /// A single game.
    ///
    /// `GET /games/{id}` → `{"game": {...}}`
    pub async fn get_game(&self, game_id: i64) -> Result<Value, Error> {
        let url = self.url(&format!("games/{game_id}"))?;
        debug!(game_id, "fetching game");
        self.get(url).await
    }
}
