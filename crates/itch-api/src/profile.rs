// Profile endpoints
//
// Everything scoped to the owner of the API key.

use serde_json::Value;
use tracing::debug;

use crate::client::ItchClient;
use crate::error::Error;

impl ItchClient {
    /// The authenticated user.
    ///
    /// `GET /profile` → `{"user": {...}}`
    pub async fn get_profile(&self) -> Result<Value, Error> {
        let url = self.url("profile")?;
        debug!("fetching profile");
        self.get(url).await
    }

    /// Collections owned by the authenticated user.
    ///
    /// `GET /profile/collections` → `{"collections": [...]}`
    pub async fn list_my_collections(&self) -> Result<Value, Error> {
        let url = self.url("profile/collections")?;
        debug!("listing own collections");
        self.get(url).await
    }
}
