// Best-effort single-game lookup for reactors that only need a title.

use tracing::{debug, warn};

use crate::context::Context;
use crate::error::CoreError;
use crate::model::{EntityId, Game};
use crate::normalize::{Schema, normalize, schema};

/// The game `id` from the cache, or fetched once from the API and cached.
///
/// Never fails: any error is logged and yields `None`.
pub async fn lazy_get_game(ctx: &Context, id: &EntityId) -> Option<Game> {
    match ctx.db().games().find_one_by_id(id) {
        Ok(Some(game)) => return Some(game),
        Ok(None) => {}
        Err(e) => {
            warn!(game = %id, error = %e, "cached game unreadable, refetching");
        }
    }

    let Some(game_id) = id.as_int() else {
        debug!(game = %id, "non-numeric game id, not fetching");
        return None;
    };

    let fetched: Result<Option<Game>, CoreError> = async {
        let raw = ctx
            .with_api(|api| async move { api.game(game_id).await })
            .await?;
        let normalized = normalize(&raw, &Schema::object(vec![("game", schema::game())]))?;
        ctx.db().save_many(&normalized.entities)?;
        ctx.db().games().find_one_by_id(id)
    }
    .await;

    match fetched {
        Ok(game) => game,
        Err(e) => {
            debug!(game = %id, error = %e, "lazy game fetch failed");
            None
        }
    }
}
