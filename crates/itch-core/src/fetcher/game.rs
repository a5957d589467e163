// A single game tab (`games/<id>`).

use super::{FetchTask, Fetcher, index_by_id};
use crate::action::{PushPayload, PushSlice};
use crate::db::TableName;
use crate::error::CoreError;
use crate::model::EntityId;
use crate::normalize::{Schema, normalize, schema};

pub struct GameFetcher {
    task: FetchTask,
    game_id: i64,
}

impl GameFetcher {
    pub fn new(task: FetchTask, game_id: i64) -> Self {
        Self { task, game_id }
    }
}

impl Fetcher for GameFetcher {
    fn task(&self) -> &FetchTask {
        &self.task
    }

    fn task_mut(&mut self) -> &mut FetchTask {
        &mut self.task
    }

    async fn push_local(&self) -> Result<(), CoreError> {
        let id = EntityId::Int(self.game_id);
        let game = self
            .task
            .ctx()
            .db()
            .table(TableName::Games)
            .find_one_by_id(&id);

        self.task.push(PushPayload::new().with(
            "games",
            PushSlice::new(index_by_id(game.into_iter().collect()), vec![id]),
        ));
        Ok(())
    }

    async fn remote(&self) -> Result<(), CoreError> {
        let ctx = self.task.ctx();
        let game_id = self.game_id;
        let raw = ctx
            .with_api(|api| async move { api.game(game_id).await })
            .await?;
        let normalized = normalize(&raw, &Schema::object(vec![("game", schema::game())]))?;
        ctx.db().save_many(&normalized.entities)?;
        Ok(())
    }
}
