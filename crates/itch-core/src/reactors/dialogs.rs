// ── Dialogs ──
//
// Actions that end in a modal asking the user to confirm something.

use tracing::debug;

use crate::action::{
    LocalizedString, Modal, ModalButton, OpenModal, QueueCaveReinstall, QueueCaveUninstall,
    RequestCaveUninstall,
};
use crate::context::{Context, Services};
use crate::error::CoreError;
use crate::fetcher::lazy_get_game;
use crate::store::Store;
use crate::watcher::Watcher;

pub(crate) fn register(watcher: &mut Watcher, services: &Services) {
    let s = services.clone();
    watcher.on(move |store: Store, p: RequestCaveUninstall| {
        request_cave_uninstall(s.clone(), store, p)
    });
}

async fn request_cave_uninstall(
    services: Services,
    store: Store,
    p: RequestCaveUninstall,
) -> Result<(), CoreError> {
    let cave_id = p.cave_id;
    let Some(cave) = services.db.caves().find_one_by_id(&cave_id)? else {
        debug!(cave = %cave_id, "uninstall requested for unknown cave");
        return Ok(());
    };

    let ctx = Context::new(store.clone(), &services);
    let game = lazy_get_game(&ctx, &cave.game_id).await;
    let title = game.map_or_else(|| "this".to_owned(), |g| g.title);

    store.dispatch(OpenModal {
        modal: Modal {
            title: String::new(),
            message: LocalizedString::new("prompt.uninstall.message").param("title", title),
            buttons: vec![
                ModalButton::Action {
                    label: LocalizedString::new("prompt.uninstall.uninstall"),
                    action: Box::new(
                        QueueCaveUninstall {
                            cave_id: cave_id.clone(),
                        }
                        .into(),
                    ),
                    icon: Some("uninstall".into()),
                },
                ModalButton::Action {
                    label: LocalizedString::new("prompt.uninstall.reinstall"),
                    action: Box::new(QueueCaveReinstall { cave_id }.into()),
                    icon: Some("repeat".into()),
                },
                ModalButton::Cancel,
            ],
        },
    });
    Ok(())
}
