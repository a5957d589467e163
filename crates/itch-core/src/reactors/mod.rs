// ── Reactors ──
//
// Handlers wired into the watcher at engine start.

pub mod dialogs;
pub mod fetchers;
pub mod login;
pub mod preboot;

use std::sync::Arc;

use crate::context::Services;
use crate::watcher::Watcher;

pub use fetchers::FetchScheduler;
pub use preboot::{EnvLookup, detect_proxy, register_with_env};

/// Register every reactor. Returns the fetch scheduler so callers can
/// observe in-flight fetches.
pub fn register_all(watcher: &mut Watcher, services: &Services) -> Arc<FetchScheduler> {
    preboot::register(watcher, &services.api);
    login::register(watcher, services);
    let scheduler = Arc::new(FetchScheduler::new(services.clone()));
    fetchers::register(watcher, &scheduler);
    dialogs::register(watcher, services);
    scheduler
}
