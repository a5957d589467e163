// ── Preboot ──
//
// Environment probing before the UI boots. Every step is best-effort; Boot
// is dispatched whatever happens.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};

use crate::action::{Boot, Preboot, ProxySettings, ProxySettingsDetected, ProxySource};
use crate::context::ApiProvider;
use crate::error::CoreError;
use crate::store::Store;
use crate::watcher::Watcher;

/// Proxy variables, in precedence order.
const PROXY_ENV_VARS: &[&str] = &["https_proxy", "HTTPS_PROXY", "http_proxy", "HTTP_PROXY"];

pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub(crate) fn register(watcher: &mut Watcher, api: &Arc<dyn ApiProvider>) {
    register_with_env(watcher, api, Arc::new(|key: &str| std::env::var(key).ok()));
}

/// Register with a custom environment lookup.
pub fn register_with_env(watcher: &mut Watcher, api: &Arc<dyn ApiProvider>, env: EnvLookup) {
    let api = Arc::clone(api);
    watcher.on(move |store: Store, _: Preboot| {
        preboot(Arc::clone(&api), Arc::clone(&env), store)
    });
}

async fn preboot(api: Arc<dyn ApiProvider>, env: EnvLookup, store: Store) -> Result<(), CoreError> {
    let started = Instant::now();

    if let Some(settings) = detect_proxy(env.as_ref()) {
        info!(proxy = ?settings.proxy, "got proxy settings from environment");
        store.dispatch(ProxySettingsDetected {
            settings: settings.clone(),
        });
        if let Err(e) = api.apply_proxy(&settings) {
            warn!(error = %e, "could not apply proxy settings");
        }
    }

    info!(elapsed = ?started.elapsed(), "preboot done");
    store.dispatch(Boot);
    Ok(())
}

/// Proxy settings from the first non-empty proxy variable.
pub fn detect_proxy(lookup: &dyn Fn(&str) -> Option<String>) -> Option<ProxySettings> {
    PROXY_ENV_VARS
        .iter()
        .find_map(|key| lookup(key).filter(|v| !v.trim().is_empty()))
        .map(|proxy| ProxySettings {
            proxy: Some(proxy.trim().to_owned()),
            source: ProxySource::Env,
        })
}
