// ── Login / logout ──
//
// The only code that writes the session. A successful login persists the
// user and a profile row for them before announcing itself.

use serde_json::Value;
use tracing::{info, warn};

use crate::action::{AttemptLogin, LoggedOut, LoginFailed, LoginSucceeded, Logout};
use crate::context::Services;
use crate::db::{Record, TableName};
use crate::error::CoreError;
use crate::model::{EntityId, User};
use crate::normalize::{Schema, normalize, schema};
use crate::session::Credentials;
use crate::store::Store;
use crate::watcher::Watcher;

pub(crate) fn register(watcher: &mut Watcher, services: &Services) {
    let s = services.clone();
    watcher.on(move |store: Store, p: AttemptLogin| attempt_login(s.clone(), store, p));

    let s = services.clone();
    watcher.on(move |store: Store, _: Logout| logout(s.clone(), store));
}

async fn attempt_login(services: Services, store: Store, p: AttemptLogin) -> Result<(), CoreError> {
    match login(&services, p).await {
        Ok(me) => {
            info!(user = %me.id, username = %me.username, "logged in");
            store.dispatch(LoginSucceeded { me });
            Ok(())
        }
        Err(e) => {
            warn!(error = %e, "login failed");
            store.dispatch(LoginFailed {
                errors: vec![e.to_string()],
            });
            if e.is_storage() { Err(e) } else { Ok(()) }
        }
    }
}

async fn login(services: &Services, p: AttemptLogin) -> Result<User, CoreError> {
    let api = services.api.client(&p.api_key)?;
    let raw = api.me().await?;
    let mut normalized = normalize(&raw, &Schema::object(vec![("user", schema::user())]))?;

    let id = normalized
        .result
        .get("userId")
        .and_then(EntityId::from_value)
        .ok_or_else(|| CoreError::malformed("profile response without a user"))?;

    let mut profile = Record::new();
    profile.insert("id".into(), Value::from(&id));
    profile.insert("userId".into(), Value::from(&id));
    normalized
        .entities
        .merge_record(TableName::Profiles, id.clone(), profile);
    services.db.save_many(&normalized.entities)?;

    let me = services
        .db
        .users()
        .find_one_by_id(&id)?
        .ok_or_else(|| CoreError::storage(format!("user {id} missing right after saving it")))?;

    services.session.login(Credentials {
        me: me.clone(),
        key: p.api_key,
    });
    Ok(me)
}

async fn logout(services: Services, store: Store) -> Result<(), CoreError> {
    if services.session.logout() {
        info!("logged out");
    }
    store.dispatch(LoggedOut);
    Ok(())
}
