// ── Session ──
//
// The logged-in account, held explicitly instead of in ambient globals.
// Only the login reactor writes it; everyone else reads snapshots.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;

use crate::model::User;

/// Who is logged in and with which API key.
#[derive(Debug)]
pub struct Credentials {
    pub me: User,
    pub key: SecretString,
}

#[derive(Default)]
pub struct Session {
    current: ArcSwapOption<Credentials>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current credentials, if logged in.
    pub fn current(&self) -> Option<Arc<Credentials>> {
        self.current.load_full()
    }

    pub fn is_logged_in(&self) -> bool {
        self.current.load().is_some()
    }

    pub(crate) fn login(&self, credentials: Credentials) {
        self.current.store(Some(Arc::new(credentials)));
    }

    /// Returns `true` if someone was logged in.
    pub(crate) fn logout(&self) -> bool {
        self.current.swap(None).is_some()
    }
}
