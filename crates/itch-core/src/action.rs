// ── Action catalog ──
//
// Every named event the engine understands. Each kind wraps its own payload
// struct; `ActionKind` is the fieldless discriminant reactors register on.
// Adding a kind means adding its payload struct and one line to the
// `actions!` list below.

use std::collections::BTreeMap;
use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::db::Record;
use crate::model::{EntityId, User};

/// A payload type that belongs to exactly one action kind.
pub trait ActionPayload: Sized + Send + 'static {
    const KIND: ActionKind;

    /// Unwrap the payload if `action` is of this kind.
    fn from_action(action: Action) -> Option<Self>;
}

macro_rules! actions {
    ($($name:ident),* $(,)?) => {
        /// An application action.
        #[derive(Debug, Clone, Serialize)]
        #[serde(tag = "type", content = "payload", rename_all = "camelCase")]
        pub enum Action {
            $($name($name),)*
        }

        /// Discriminant of [`Action`].
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
        #[strum(serialize_all = "camelCase")]
        pub enum ActionKind {
            $($name,)*
        }

        impl Action {
            pub fn kind(&self) -> ActionKind {
                match self {
                    $(Self::$name(_) => ActionKind::$name,)*
                }
            }
        }

        $(
            impl ActionPayload for $name {
                const KIND: ActionKind = ActionKind::$name;

                fn from_action(action: Action) -> Option<Self> {
                    match action {
                        Action::$name(payload) => Some(payload),
                        _ => None,
                    }
                }
            }

            impl From<$name> for Action {
                fn from(payload: $name) -> Self {
                    Action::$name(payload)
                }
            }
        )*
    };
}

actions! {
    Preboot,
    Boot,
    ProxySettingsDetected,
    AttemptLogin,
    LoginSucceeded,
    LoginFailed,
    Logout,
    LoggedOut,
    TabChanged,
    TabReloaded,
    TabParamsChanged,
    WindowFocusChanged,
    TabDataFetched,
    RequestCaveUninstall,
    QueueCaveUninstall,
    QueueCaveReinstall,
    OpenModal,
    CloseModal,
    StatusMessage,
    Quit,
}

// ── Lifecycle ───────────────────────────────────────────────────────

/// First action of a run: environment probing before the UI boots.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Preboot;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Boot;

#[derive(Debug, Clone, Serialize)]
pub struct ProxySettingsDetected {
    pub settings: ProxySettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// `None` means "let the OS decide".
    pub proxy: Option<String>,
    pub source: ProxySource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProxySource {
    Env,
    Os,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Quit;

// ── Session ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct AttemptLogin {
    #[serde(skip_serializing)]
    pub api_key: SecretString,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginSucceeded {
    pub me: User,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginFailed {
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Logout;

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoggedOut;

// ── Tabs ────────────────────────────────────────────────────────────

/// Identifier of a UI tab, e.g. `collections`, `collections/7`, `games/42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(String);

impl TabId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `collections/7` -> `("collections", Some("7"))`
    pub fn split(&self) -> (&str, Option<&str>) {
        match self.0.split_once('/') {
            Some((kind, rest)) => (kind, Some(rest)),
            None => (self.0.as_str(), None),
        }
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TabChanged {
    pub tab: TabId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabReloaded {
    pub tab: TabId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabParamsChanged {
    pub tab: TabId,
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowFocusChanged {
    pub focused: bool,
}

/// A fetcher's push: derived view data for one tab.
#[derive(Debug, Clone, Serialize)]
pub struct TabDataFetched {
    pub tab: TabId,
    pub generation: u64,
    pub data: PushPayload,
}

/// Why a fetch was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum FetchReason {
    Launch,
    TabChanged,
    TabReloaded,
    TabParamsChanged,
    WindowFocused,
    CacheUpdated,
}

impl FetchReason {
    /// Whether this reason justifies talking to the remote API.
    pub fn warrants_remote(self) -> bool {
        match self {
            Self::Launch | Self::TabChanged | Self::TabReloaded | Self::WindowFocused => true,
            Self::TabParamsChanged | Self::CacheUpdated => false,
        }
    }
}

/// Push data, keyed by slice name (`collections`, `games`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PushPayload(BTreeMap<String, PushSlice>);

impl PushPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slice: impl Into<String>, data: PushSlice) -> Self {
        self.0.insert(slice.into(), data);
        self
    }

    pub fn get(&self, slice: &str) -> Option<&PushSlice> {
        self.0.get(slice)
    }

    pub fn slices(&self) -> impl Iterator<Item = (&str, &PushSlice)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merge a later push into this one: `set` entries accumulate, `ids`
    /// are replaced.
    pub fn absorb(&mut self, later: PushPayload) {
        for (name, slice) in later.0 {
            match self.0.get_mut(&name) {
                Some(existing) => {
                    existing.set.extend(slice.set);
                    existing.ids = slice.ids;
                }
                None => {
                    self.0.insert(name, slice);
                }
            }
        }
    }
}

/// One slice of a push. `set` may omit ids listed in `ids`; a later push
/// fills them in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PushSlice {
    pub set: BTreeMap<EntityId, Record>,
    pub ids: Vec<EntityId>,
}

impl PushSlice {
    pub fn new(set: BTreeMap<EntityId, Record>, ids: Vec<EntityId>) -> Self {
        Self { set, ids }
    }
}

// ── Caves ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestCaveUninstall {
    pub cave_id: EntityId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCaveUninstall {
    pub cave_id: EntityId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueCaveReinstall {
    pub cave_id: EntityId,
}

// ── Modals & messages ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct OpenModal {
    pub modal: Modal,
}

/// Closes the topmost modal.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CloseModal;

#[derive(Debug, Clone, Serialize)]
pub struct StatusMessage {
    pub message: String,
}

/// An unresolved i18n string: a key and its interpolation params.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedString {
    pub key: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

impl LocalizedString {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Modal {
    pub title: String,
    pub message: LocalizedString,
    pub buttons: Vec<ModalButton>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ModalButton {
    /// Dispatches `action` when clicked.
    Action {
        label: LocalizedString,
        action: Box<Action>,
        #[serde(skip_serializing_if = "Option::is_none")]
        icon: Option<String>,
    },
    /// Closes the modal.
    Cancel,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_matches_payload() {
        let action = Action::from(TabChanged {
            tab: TabId::new("collections"),
        });
        assert_eq!(action.kind(), ActionKind::TabChanged);
        assert_eq!(action.kind(), TabChanged::KIND);
        assert!(TabChanged::from_action(action.clone()).is_some());
        assert!(TabReloaded::from_action(action).is_none());
    }

    #[test]
    fn kinds_display_camel_case() {
        assert_eq!(ActionKind::RequestCaveUninstall.to_string(), "requestCaveUninstall");
        assert_eq!(ActionKind::Preboot.to_string(), "preboot");
    }

    #[test]
    fn reasons_split_into_remote_and_local() {
        assert!(FetchReason::Launch.warrants_remote());
        assert!(FetchReason::WindowFocused.warrants_remote());
        assert!(!FetchReason::TabParamsChanged.warrants_remote());
        assert!(!FetchReason::CacheUpdated.warrants_remote());
    }

    #[test]
    fn api_key_is_never_serialized() {
        let action = Action::from(AttemptLogin {
            api_key: SecretString::from("hunter2"),
        });
        let text = serde_json::to_string(&action).unwrap();
        assert!(!text.contains("hunter2"));
        assert!(!format!("{action:?}").contains("hunter2"));
    }

    #[test]
    fn tab_ids_split_on_first_slash() {
        assert_eq!(TabId::new("collections").split(), ("collections", None));
        assert_eq!(TabId::new("collections/7").split(), ("collections", Some("7")));
    }

    #[test]
    fn absorb_accumulates_set_and_replaces_ids() {
        let row = |id: i64| json!({"id": id}).as_object().unwrap().clone();
        let mut first = PushPayload::new().with(
            "games",
            PushSlice::new([(EntityId::Int(1), row(1))].into(), vec![EntityId::Int(1)]),
        );
        first.absorb(PushPayload::new().with(
            "games",
            PushSlice::new([(EntityId::Int(2), row(2))].into(), vec![EntityId::Int(2)]),
        ));
        let games = first.get("games").unwrap();
        assert_eq!(games.set.len(), 2);
        assert_eq!(games.ids, vec![EntityId::Int(2)]);
    }

    #[test]
    fn push_payload_serializes_as_slice_map() {
        let payload = PushPayload::new()
            .with("collections", PushSlice::default())
            .with("games", PushSlice::default());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"collections": {"set": {}, "ids": []}, "games": {"set": {}, "ids": []}})
        );
    }
}
