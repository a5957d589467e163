// ── Core identity type ──
//
// itch.io ids are integers, but JSON object keys are always strings and some
// local-only rows carry textual ids. EntityId unifies both behind one
// hashable, ordered key.

use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Canonical identifier for any cached entity.
///
/// Strings that parse as integers collapse into [`EntityId::Int`], so an id
/// that travelled through a JSON object key compares equal to the numeric id
/// it came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl EntityId {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Str(_) => None,
        }
    }

    /// Read an id out of a JSON value (number or string). Anything else is
    /// not an id.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) if !s.is_empty() => Some(Self::from(s.as_str())),
            _ => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for EntityId {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(i) => Self::Int(i),
            Err(_) => Self::Str(s),
        }
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

impl From<&EntityId> for Value {
    fn from(id: &EntityId) -> Self {
        match id {
            EntityId::Int(i) => Value::from(*i),
            EntityId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl From<EntityId> for Value {
    fn from(id: EntityId) -> Self {
        Value::from(&id)
    }
}

// ── Serde ───────────────────────────────────────────────────────────

impl Serialize for EntityId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Str(s) => serializer.serialize_str(s),
        }
    }
}

struct EntityIdVisitor;

impl Visitor<'_> for EntityIdVisitor {
    type Value = EntityId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or string id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EntityId, E> {
        Ok(EntityId::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EntityId, E> {
        i64::try_from(v)
            .map(EntityId::Int)
            .map_err(|_| E::custom(format!("id {v} out of range")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EntityId, E> {
        Ok(EntityId::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<EntityId, E> {
        Ok(EntityId::from(v))
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(EntityIdVisitor)
    }
}
