// ── Query predicates ──
//
// Composable row filters for `EntityCollection::all`. Enough to express
// "every game whose id is in this list" without a query language.

use serde_json::Value;

use super::Record;
use crate::model::EntityId;

/// A predicate over cache rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches every row.
    All,
    /// `field == value`. A missing field matches `Value::Null`.
    Eq(String, Value),
    /// `field in values`.
    In(String, Vec<Value>),
    And(Vec<Filter>),
    Not(Box<Filter>),
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(field.into(), value.into())
    }

    pub fn is_in<I, V>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(field.into(), values.into_iter().map(Into::into).collect())
    }

    /// `id in ids`
    pub fn id_in<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a EntityId>,
    {
        Self::is_in("id", ids.into_iter().map(Value::from))
    }

    pub fn and(self, other: Filter) -> Self {
        match self {
            Self::All => other,
            Self::And(mut parts) => {
                parts.push(other);
                Self::And(parts)
            }
            first => Self::And(vec![first, other]),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    pub fn matches(&self, row: &Record) -> bool {
        match self {
            Self::All => true,
            Self::Eq(field, value) => row.get(field).unwrap_or(&Value::Null) == value,
            Self::In(field, values) => row.get(field).is_some_and(|v| values.contains(v)),
            Self::And(parts) => parts.iter().all(|f| f.matches(row)),
            Self::Not(inner) => !inner.matches(row),
        }
    }
}
