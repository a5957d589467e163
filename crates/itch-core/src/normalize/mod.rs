// ── Normalizer ──
//
// Flattens nested API payloads into per-table entity maps. Nested entities
// are replaced by their ids, keys are camelized, and relation keys are
// renamed to the reference they now hold (`game` -> `gameId`,
// `collections` -> `collectionIds`).

pub mod schema;

use serde_json::{Map, Value};
use tracing::trace;

use crate::db::{EntityMap, Record};
use crate::error::CoreError;
use crate::model::EntityId;

pub use schema::{EntitySchema, Schema};

/// Output of [`normalize`].
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Every entity reachable from the payload, exactly once per id.
    pub entities: EntityMap,
    /// The payload with entities replaced by ids.
    pub result: Value,
}

/// Normalize `raw` against `schema`.
///
/// An entity appearing several times is merged, later occurrences winning
/// field by field. Array order is preserved in `result`.
pub fn normalize(raw: &Value, schema: &Schema) -> Result<Normalized, CoreError> {
    let mut entities = EntityMap::new();
    let result = visit(raw, schema, &mut entities, "$")?;
    trace!(entities = entities.len(), "normalized payload");
    Ok(Normalized { entities, result })
}

fn visit(
    value: &Value,
    schema: &Schema,
    entities: &mut EntityMap,
    path: &str,
) -> Result<Value, CoreError> {
    match (schema, value) {
        (_, Value::Null) => Ok(Value::Null),
        (Schema::Entity(es), Value::Object(obj)) => {
            let id = obj
                .get(&es.id_attribute)
                .and_then(EntityId::from_value)
                .ok_or_else(|| {
                    CoreError::malformed(format!(
                        "{path}: {} entry without a usable `{}`",
                        es.table, es.id_attribute
                    ))
                })?;
            let record = visit_fields(obj, &es.relations, entities, path)?;
            entities.merge_record(es.table, id.clone(), record);
            Ok(Value::from(id))
        }
        (Schema::ArrayOf(inner), Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| visit(item, inner, entities, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        (Schema::Object(fields), Value::Object(obj)) => {
            visit_fields(obj, fields, entities, path).map(Value::Object)
        }
        (schema, other) => Err(CoreError::malformed(format!(
            "{path}: expected {}, got {}",
            schema.describe(),
            json_kind(other)
        ))),
    }
}

fn visit_fields(
    obj: &Map<String, Value>,
    fields: &[(String, Schema)],
    entities: &mut EntityMap,
    path: &str,
) -> Result<Record, CoreError> {
    let mut out = Record::new();
    for (key, value) in obj {
        if let Some((_, schema)) = fields.iter().find(|(k, _)| k == key) {
            let nested = visit(value, schema, entities, &format!("{path}.{key}"))?;
            out.insert(reference_key(key, schema), nested);
        } else {
            out.insert(camelize(key), camelize_value(value));
        }
    }
    Ok(out)
}

/// Key under which a relation's reference is stored.
fn reference_key(key: &str, schema: &Schema) -> String {
    match schema {
        Schema::Entity(_) => format!("{}Id", camelize(singular(key))),
        Schema::ArrayOf(inner) if matches!(**inner, Schema::Entity(_)) => {
            format!("{}Ids", camelize(singular(key)))
        }
        _ => camelize(key),
    }
}

fn singular(key: &str) -> &str {
    match key.strip_suffix('s') {
        Some(stem) if !stem.is_empty() => stem,
        _ => key,
    }
}

/// `cover_url` -> `coverUrl`. Already camelCase keys pass through.
pub(crate) fn camelize(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = false;
    for c in key.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn camelize_value(value: &Value) -> Value {
    match value {
        Value::Object(obj) => Value::Object(
            obj.iter()
                .map(|(k, v)| (camelize(k), camelize_value(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(camelize_value).collect()),
        scalar => scalar.clone(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
