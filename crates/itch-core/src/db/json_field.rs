// ── Encoded fields ──
//
// Relational columns are scalar, so list/object fields are stored as JSON
// text. Upstream rows may be legacy or partial: decoding never fails, it
// falls back to the caller's default.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

/// Decode an encoded text field, returning `default` when it is absent or
/// malformed.
pub fn decode<T: DeserializeOwned>(raw: Option<&str>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "malformed encoded field, using default");
            default
        }
    }
}

/// Decode a field that may be either still structured (fresh from the
/// normalizer) or already encoded (read back from the cache).
pub fn decode_value<T: DeserializeOwned>(raw: Option<&Value>, default: T) -> T {
    match raw {
        None | Some(Value::Null) => default,
        Some(Value::String(s)) => decode(Some(s), default),
        Some(other) => match serde_json::from_value(other.clone()) {
            Ok(value) => value,
            Err(e) => {
                debug!(error = %e, "unexpected field shape, using default");
                default
            }
        },
    }
}

/// Encode a structured value for storage in a scalar column. Scalars pass
/// through untouched.
pub fn encode(value: Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        scalar => scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_and_malformed_yield_default() {
        assert_eq!(decode::<Vec<i64>>(None, vec![9]), vec![9]);
        assert_eq!(decode::<Vec<i64>>(Some("not json"), Vec::new()), Vec::<i64>::new());
        assert_eq!(decode::<Vec<i64>>(Some(r#"{"a":1}"#), vec![1]), vec![1]);
    }

    #[test]
    fn decode_value_accepts_both_shapes() {
        let structured = json!([1, 2]);
        let encoded = json!("[1,2]");
        assert_eq!(decode_value::<Vec<i64>>(Some(&structured), Vec::new()), vec![1, 2]);
        assert_eq!(decode_value::<Vec<i64>>(Some(&encoded), Vec::new()), vec![1, 2]);
        assert_eq!(decode_value::<Vec<i64>>(Some(&Value::Null), vec![3]), vec![3]);
    }

    #[test]
    fn encode_only_touches_structured_values() {
        assert_eq!(encode(json!([1, 2])), json!("[1,2]"));
        assert_eq!(encode(json!({"a": 1})), json!(r#"{"a":1}"#));
        assert_eq!(encode(json!(5)), json!(5));
        assert_eq!(encode(json!("text")), json!("text"));
    }
}
