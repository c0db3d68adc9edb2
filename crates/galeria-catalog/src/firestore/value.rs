//! JSON to Firestore REST `Value` encoding

use serde_json::{json, Map, Value as JsonValue};

/// Encode a JSON value as a Firestore `Value`.
///
/// Integers become `integerValue` (sent as a decimal string, as the REST API
/// expects for int64), other numbers `doubleValue`.
pub fn encode_value(value: &JsonValue) -> JsonValue {
    match value {
        JsonValue::Null => json!({ "nullValue": null }),
        JsonValue::Bool(b) => json!({ "booleanValue": b }),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        JsonValue::String(s) => json!({ "stringValue": s }),
        JsonValue::Array(items) => {
            let values: Vec<JsonValue> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        JsonValue::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Encode every entry of a JSON object as a Firestore `fields` map.
pub fn encode_fields(map: &Map<String, JsonValue>) -> JsonValue {
    let fields: Map<String, JsonValue> = map
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value)))
        .collect();
    JsonValue::Object(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(encode_value(&json!(null)), json!({"nullValue": null}));
        assert_eq!(encode_value(&json!(true)), json!({"booleanValue": true}));
        assert_eq!(encode_value(&json!(42)), json!({"integerValue": "42"}));
        assert_eq!(encode_value(&json!(-3)), json!({"integerValue": "-3"}));
        assert_eq!(encode_value(&json!(12.5)), json!({"doubleValue": 12.5}));
        assert_eq!(encode_value(&json!("óleo")), json!({"stringValue": "óleo"}));
    }

    #[test]
    fn test_nested() {
        let encoded = encode_value(&json!([{"path": "obras/a.webp", "orden": 1}]));
        assert_eq!(
            encoded,
            json!({
                "arrayValue": {"values": [
                    {"mapValue": {"fields": {
                        "path": {"stringValue": "obras/a.webp"},
                        "orden": {"integerValue": "1"}
                    }}}
                ]}
            })
        );
    }
}
