//! Tolerant decoding of list responses.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Pull the item array out of a list response: a bare array, `{data: [...]}`
/// or `{services: [...]}`. Anything else is an empty list.
pub fn extract_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["data", "services"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            tracing::warn!("List response carried no array");
            Vec::new()
        }
        other => {
            tracing::warn!("Unexpected list response: {}", other);
            Vec::new()
        }
    }
}

fn id_of(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Give every object an `_id`, taken from `id` or generated.
pub fn ensure_ids(items: &mut [Value]) {
    for item in items.iter_mut() {
        let Value::Object(map) = item else { continue };
        if id_of(map.get("_id")).is_some() {
            continue;
        }
        let id = id_of(map.get("id"))
            .unwrap_or_else(|| format!("service-{}", uuid::Uuid::new_v4().simple()));
        map.insert("_id".to_string(), Value::String(id));
    }
}

/// Normalize `body` and decode each entry; entries that do not decode are
/// skipped.
pub fn decode_list<T: DeserializeOwned>(body: Value) -> Vec<T> {
    let mut items = extract_list(body);
    ensure_ids(&mut items);
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                tracing::warn!("Skipping undecodable list entry: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_the_three_list_shapes() {
        assert_eq!(extract_list(json!([1, 2])).len(), 2);
        assert_eq!(extract_list(json!({"data": [1]})).len(), 1);
        assert_eq!(extract_list(json!({"services": [1, 2, 3]})).len(), 3);
        assert!(extract_list(json!({"data": "nope"})).is_empty());
        assert!(extract_list(json!("text")).is_empty());
        assert!(extract_list(Value::Null).is_empty());
    }

    #[test]
    fn ids_fall_back_to_id_then_generated() {
        let mut items = vec![
            json!({"_id": "keep"}),
            json!({"id": 42}),
            json!({"_id": "", "id": "alt"}),
            json!({"name": "anon"}),
        ];
        ensure_ids(&mut items);
        assert_eq!(items[0]["_id"], "keep");
        assert_eq!(items[1]["_id"], "42");
        assert_eq!(items[2]["_id"], "alt");
        let generated = items[3]["_id"].as_str().unwrap();
        assert!(generated.starts_with("service-"));
    }
}
