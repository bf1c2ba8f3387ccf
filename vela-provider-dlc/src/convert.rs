//! Conversion between attribute maps and wire shapes
//!
//! Manifest attributes use snake_case keys and `vela_core::resource::Value`;
//! the DLC wire format uses PascalCase keys and JSON. The bridge here is
//! mechanical: deep key-casing conversion plus the core Value/JSON bridge,
//! so nested shapes (policies, config pairs, network settings) flatten and
//! expand without per-field mapping tables.

use std::collections::HashMap;

use heck::{ToSnakeCase, ToUpperCamelCase};
use serde::Serialize;
use serde::de::DeserializeOwned;

use vela_core::resource::{Value, attributes_from_json, attributes_to_json};

use crate::api::KVPair;
use crate::error::{DlcError, Result};

/// Separator for composite identifiers (e.g., "engine-name#group-name")
pub const ID_SEPARATOR: char = '#';

/// Recursively convert all object keys to snake_case
pub fn json_keys_to_snake(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(obj) => serde_json::Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k.to_snake_case(), json_keys_to_snake(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(json_keys_to_snake).collect())
        }
        other => other,
    }
}

/// Recursively convert all object keys to PascalCase
pub fn json_keys_to_pascal(value: serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(obj) => serde_json::Value::Object(
            obj.into_iter()
                .map(|(k, v)| (k.to_upper_camel_case(), json_keys_to_pascal(v)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.into_iter().map(json_keys_to_pascal).collect())
        }
        other => other,
    }
}

/// Build a typed request struct from snake_case manifest attributes
///
/// Attributes the struct does not know are ignored (forward compatibility).
pub fn request_from_attributes<T: DeserializeOwned>(attrs: &HashMap<String, Value>) -> Result<T> {
    let json = json_keys_to_pascal(attributes_to_json(attrs));
    Ok(serde_json::from_value(json)?)
}

/// Flatten a typed response struct into snake_case state attributes
pub fn attributes_from_response<T: Serialize>(response: &T) -> Result<HashMap<String, Value>> {
    let json = json_keys_to_snake(serde_json::to_value(response)?);
    Ok(attributes_from_json(&json).map_err(|e| {
        DlcError::MalformedResponse(format!("unrepresentable response value: {}", e))
    })?)
}

/// Convert one serializable wire value into an attribute value
pub fn value_from_wire<T: Serialize>(wire: &T) -> Result<Value> {
    let json = json_keys_to_snake(serde_json::to_value(wire)?);
    Value::from_json(&json)
        .map_err(|e| DlcError::MalformedResponse(format!("unrepresentable response value: {}", e)))
}

/// Join parts into a composite identifier
pub fn join_id(parts: &[&str]) -> String {
    parts.join(&ID_SEPARATOR.to_string())
}

/// Split a composite identifier into exactly `expected` parts
pub fn split_id(id: &str, expected: usize) -> Result<Vec<&str>> {
    let parts: Vec<&str> = id.split(ID_SEPARATOR).collect();
    if parts.len() != expected || parts.iter().any(|p| p.is_empty()) {
        return Err(DlcError::MalformedId {
            id: id.to_string(),
            expected,
        });
    }
    Ok(parts)
}

/// Read a map attribute as wire key/value pairs, sorted by key for a
/// deterministic payload
pub fn kv_pairs_from_map(attrs: &HashMap<String, Value>, name: &str) -> Option<Vec<KVPair>> {
    match attrs.get(name) {
        Some(Value::Map(map)) => {
            let mut pairs: Vec<KVPair> = map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| KVPair::new(k.clone(), s)))
                .collect();
            pairs.sort_by(|a, b| a.key.cmp(&b.key));
            Some(pairs)
        }
        _ => None,
    }
}

/// Flatten wire key/value pairs back into a map attribute
pub fn map_from_kv_pairs(pairs: &[KVPair]) -> Value {
    Value::Map(
        pairs
            .iter()
            .map(|p| (p.key.clone(), Value::String(p.value.clone())))
            .collect(),
    )
}

/// Fetch a required string attribute
pub fn require_str<'a>(attrs: &'a HashMap<String, Value>, name: &str) -> Result<&'a str> {
    attrs
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| DlcError::invalid_attribute(name, "required string attribute is missing"))
}

/// Fetch an optional string attribute
pub fn opt_str<'a>(attrs: &'a HashMap<String, Value>, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(Value::as_str)
}

/// Fetch an optional integer attribute
pub fn opt_int(attrs: &HashMap<String, Value>, name: &str) -> Option<i64> {
    attrs.get(name).and_then(Value::as_int)
}

/// Fetch an optional boolean attribute
pub fn opt_bool(attrs: &HashMap<String, Value>, name: &str) -> Option<bool> {
    attrs.get(name).and_then(Value::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn deep_key_conversion_round_trip() {
        let wire = serde_json::json!({
            "DataEngineName": "main",
            "PolicySet": [
                {"Database": "db1", "Operation": "SELECT", "ReAuth": false}
            ],
            "MaxClusters": 5
        });

        let snake = json_keys_to_snake(wire.clone());
        assert_eq!(snake["data_engine_name"], "main");
        assert_eq!(snake["policy_set"][0]["database"], "db1");
        assert_eq!(snake["policy_set"][0]["re_auth"], false);

        let back = json_keys_to_pascal(snake);
        assert_eq!(back, wire);
    }

    #[test]
    fn request_from_attributes_ignores_unknown() {
        #[derive(Debug, Deserialize)]
        #[serde(rename_all = "PascalCase")]
        struct Req {
            data_engine_name: String,
        }

        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("main".to_string()),
        );
        attrs.insert("something_else".to_string(), Value::Int(1));

        let req: Req = request_from_attributes(&attrs).unwrap();
        assert_eq!(req.data_engine_name, "main");
    }

    #[test]
    fn attributes_from_response_skips_none() {
        #[derive(Debug, Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Info {
            user_id: String,
            user_description: Option<String>,
        }

        let info = Info {
            user_id: "alice".to_string(),
            user_description: None,
        };

        let attrs = attributes_from_response(&info).unwrap();
        assert_eq!(attrs.get("user_id"), Some(&Value::String("alice".into())));
        assert!(!attrs.contains_key("user_description"));
    }

    #[test]
    fn composite_id_round_trip() {
        let id = join_id(&["vela-engine", "batch-group"]);
        assert_eq!(id, "vela-engine#batch-group");

        let parts = split_id(&id, 2).unwrap();
        assert_eq!(parts, vec!["vela-engine", "batch-group"]);
    }

    #[test]
    fn split_id_rejects_malformed() {
        assert!(split_id("only-one-part", 2).is_err());
        assert!(split_id("a#b#c", 2).is_err());
        assert!(split_id("a#", 2).is_err());
    }

    #[test]
    fn require_str_missing() {
        let attrs = HashMap::new();
        let err = require_str(&attrs, "user_id").unwrap_err();
        assert!(matches!(err, DlcError::InvalidAttribute { .. }));
    }
}
