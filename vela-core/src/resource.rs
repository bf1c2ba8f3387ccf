//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "dlc.data_engine", "dlc.work_group")
    pub resource_type: String,
    /// Resource name (identifier chosen in the manifest)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
}

/// Error converting between attribute values and JSON
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValueError {
    #[error("JSON value {0} cannot be represented as an attribute value")]
    Unrepresentable(String),
}

impl Value {
    /// Convert this value into a JSON value
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(n) => serde_json::Value::Number((*n).into()),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => {
                let mut obj = serde_json::Map::new();
                for (k, v) in map {
                    obj.insert(k.clone(), v.to_json());
                }
                serde_json::Value::Object(obj)
            }
        }
    }

    /// Convert a JSON value into an attribute value
    ///
    /// Floats and nulls have no attribute representation and are rejected;
    /// none of the DLC API shapes use them on attribute paths.
    pub fn from_json(json: &serde_json::Value) -> Result<Self, ValueError> {
        match json {
            serde_json::Value::String(s) => Ok(Value::String(s.clone())),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .ok_or_else(|| ValueError::Unrepresentable(n.to_string())),
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    list.push(Value::from_json(item)?);
                }
                Ok(Value::List(list))
            }
            serde_json::Value::Object(obj) => {
                let mut map = HashMap::new();
                for (k, v) in obj {
                    map.insert(k.clone(), Value::from_json(v)?);
                }
                Ok(Value::Map(map))
            }
            serde_json::Value::Null => Err(ValueError::Unrepresentable("null".to_string())),
        }
    }

    /// Borrow the value as a string, if it is one
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Borrow the value as an integer, if it is one
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Borrow the value as a boolean, if it is one
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// Convert a whole attribute map into a JSON object
pub fn attributes_to_json(attrs: &HashMap<String, Value>) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (k, v) in attrs {
        obj.insert(k.clone(), v.to_json());
    }
    serde_json::Value::Object(obj)
}

/// Convert a JSON object into an attribute map
pub fn attributes_from_json(
    json: &serde_json::Value,
) -> Result<HashMap<String, Value>, ValueError> {
    let mut attrs = HashMap::new();
    if let serde_json::Value::Object(obj) = json {
        for (k, v) in obj {
            if v.is_null() {
                continue;
            }
            attrs.insert(k.clone(), Value::from_json(v)?);
        }
    }
    Ok(attrs)
}

/// Desired state declared in the manifest
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }
}

/// Current state fetched from the cloud service
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Service-side identifier (e.g., a DataEngineId, or a composite
    /// "engine-name#group-name" id)
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_json_round_trip() {
        let mut map = HashMap::new();
        map.insert("name".to_string(), Value::String("sparky".to_string()));
        map.insert("clusters".to_string(), Value::Int(4));
        map.insert("auto_resume".to_string(), Value::Bool(true));
        map.insert(
            "labels".to_string(),
            Value::List(vec![
                Value::String("a".to_string()),
                Value::String("b".to_string()),
            ]),
        );
        let value = Value::Map(map);

        let json = value.to_json();
        let back = Value::from_json(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn value_from_json_rejects_floats() {
        let json = serde_json::json!(1.5);
        assert!(Value::from_json(&json).is_err());
    }

    #[test]
    fn attributes_from_json_skips_nulls() {
        let json = serde_json::json!({"a": "x", "b": null});
        let attrs = attributes_from_json(&json).unwrap();
        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs.get("a"), Some(&Value::String("x".to_string())));
    }

    #[test]
    fn resource_data_source_flag() {
        let resource = Resource::new("dlc.data_engines", "all").with_read_only(true);
        assert!(resource.is_data_source());
    }

    #[test]
    fn state_with_identifier() {
        let state = State::existing(ResourceId::new("dlc.data_engine", "main"), HashMap::new())
            .with_identifier("engine-abc123");
        assert!(state.exists);
        assert_eq!(state.identifier.as_deref(), Some("engine-abc123"));
    }
}
