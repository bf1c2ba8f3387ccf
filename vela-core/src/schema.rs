//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type, enabling validation
//! before any API call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, .. }, v) => {
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    SetComputed { name: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    /// Must be set in the manifest
    pub required: bool,
    /// Assigned by the service; never set in the manifest, never diffed
    pub computed: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            default: None,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Names of the computed attributes of this schema
    pub fn computed_attributes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .values()
            .filter(|a| a.computed)
            .map(|a| a.name.as_str())
    }

    /// Merge declared defaults into `attributes` for every absent attribute
    ///
    /// Defaults participate in requests and drift detection, so they must be
    /// materialized before diffing, not just consulted during validation.
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default
                && !attributes.contains_key(name)
            {
                attributes.insert(name.clone(), default.clone());
            }
        }
    }

    /// Validate resource attributes
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        // Check required attributes
        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        // Type check each attribute
        for (name, value) in attributes {
            if let Some(schema) = self.attributes.get(name) {
                if schema.computed {
                    errors.push(TypeError::SetComputed { name: name.clone() });
                    continue;
                }
                if let Err(e) = schema.attr_type.validate(value) {
                    errors.push(e);
                }
            }
            // Unknown attributes are allowed (for forward compatibility)
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n > 0 {
                        Ok(())
                    } else {
                        Err("Value must be positive".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Non-negative integer type
    pub fn non_negative_int() -> AttributeType {
        AttributeType::Custom {
            name: "NonNegativeInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| {
                if let Value::Int(n) = value {
                    if *n >= 0 {
                        Ok(())
                    } else {
                        Err("Value must not be negative".to_string())
                    }
                } else {
                    Err("Expected integer".to_string())
                }
            },
        }
    }

    /// Map with scalar (string, int or bool) values
    pub fn scalar_map() -> AttributeType {
        AttributeType::Custom {
            name: "ScalarMap".to_string(),
            base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
            validate: |value| {
                if let Value::Map(map) = value {
                    for (key, v) in map {
                        if !matches!(v, Value::String(_) | Value::Int(_) | Value::Bool(_)) {
                            return Err(format!("Value for key '{}' must be a scalar", key));
                        }
                    }
                    Ok(())
                } else {
                    Err("Expected map".to_string())
                }
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_cidr(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// Cron expression type (e.g., "0 8 ? * 1,2,3,4,5")
    pub fn cron() -> AttributeType {
        AttributeType::Custom {
            name: "Cron".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_cron(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }

    /// Compute unit size spec (e.g., "small", "m.large")
    pub fn size_spec() -> AttributeType {
        AttributeType::Custom {
            name: "SizeSpec".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| {
                if let Value::String(s) = value {
                    validate_size_spec(s)
                } else {
                    Err("Expected string".to_string())
                }
            },
        }
    }
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let parts: Vec<&str> = cidr.split('/').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid CIDR format '{}': expected IP/prefix", cidr));
    }

    let ip = parts[0];
    let prefix = parts[1];

    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

/// Validate a cron expression: 5 to 7 whitespace-separated fields of the
/// usual cron vocabulary (digits, `*`, `,`, `-`, `/`, `?`, `L`, `W`, `#`)
pub fn validate_cron(expr: &str) -> Result<(), String> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    if !(5..=7).contains(&fields.len()) {
        return Err(format!(
            "Invalid cron expression '{}': expected 5 to 7 fields, got {}",
            expr,
            fields.len()
        ));
    }

    for field in &fields {
        let valid = field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "*,-/?LW#".contains(c));
        if !valid {
            return Err(format!(
                "Invalid field '{}' in cron expression '{}'",
                field, expr
            ));
        }
    }

    Ok(())
}

/// Validate a compute unit size spec: "small", "medium", "large" or
/// "xlarge", with an optional "m." prefix for the memory-optimized variants
pub fn validate_size_spec(spec: &str) -> Result<(), String> {
    let size = spec.strip_prefix("m.").unwrap_or(spec);
    match size {
        "small" | "medium" | "large" | "xlarge" => Ok(()),
        _ => Err(format!(
            "Invalid size spec '{}': expected small, medium, large or xlarge, optionally prefixed with 'm.'",
            spec
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_enum_type() {
        let t = AttributeType::Enum(vec!["spark".to_string(), "presto".to_string()]);
        assert!(t.validate(&Value::String("spark".to_string())).is_ok());
        assert!(t.validate(&Value::String("flink".to_string())).is_err());
    }

    #[test]
    fn validate_positive_int() {
        let t = types::positive_int();
        assert!(t.validate(&Value::Int(1)).is_ok());
        assert!(t.validate(&Value::Int(100)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(-1)).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("dlc.data_engine")
            .attribute(AttributeSchema::new("data_engine_name", AttributeType::String).required())
            .attribute(AttributeSchema::new("max_clusters", types::positive_int()))
            .attribute(AttributeSchema::new("auto_resume", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("vela-engine".to_string()),
        );
        attrs.insert("max_clusters".to_string(), Value::Int(5));
        attrs.insert("auto_resume".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("dlc.user")
            .attribute(AttributeSchema::new("user_id", AttributeType::String).required());

        let attrs = HashMap::new();
        let result = schema.validate(&attrs);
        assert!(result.is_err());
    }

    #[test]
    fn computed_attribute_cannot_be_set() {
        let schema = ResourceSchema::new("dlc.data_engine")
            .attribute(AttributeSchema::new("data_engine_id", AttributeType::String).computed());

        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_id".to_string(),
            Value::String("engine-1".to_string()),
        );

        let errors = schema.validate(&attrs).unwrap_err();
        assert!(matches!(errors[0], TypeError::SetComputed { .. }));
    }

    #[test]
    fn unknown_attributes_are_allowed() {
        let schema = ResourceSchema::new("dlc.user");
        let mut attrs = HashMap::new();
        attrs.insert("whatever".to_string(), Value::Int(1));
        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn validate_scalar_map_type() {
        let t = types::scalar_map();

        let mut map = HashMap::new();
        map.insert("driver_size".to_string(), Value::String("small".to_string()));
        map.insert("executor_nums".to_string(), Value::Int(2));
        assert!(t.validate(&Value::Map(map)).is_ok());

        let mut nested = HashMap::new();
        nested.insert("inner".to_string(), Value::List(vec![]));
        assert!(t.validate(&Value::Map(nested)).is_err());
        assert!(t.validate(&Value::Int(1)).is_err());
    }

    #[test]
    fn defaults_materialize_into_attributes() {
        let schema = ResourceSchema::new("dlc.data_engine")
            .attribute(
                AttributeSchema::new(
                    "desired_state",
                    AttributeType::Enum(vec!["running".to_string(), "suspended".to_string()]),
                )
                .with_default(Value::String("running".to_string())),
            )
            .attribute(AttributeSchema::new("max_clusters", types::positive_int()));

        let mut attrs = HashMap::new();
        schema.apply_defaults(&mut attrs);
        assert_eq!(
            attrs.get("desired_state"),
            Some(&Value::String("running".to_string()))
        );
        // No default declared, so nothing appears
        assert!(!attrs.contains_key("max_clusters"));
    }

    #[test]
    fn defaults_never_override_explicit_values() {
        let schema = ResourceSchema::new("dlc.data_engine").attribute(
            AttributeSchema::new("desired_state", AttributeType::String)
                .with_default(Value::String("running".to_string())),
        );

        let mut attrs = HashMap::new();
        attrs.insert(
            "desired_state".to_string(),
            Value::String("suspended".to_string()),
        );
        schema.apply_defaults(&mut attrs);
        assert_eq!(
            attrs.get("desired_state"),
            Some(&Value::String("suspended".to_string()))
        );
    }

    #[test]
    fn validate_cron_type() {
        let t = types::cron();

        assert!(
            t.validate(&Value::String("0 8 ? * 1,2,3,4,5".to_string()))
                .is_ok()
        );
        assert!(
            t.validate(&Value::String("*/5 * * * *".to_string()))
                .is_ok()
        );

        assert!(t.validate(&Value::String("0 8".to_string())).is_err());
        assert!(
            t.validate(&Value::String("0 8 ? * 1;2".to_string()))
                .is_err()
        );
        assert!(t.validate(&Value::Int(5)).is_err());
    }

    #[test]
    fn validate_size_spec_type() {
        let t = types::size_spec();

        assert!(t.validate(&Value::String("small".to_string())).is_ok());
        assert!(t.validate(&Value::String("xlarge".to_string())).is_ok());
        assert!(t.validate(&Value::String("m.medium".to_string())).is_ok());

        assert!(t.validate(&Value::String("tiny".to_string())).is_err());
        assert!(t.validate(&Value::String("m.".to_string())).is_err());
        assert!(t.validate(&Value::Int(4)).is_err());
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();

        assert!(t.validate(&Value::String("10.0.0.0/16".to_string())).is_ok());
        assert!(
            t.validate(&Value::String("192.168.1.0/24".to_string()))
                .is_ok()
        );

        assert!(t.validate(&Value::String("10.0.0.0".to_string())).is_err());
        assert!(
            t.validate(&Value::String("10.0.0.0/33".to_string()))
                .is_err()
        );
        assert!(
            t.validate(&Value::String("10.0.0.256/16".to_string()))
                .is_err()
        );
        assert!(t.validate(&Value::Int(42)).is_err());
    }
}
