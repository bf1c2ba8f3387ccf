//! Typed DLC API request/response shapes
//!
//! These mirror the vendor's wire shapes (PascalCase JSON), one module per
//! API group. The shapes are externally defined contracts; nothing here
//! invents a data model.

pub mod data_engine;
pub mod data_mask;
pub mod network;
pub mod resource_group;
pub mod user;
pub mod work_group;

use serde::{Deserialize, Serialize};

/// Name/values filter used by the Describe* operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: vec![value.into()],
        }
    }
}

/// Key/value configuration pair (engine and session parameters)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KVPair {
    pub key: String,
    pub value: String,
}

impl KVPair {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_serializes_pascal() {
        let filter = Filter::new("data-engine-name", "vela-engine");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json["Name"], "data-engine-name");
        assert_eq!(json["Values"][0], "vela-engine");
    }

    #[test]
    fn kv_pair_round_trip() {
        let pair = KVPair::new("spark.sql.shuffle.partitions", "200");
        let json = serde_json::to_string(&pair).unwrap();
        let back: KVPair = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pair);
    }
}
