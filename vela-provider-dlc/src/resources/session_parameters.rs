//! `dlc.session_parameters` - session-level configuration pairs of an engine
//!
//! The pairs live on the engine itself; this resource owns them as a unit.
//! Create and update both replace the full set through
//! UpdateDataEngineConfig. Delete only forgets the resource locally, since
//! the service has no call to clear the pairs.

use std::collections::HashMap;

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::api::data_engine::{EmptyResponse, UpdateDataEngineConfigRequest};
use crate::client::DlcClient;
use crate::convert::{kv_pairs_from_map, map_from_kv_pairs, opt_bool, require_str};
use crate::error::Result;
use crate::resources::data_engine;

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.session_parameters")
        .with_description("Session configuration pairs applied to an engine")
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "parameters",
                AttributeType::Map(Box::new(AttributeType::String)),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("use_lakefs_status", AttributeType::Bool))
        .attribute(AttributeSchema::new("data_engine_id", AttributeType::String).computed())
}

async fn apply(client: &DlcClient, attrs: &HashMap<String, Value>) -> Result<String> {
    let engine_name = require_str(attrs, "data_engine_name")?;
    let pairs = kv_pairs_from_map(attrs, "parameters").unwrap_or_default();

    let request = UpdateDataEngineConfigRequest {
        data_engine_name: engine_name.to_string(),
        data_engine_config_pairs: pairs,
        use_lakefs_status: opt_bool(attrs, "use_lakefs_status"),
    };
    let _: EmptyResponse = client.call("UpdateDataEngineConfig", &request).await?;

    info!(engine = %engine_name, "session parameters applied");
    Ok(engine_name.to_string())
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    let engine_name = apply(client, attrs).await?;
    let state = read(client, &engine_name)
        .await?
        .unwrap_or_else(|| attrs.clone());
    Ok((engine_name, state))
}

pub async fn read(client: &DlcClient, engine_name: &str) -> Result<Option<HashMap<String, Value>>> {
    let Some(info) = data_engine::find(client, engine_name).await? else {
        return Ok(None);
    };

    let mut attrs = HashMap::new();
    attrs.insert(
        "data_engine_name".to_string(),
        Value::String(info.data_engine_name.clone()),
    );
    if let Some(id) = &info.data_engine_id {
        attrs.insert("data_engine_id".to_string(), Value::String(id.clone()));
    }
    if let Some(pairs) = &info.data_engine_config_pairs {
        attrs.insert("parameters".to_string(), map_from_kv_pairs(pairs));
    }
    Ok(Some(attrs))
}

pub async fn update(
    client: &DlcClient,
    engine_name: &str,
    to: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    apply(client, to).await?;
    Ok(read(client, engine_name).await?.unwrap_or_else(|| to.clone()))
}

/// The service keeps the last applied pairs; there is nothing to remove.
pub async fn delete(_client: &DlcClient, engine_name: &str) -> Result<()> {
    info!(engine = %engine_name, "session parameters dropped from management");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_requires_parameters() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("shared-engine".to_string()),
        );
        assert!(schema().validate(&attrs).is_err());

        let mut params = HashMap::new();
        params.insert(
            "spark.sql.shuffle.partitions".to_string(),
            Value::String("64".to_string()),
        );
        attrs.insert("parameters".to_string(), Value::Map(params));
        assert!(schema().validate(&attrs).is_ok());
    }

    #[test]
    fn pairs_sort_deterministically() {
        let mut params = HashMap::new();
        params.insert("b.key".to_string(), Value::String("2".to_string()));
        params.insert("a.key".to_string(), Value::String("1".to_string()));

        let mut attrs = HashMap::new();
        attrs.insert("parameters".to_string(), Value::Map(params));

        let pairs = kv_pairs_from_map(&attrs, "parameters").unwrap();
        assert_eq!(pairs[0].key, "a.key");
        assert_eq!(pairs[1].key, "b.key");
    }
}
