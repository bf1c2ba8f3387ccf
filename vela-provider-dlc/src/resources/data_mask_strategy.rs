//! `dlc.data_mask_strategy` - column masking policy with group bindings
//!
//! The service assigns a strategy id at create time; that id is the
//! identifier for later reads and deletes.

use std::collections::HashMap;

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::api::data_engine::EmptyResponse;
use crate::api::data_mask::{
    CreateDataMaskStrategyRequest, CreateDataMaskStrategyResponse, DataMaskStrategy,
    DeleteDataMaskStrategyRequest, DescribeDataMaskStrategiesRequest,
    DescribeDataMaskStrategiesResponse, ModifyDataMaskStrategyRequest,
};
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{attributes_from_response, json_keys_to_pascal};
use crate::error::{DlcError, Result};
use crate::resources::collect_pages;

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.data_mask_strategy")
        .with_description("Data masking strategy bound to work groups")
        .attribute(AttributeSchema::new("strategy_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("strategy_desc", AttributeType::String))
        .attribute(AttributeSchema::new("strategy_type", AttributeType::String))
        .attribute(AttributeSchema::new(
            "groups",
            AttributeType::List(Box::new(types::scalar_map())),
        ))
        .attribute(AttributeSchema::new("users", AttributeType::String))
        .attribute(AttributeSchema::new("strategy_id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("state", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("update_time", AttributeType::String).computed())
}

/// Build the wire strategy shape from manifest attributes
fn strategy_from_attrs(attrs: &HashMap<String, Value>) -> Result<DataMaskStrategy> {
    let json = json_keys_to_pascal(vela_core::resource::attributes_to_json(attrs));
    Ok(serde_json::from_value(json)?)
}

pub async fn find(client: &DlcClient, strategy_id: &str) -> Result<Option<DataMaskStrategy>> {
    let strategies = collect_pages(|offset| async move {
        let request = DescribeDataMaskStrategiesRequest {
            offset,
            limit: PAGE_LIMIT,
            ..Default::default()
        };
        let page: DescribeDataMaskStrategiesResponse =
            match client.call("DescribeDataMaskStrategies", &request).await {
                Ok(r) => r,
                Err(e) if e.is_not_found() => return Ok((Vec::new(), 0)),
                Err(e) => return Err(e),
            };
        Ok((page.strategies, page.total_count))
    })
    .await?;

    Ok(strategies
        .into_iter()
        .find(|s| s.strategy_id.as_deref() == Some(strategy_id)))
}

pub fn state_attributes(strategy: &DataMaskStrategy) -> Result<HashMap<String, Value>> {
    attributes_from_response(strategy)
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    let strategy = strategy_from_attrs(attrs)?;
    let name = strategy.strategy_name.clone().unwrap_or_default();
    let request = CreateDataMaskStrategyRequest { strategy };

    let response: CreateDataMaskStrategyResponse =
        client.call("CreateDataMaskStrategy", &request).await?;
    let strategy_id = response.strategy_id.ok_or_else(|| {
        DlcError::MalformedResponse("CreateDataMaskStrategy returned no strategy id".to_string())
    })?;

    info!(strategy = %name, id = %strategy_id, "data mask strategy created");

    let stored = find(client, &strategy_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!(
            "data mask strategy {} not visible after create",
            strategy_id
        ))
    })?;

    Ok((strategy_id, state_attributes(&stored)?))
}

pub async fn read(
    client: &DlcClient,
    strategy_id: &str,
) -> Result<Option<HashMap<String, Value>>> {
    match find(client, strategy_id).await? {
        Some(strategy) => Ok(Some(state_attributes(&strategy)?)),
        None => Ok(None),
    }
}

pub async fn update(
    client: &DlcClient,
    strategy_id: &str,
    to: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let mut strategy = strategy_from_attrs(to)?;
    strategy.strategy_id = Some(strategy_id.to_string());
    let request = ModifyDataMaskStrategyRequest { strategy };

    let _: EmptyResponse = client.call("ModifyDataMaskStrategy", &request).await?;

    let stored = find(client, strategy_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!(
            "data mask strategy {} not visible after update",
            strategy_id
        ))
    })?;

    info!(id = %strategy_id, "data mask strategy updated");
    state_attributes(&stored)
}

pub async fn delete(client: &DlcClient, strategy_id: &str) -> Result<()> {
    let request = DeleteDataMaskStrategyRequest {
        strategy_id: strategy_id.to_string(),
    };
    match client
        .call::<_, EmptyResponse>("DeleteDataMaskStrategy", &request)
        .await
    {
        Ok(_) => {
            info!(id = %strategy_id, "data mask strategy deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_validates_manifest() {
        let mut group = HashMap::new();
        group.insert("work_group_id".to_string(), Value::Int(7));
        group.insert(
            "strategy_type".to_string(),
            Value::String("MASK_SHOW_FIRST_4".to_string()),
        );

        let mut attrs = HashMap::new();
        attrs.insert(
            "strategy_name".to_string(),
            Value::String("pii-mask".to_string()),
        );
        attrs.insert(
            "groups".to_string(),
            Value::List(vec![Value::Map(group)]),
        );

        assert!(schema().validate(&attrs).is_ok());
    }

    #[test]
    fn strategy_builds_from_attrs() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "strategy_name".to_string(),
            Value::String("pii-mask".to_string()),
        );
        attrs.insert(
            "strategy_type".to_string(),
            Value::String("MASK".to_string()),
        );

        let strategy = strategy_from_attrs(&attrs).unwrap();
        assert_eq!(strategy.strategy_name.as_deref(), Some("pii-mask"));
        assert_eq!(strategy.strategy_type.as_deref(), Some("MASK"));
        assert!(strategy.strategy_id.is_none());
    }
}
