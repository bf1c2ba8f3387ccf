//! `dlc.resource_group` - a compute sub-allocation within a standard engine
//!
//! Group names are only unique per engine, so the identifier is the
//! composite `engine-name#group-name`. Launch and pause are asynchronous
//! and polled like engine transitions.

use std::collections::HashMap;

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::api::Filter;
use crate::api::data_engine::EmptyResponse;
use crate::api::resource_group::{
    CreateStandardEngineResourceGroupRequest, DeleteStandardEngineResourceGroupRequest,
    DescribeStandardEngineResourceGroupsRequest, DescribeStandardEngineResourceGroupsResponse,
    LaunchStandardEngineResourceGroupsRequest, PauseStandardEngineResourceGroupsRequest,
    ResourceGroupInfo, ResourceGroupState, UpdateStandardEngineResourceGroupRequest,
};
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{
    attributes_from_response, join_id, kv_pairs_from_map, map_from_kv_pairs, opt_str,
    request_from_attributes, split_id,
};
use crate::error::Result;
use crate::resources::{Readiness, collect_pages, wait_for};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.resource_group")
        .with_description("Compute resource group inside a standard engine")
        .attribute(
            AttributeSchema::new("engine_resource_group_name", AttributeType::String).required(),
        )
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String).required())
        .attribute(AttributeSchema::new("auto_launch", types::non_negative_int()))
        .attribute(AttributeSchema::new("auto_pause", types::non_negative_int()))
        .attribute(AttributeSchema::new("auto_pause_time", types::positive_int()))
        .attribute(AttributeSchema::new("driver_cu_spec", types::size_spec()))
        .attribute(AttributeSchema::new("executor_cu_spec", types::size_spec()))
        .attribute(AttributeSchema::new("min_executor_nums", types::positive_int()))
        .attribute(AttributeSchema::new("max_executor_nums", types::positive_int()))
        .attribute(AttributeSchema::new("max_concurrency", types::positive_int()))
        .attribute(AttributeSchema::new(
            "resource_group_scene",
            AttributeType::String,
        ))
        .attribute(AttributeSchema::new("image_type", AttributeType::String))
        .attribute(AttributeSchema::new("image_version", AttributeType::String))
        .attribute(AttributeSchema::new(
            "frame_type",
            AttributeType::Enum(vec!["spark".to_string(), "machine-learning".to_string()]),
        ))
        .attribute(AttributeSchema::new(
            "static_config_pairs",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new(
            "dynamic_config_pairs",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(
            AttributeSchema::new(
                "desired_state",
                AttributeType::Enum(vec!["launched".to_string(), "paused".to_string()]),
            )
            .with_default(Value::String("launched".to_string())),
        )
        .attribute(
            AttributeSchema::new("engine_resource_group_id", AttributeType::String).computed(),
        )
        .attribute(AttributeSchema::new("resource_group_state", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
        .attribute(AttributeSchema::new("update_time", AttributeType::String).computed())
}

pub async fn find(
    client: &DlcClient,
    engine_name: &str,
    group_name: &str,
) -> Result<Option<ResourceGroupInfo>> {
    let request = DescribeStandardEngineResourceGroupsRequest {
        offset: 0,
        limit: PAGE_LIMIT,
        filters: Some(vec![
            Filter::new("data-engine-name", engine_name),
            Filter::new("engine-resource-group-name", group_name),
        ]),
        ..Default::default()
    };

    let response: DescribeStandardEngineResourceGroupsResponse = match client
        .call("DescribeStandardEngineResourceGroups", &request)
        .await
    {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(response
        .user_engine_resource_group_infos
        .into_iter()
        .find(|g| {
            g.engine_resource_group_name == group_name
                && g.data_engine_name.as_deref() == Some(engine_name)
        }))
}

/// List resource groups, following offset/limit pages to the end
pub async fn list(
    client: &DlcClient,
    filters: Option<Vec<Filter>>,
) -> Result<Vec<ResourceGroupInfo>> {
    let filters = &filters;
    collect_pages(|offset| async move {
        let request = DescribeStandardEngineResourceGroupsRequest {
            offset,
            limit: PAGE_LIMIT,
            filters: filters.clone(),
            ..Default::default()
        };
        let page: DescribeStandardEngineResourceGroupsResponse = client
            .call("DescribeStandardEngineResourceGroups", &request)
            .await?;
        Ok((page.user_engine_resource_group_infos, page.total_count))
    })
    .await
}

/// Flatten a group description into state attributes
pub fn state_attributes(info: &ResourceGroupInfo) -> Result<HashMap<String, Value>> {
    let mut attrs = attributes_from_response(info)?;
    if let Some(pairs) = &info.static_config_pairs {
        attrs.insert("static_config_pairs".to_string(), map_from_kv_pairs(pairs));
    }
    if let Some(pairs) = &info.dynamic_config_pairs {
        attrs.insert("dynamic_config_pairs".to_string(), map_from_kv_pairs(pairs));
    }
    let desired = match info.resource_group_state.map(ResourceGroupState::from_code) {
        Some(ResourceGroupState::Suspended) => "paused",
        _ => "launched",
    };
    attrs.insert(
        "desired_state".to_string(),
        Value::String(desired.to_string()),
    );
    Ok(attrs)
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    // Config pairs are a map in manifests but a {Key, Value} list on the wire.
    let mut plain = attrs.clone();
    plain.remove("static_config_pairs");
    plain.remove("dynamic_config_pairs");
    let mut request: CreateStandardEngineResourceGroupRequest = request_from_attributes(&plain)?;
    request.static_config_pairs = kv_pairs_from_map(attrs, "static_config_pairs");
    request.dynamic_config_pairs = kv_pairs_from_map(attrs, "dynamic_config_pairs");
    let engine_name = request.data_engine_name.clone();
    let group_name = request.engine_resource_group_name.clone();

    let _: EmptyResponse = client
        .call("CreateStandardEngineResourceGroup", &request)
        .await?;

    let mut info =
        wait_until_settled(client, &engine_name, &group_name, "resource group creation").await?;
    info!(engine = %engine_name, group = %group_name, "resource group created");

    if opt_str(attrs, "desired_state") == Some("paused") {
        pause(client, &group_name).await?;
        info = wait_until_settled(client, &engine_name, &group_name, "resource group pause").await?;
    }

    let identifier = join_id(&[&engine_name, &group_name]);
    let attrs = state_attributes(&info)?;
    Ok((identifier, attrs))
}

pub async fn read(
    client: &DlcClient,
    identifier: &str,
) -> Result<Option<HashMap<String, Value>>> {
    let parts = split_id(identifier, 2)?;
    match find(client, parts[0], parts[1]).await? {
        Some(info) => Ok(Some(state_attributes(&info)?)),
        None => Ok(None),
    }
}

pub async fn update(
    client: &DlcClient,
    identifier: &str,
    to: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let parts = split_id(identifier, 2)?;
    let (engine_name, group_name) = (parts[0].to_string(), parts[1].to_string());

    let mut plain = to.clone();
    plain.remove("static_config_pairs");
    plain.remove("dynamic_config_pairs");
    let mut request: UpdateStandardEngineResourceGroupRequest = request_from_attributes(&plain)?;
    request.static_config_pairs = kv_pairs_from_map(to, "static_config_pairs");
    request.dynamic_config_pairs = kv_pairs_from_map(to, "dynamic_config_pairs");
    let _: EmptyResponse = client
        .call("UpdateStandardEngineResourceGroup", &request)
        .await?;
    let mut info =
        wait_until_settled(client, &engine_name, &group_name, "resource group update").await?;

    if let Some(desired) = opt_str(to, "desired_state") {
        let current = info.resource_group_state.map(ResourceGroupState::from_code);
        let transition = match (desired, current) {
            ("paused", Some(ResourceGroupState::Running)) => Some(false),
            ("launched", Some(ResourceGroupState::Suspended)) => Some(true),
            _ => None,
        };
        if let Some(launch_it) = transition {
            if launch_it {
                launch(client, &group_name).await?;
            } else {
                pause(client, &group_name).await?;
            }
            info = wait_until_settled(
                client,
                &engine_name,
                &group_name,
                "resource group state transition",
            )
            .await?;
        }
    }

    info!(engine = %engine_name, group = %group_name, "resource group updated");
    state_attributes(&info)
}

pub async fn delete(client: &DlcClient, identifier: &str) -> Result<()> {
    let parts = split_id(identifier, 2)?;
    let (engine_name, group_name) = (parts[0].to_string(), parts[1].to_string());

    let request = DeleteStandardEngineResourceGroupRequest {
        engine_resource_group_name: group_name.clone(),
    };
    match client
        .call::<_, EmptyResponse>("DeleteStandardEngineResourceGroup", &request)
        .await
    {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    }

    let (engine, group) = (engine_name.as_str(), group_name.as_str());
    wait_for("resource group deletion", || async move {
        match find(client, engine, group).await? {
            None => Ok(Readiness::Ready(())),
            Some(info) => match info.resource_group_state.map(ResourceGroupState::from_code) {
                Some(s) if s.is_transitional() => Ok(Readiness::Converging(format!("{:?}", s))),
                Some(ResourceGroupState::Failed) => {
                    Ok(Readiness::Failed("Failed".to_string()))
                }
                Some(s) => Ok(Readiness::Converging(format!("{:?}", s))),
                None => Ok(Readiness::Converging("unknown".to_string())),
            },
        }
    })
    .await?;

    info!(engine = %engine_name, group = %group_name, "resource group deleted");
    Ok(())
}

async fn launch(client: &DlcClient, group_name: &str) -> Result<()> {
    let request = LaunchStandardEngineResourceGroupsRequest {
        engine_resource_group_names: vec![group_name.to_string()],
    };
    let _: EmptyResponse = client
        .call("LaunchStandardEngineResourceGroups", &request)
        .await?;
    Ok(())
}

async fn pause(client: &DlcClient, group_name: &str) -> Result<()> {
    let request = PauseStandardEngineResourceGroupsRequest {
        engine_resource_group_names: vec![group_name.to_string()],
    };
    let _: EmptyResponse = client
        .call("PauseStandardEngineResourceGroups", &request)
        .await?;
    Ok(())
}

/// Poll until the group leaves its transitional states
async fn wait_until_settled(
    client: &DlcClient,
    engine_name: &str,
    group_name: &str,
    what: &str,
) -> Result<ResourceGroupInfo> {
    wait_for(what, || async move {
        match find(client, engine_name, group_name).await? {
            None => Ok(Readiness::Converging("not visible yet".to_string())),
            Some(info) => match info.resource_group_state.map(ResourceGroupState::from_code) {
                Some(ResourceGroupState::Running) | Some(ResourceGroupState::Suspended) => {
                    Ok(Readiness::Ready(info))
                }
                Some(s) if s.is_transitional() => Ok(Readiness::Converging(format!("{:?}", s))),
                Some(s) => Ok(Readiness::Failed(format!("{:?}", s))),
                None => Ok(Readiness::Converging("no state reported".to_string())),
            },
        }
    })
    .await
}
