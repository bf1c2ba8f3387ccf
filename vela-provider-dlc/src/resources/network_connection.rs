//! `dlc.network_connection` - VPC connectivity for an engine
//!
//! Connection names are unique per engine, so the identifier is the
//! composite `engine-name#connection-name`.

use std::collections::HashMap;

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::api::data_engine::EmptyResponse;
use crate::api::network::{
    CreateNetworkConnectionRequest, DeleteNetworkConnectionRequest,
    DescribeNetworkConnectionsRequest, DescribeNetworkConnectionsResponse,
    NetworkConnectionInfo, UpdateNetworkConnectionRequest,
};
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{attributes_from_response, join_id, opt_str, request_from_attributes, split_id};
use crate::error::{DlcError, Result};
use crate::resources::collect_pages;

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.network_connection")
        .with_description("VPC network connection bound to an engine")
        .attribute(
            AttributeSchema::new("network_connection_name", AttributeType::String).required(),
        )
        .attribute(AttributeSchema::new("network_connection_type", types::positive_int()).required())
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "network_connection_desc",
            AttributeType::String,
        ))
        .attribute(AttributeSchema::new("uniq_vpc_id", AttributeType::String))
        .attribute(AttributeSchema::new("subnet_id", AttributeType::String))
        .attribute(AttributeSchema::new("subnet_cidr_block", types::cidr()))
        .attribute(AttributeSchema::new("id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("state", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("update_time", AttributeType::Int).computed())
}

pub async fn find(
    client: &DlcClient,
    engine_name: &str,
    connection_name: &str,
) -> Result<Option<NetworkConnectionInfo>> {
    let connections = collect_pages(|offset| async move {
        let request = DescribeNetworkConnectionsRequest {
            offset,
            limit: PAGE_LIMIT,
            network_connection_name: Some(connection_name.to_string()),
            data_engine_name: Some(engine_name.to_string()),
            ..Default::default()
        };
        let page: DescribeNetworkConnectionsResponse =
            match client.call("DescribeNetworkConnections", &request).await {
                Ok(r) => r,
                Err(e) if e.is_not_found() => return Ok((Vec::new(), 0)),
                Err(e) => return Err(e),
            };
        Ok((page.network_connection_set, page.total_count))
    })
    .await?;

    Ok(connections
        .into_iter()
        .find(|c| c.network_connection_name == connection_name))
}

/// List network connections, following offset/limit pages to the end
pub async fn list(
    client: &DlcClient,
    engine_name: Option<&str>,
) -> Result<Vec<NetworkConnectionInfo>> {
    collect_pages(|offset| async move {
        let request = DescribeNetworkConnectionsRequest {
            offset,
            limit: PAGE_LIMIT,
            data_engine_name: engine_name.map(str::to_string),
            ..Default::default()
        };
        let page: DescribeNetworkConnectionsResponse =
            client.call("DescribeNetworkConnections", &request).await?;
        Ok((page.network_connection_set, page.total_count))
    })
    .await
}

pub fn state_attributes(info: &NetworkConnectionInfo) -> Result<HashMap<String, Value>> {
    attributes_from_response(info)
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    let request: CreateNetworkConnectionRequest = request_from_attributes(attrs)?;
    let engine_name = request.data_engine_name.clone();
    let connection_name = request.network_connection_name.clone();

    let _: EmptyResponse = client.call("CreateNetworkConnection", &request).await?;
    info!(engine = %engine_name, connection = %connection_name, "network connection created");

    let info = find(client, &engine_name, &connection_name)
        .await?
        .ok_or_else(|| {
            DlcError::MalformedResponse(format!(
                "network connection {} not visible after create",
                connection_name
            ))
        })?;

    let identifier = join_id(&[&engine_name, &connection_name]);
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
    let (engine_name, connection_name) = (parts[0].to_string(), parts[1].to_string());

    // Only the description is mutable in place.
    let desc = opt_str(to, "network_connection_desc").unwrap_or_default();
    let request = UpdateNetworkConnectionRequest {
        network_connection_name: connection_name.clone(),
        network_connection_desc: desc.to_string(),
    };
    let _: EmptyResponse = client.call("UpdateNetworkConnection", &request).await?;

    let info = find(client, &engine_name, &connection_name)
        .await?
        .ok_or_else(|| {
            DlcError::MalformedResponse(format!(
                "network connection {} not visible after update",
                connection_name
            ))
        })?;

    info!(connection = %connection_name, "network connection updated");
    state_attributes(&info)
}

pub async fn delete(client: &DlcClient, identifier: &str) -> Result<()> {
    let parts = split_id(identifier, 2)?;
    let connection_name = parts[1];

    let request = DeleteNetworkConnectionRequest {
        network_connection_name: connection_name.to_string(),
    };
    match client
        .call::<_, EmptyResponse>("DeleteNetworkConnection", &request)
        .await
    {
        Ok(_) => {
            info!(connection = %connection_name, "network connection deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}
