//! Read-only data sources
//!
//! Each data source runs the paginated Describe call for its API group,
//! with filters taken from the declared attributes, and stores the result
//! list in the computed `items` attribute.

use std::collections::HashMap;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use crate::api::Filter;
use crate::client::DlcClient;
use crate::convert::{opt_str, value_from_wire};
use crate::error::Result;
use crate::resources::{data_engine, network_connection, resource_group, user, work_group};

fn items() -> AttributeSchema {
    AttributeSchema::new("items", AttributeType::List(Box::new(types::scalar_map()))).computed()
}

fn total_count() -> AttributeSchema {
    AttributeSchema::new("total_count", AttributeType::Int).computed()
}

pub fn data_engines_schema() -> ResourceSchema {
    ResourceSchema::new("dlc.data_engines")
        .with_description("Lists DLC engines, optionally filtered by name")
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String))
        .attribute(AttributeSchema::new("engine_exec_type", AttributeType::String))
        .attribute(items())
        .attribute(total_count())
}

pub fn work_groups_schema() -> ResourceSchema {
    ResourceSchema::new("dlc.work_groups")
        .with_description("Lists DLC work groups")
        .attribute(items())
        .attribute(total_count())
}

pub fn users_schema() -> ResourceSchema {
    ResourceSchema::new("dlc.users")
        .with_description("Lists DLC users")
        .attribute(items())
        .attribute(total_count())
}

pub fn resource_groups_schema() -> ResourceSchema {
    ResourceSchema::new("dlc.resource_groups")
        .with_description("Lists engine resource groups, optionally per engine")
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String))
        .attribute(items())
        .attribute(total_count())
}

pub fn network_connections_schema() -> ResourceSchema {
    ResourceSchema::new("dlc.network_connections")
        .with_description("Lists network connections, optionally per engine")
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String))
        .attribute(items())
        .attribute(total_count())
}

fn result_attributes(items: Vec<Value>) -> HashMap<String, Value> {
    let mut attrs = HashMap::new();
    attrs.insert("total_count".to_string(), Value::Int(items.len() as i64));
    attrs.insert("items".to_string(), Value::List(items));
    attrs
}

pub async fn read_data_engines(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let mut filters = Vec::new();
    if let Some(name) = opt_str(attrs, "data_engine_name") {
        filters.push(Filter::new("data-engine-name", name));
    }
    if let Some(exec_type) = opt_str(attrs, "engine_exec_type") {
        filters.push(Filter::new("engine-exec-type", exec_type));
    }
    let filters = if filters.is_empty() { None } else { Some(filters) };

    let engines = data_engine::list(client, filters).await?;
    let items = engines
        .iter()
        .map(value_from_wire)
        .collect::<Result<Vec<_>>>()?;
    Ok(result_attributes(items))
}

pub async fn read_work_groups(
    client: &DlcClient,
    _attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let groups = work_group::list(client).await?;
    let items = groups
        .iter()
        .map(value_from_wire)
        .collect::<Result<Vec<_>>>()?;
    Ok(result_attributes(items))
}

pub async fn read_users(
    client: &DlcClient,
    _attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let users = user::list(client).await?;
    let items = users
        .iter()
        .map(value_from_wire)
        .collect::<Result<Vec<_>>>()?;
    Ok(result_attributes(items))
}

pub async fn read_resource_groups(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let filters = opt_str(attrs, "data_engine_name")
        .map(|name| vec![Filter::new("data-engine-name", name)]);

    let groups = resource_group::list(client, filters).await?;
    let items = groups
        .iter()
        .map(value_from_wire)
        .collect::<Result<Vec<_>>>()?;
    Ok(result_attributes(items))
}

pub async fn read_network_connections(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let connections =
        network_connection::list(client, opt_str(attrs, "data_engine_name")).await?;
    let items = connections
        .iter()
        .map(value_from_wire)
        .collect::<Result<Vec<_>>>()?;
    Ok(result_attributes(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_schemas_mark_results_computed() {
        for schema in [
            data_engines_schema(),
            work_groups_schema(),
            users_schema(),
            resource_groups_schema(),
            network_connections_schema(),
        ] {
            let computed: Vec<&str> = schema.computed_attributes().collect();
            assert!(computed.contains(&"items"), "{}", schema.resource_type);
            assert!(
                computed.contains(&"total_count"),
                "{}",
                schema.resource_type
            );
        }
    }

    #[test]
    fn setting_items_in_a_manifest_is_rejected() {
        let mut attrs = HashMap::new();
        attrs.insert("items".to_string(), Value::List(vec![]));
        assert!(data_engines_schema().validate(&attrs).is_err());
    }

    #[test]
    fn result_attributes_count_matches() {
        let attrs = result_attributes(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(attrs.get("total_count"), Some(&Value::Int(2)));
    }
}
