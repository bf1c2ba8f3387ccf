//! `dlc.work_group` - a named grouping of users sharing permission policies
//!
//! The service-side identifier is a numeric work group id; membership and
//! policy changes are separate API calls, so update computes set deltas
//! against the last-read state.

use std::collections::{HashMap, HashSet};

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::api::work_group::{
    AddUsersToWorkGroupRequest, AttachWorkGroupPolicyRequest, CreateWorkGroupRequest,
    CreateWorkGroupResponse, DeleteUsersFromWorkGroupRequest, DeleteWorkGroupRequest,
    DescribeWorkGroupsRequest, DescribeWorkGroupsResponse, DetachWorkGroupPolicyRequest,
    ModifyWorkGroupRequest, Policy, UserIdSetOfWorkGroupId, WorkGroupInfo,
};
use crate::api::data_engine::EmptyResponse;
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{attributes_from_response, json_keys_to_pascal, opt_str, request_from_attributes};
use crate::error::{DlcError, Result};
use crate::resources::collect_pages;

/// Keys the service stamps onto stored policies; they never appear in a
/// manifest, so they are stripped before diffing.
pub(crate) const SERVICE_POLICY_KEYS: &[&str] = &[
    "id",
    "create_time",
    "operator",
    "source",
    "source_id",
    "source_name",
    "mode",
    "re_auth",
];

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.work_group")
        .with_description("User group sharing DLC permission policies")
        .attribute(AttributeSchema::new("work_group_name", AttributeType::String).required())
        .attribute(AttributeSchema::new(
            "work_group_description",
            AttributeType::String,
        ))
        .attribute(AttributeSchema::new(
            "user_ids",
            AttributeType::List(Box::new(AttributeType::String)),
        ))
        .attribute(AttributeSchema::new("policy_set", policy_list()))
        .attribute(AttributeSchema::new("work_group_id", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("user_num", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("creator", AttributeType::String).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
}

/// Attribute type for a list of permission policy maps
pub(crate) fn policy_list() -> AttributeType {
    AttributeType::Custom {
        name: "PolicyList".to_string(),
        base: Box::new(AttributeType::List(Box::new(AttributeType::Map(
            Box::new(AttributeType::String),
        )))),
        validate: |value| {
            let Value::List(items) = value else {
                return Err("Expected a list of policy maps".to_string());
            };
            for item in items {
                let Value::Map(map) = item else {
                    return Err("Each policy must be a map".to_string());
                };
                if map.get("operation").and_then(Value::as_str).is_none() {
                    return Err("Each policy needs a string 'operation'".to_string());
                }
            }
            Ok(())
        },
    }
}

/// Parse the `policy_set` attribute into wire policies
pub(crate) fn policies_from_attrs(attrs: &HashMap<String, Value>) -> Result<Vec<Policy>> {
    match attrs.get("policy_set") {
        Some(value) => {
            let json = json_keys_to_pascal(value.to_json());
            Ok(serde_json::from_value(json)?)
        }
        None => Ok(Vec::new()),
    }
}

pub(crate) fn parse_group_id(identifier: &str) -> Result<i64> {
    identifier
        .parse::<i64>()
        .map_err(|_| DlcError::InvalidIdentifier {
            id: identifier.to_string(),
            message: "expected a numeric work group id".to_string(),
        })
}

pub async fn find(client: &DlcClient, work_group_id: i64) -> Result<Option<WorkGroupInfo>> {
    let request = DescribeWorkGroupsRequest {
        offset: 0,
        limit: PAGE_LIMIT,
        work_group_id: Some(work_group_id),
        ..Default::default()
    };

    let response: DescribeWorkGroupsResponse =
        match client.call("DescribeWorkGroups", &request).await {
            Ok(r) => r,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

    Ok(response
        .work_group_set
        .into_iter()
        .find(|g| g.work_group_id == work_group_id))
}

/// List every work group, following offset/limit pages to the end
pub async fn list(client: &DlcClient) -> Result<Vec<WorkGroupInfo>> {
    collect_pages(|offset| async move {
        let request = DescribeWorkGroupsRequest {
            offset,
            limit: PAGE_LIMIT,
            ..Default::default()
        };
        let page: DescribeWorkGroupsResponse = client.call("DescribeWorkGroups", &request).await?;
        Ok((page.work_group_set, page.total_count))
    })
    .await
}

/// Flatten a work group description into state attributes
pub fn state_attributes(info: &WorkGroupInfo) -> Result<HashMap<String, Value>> {
    let mut attrs = attributes_from_response(info)?;

    // Membership is represented as the user_ids list in manifests.
    if let Some(users) = &info.user_set {
        let ids: Vec<Value> = users
            .iter()
            .map(|u| Value::String(u.user_id.clone()))
            .collect();
        attrs.insert("user_ids".to_string(), Value::List(ids));
    }
    attrs.remove("user_set");

    sanitize_policy_set(&mut attrs);
    Ok(attrs)
}

/// Drop service-stamped keys from stored policies so they compare equal to
/// the manifest form
fn sanitize_policy_set(attrs: &mut HashMap<String, Value>) {
    if let Some(Value::List(policies)) = attrs.get_mut("policy_set") {
        for policy in policies {
            if let Value::Map(map) = policy {
                for key in SERVICE_POLICY_KEYS {
                    map.remove(*key);
                }
            }
        }
    }
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    let request: CreateWorkGroupRequest = request_from_attributes(attrs)?;
    let name = request.work_group_name.clone();

    let response: CreateWorkGroupResponse = client.call("CreateWorkGroup", &request).await?;
    let work_group_id = response.work_group_id.ok_or_else(|| {
        DlcError::MalformedResponse(
            "CreateWorkGroup returned no work group id".to_string(),
        )
    })?;

    info!(group = %name, id = work_group_id, "work group created");

    let info = find(client, work_group_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!(
            "work group {} not visible after create",
            work_group_id
        ))
    })?;

    Ok((work_group_id.to_string(), state_attributes(&info)?))
}

pub async fn read(
    client: &DlcClient,
    identifier: &str,
) -> Result<Option<HashMap<String, Value>>> {
    let work_group_id = parse_group_id(identifier)?;
    match find(client, work_group_id).await? {
        Some(info) => Ok(Some(state_attributes(&info)?)),
        None => Ok(None),
    }
}

pub async fn update(
    client: &DlcClient,
    identifier: &str,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let work_group_id = parse_group_id(identifier)?;

    if let Some(description) = opt_str(to, "work_group_description")
        && opt_str(from, "work_group_description") != Some(description)
    {
        let request = ModifyWorkGroupRequest {
            work_group_id,
            work_group_description: description.to_string(),
        };
        let _: EmptyResponse = client.call("ModifyWorkGroup", &request).await?;
    }

    reconcile_members(client, work_group_id, from, to).await?;
    reconcile_policies(client, work_group_id, from, to).await?;

    let info = find(client, work_group_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!(
            "work group {} not visible after update",
            work_group_id
        ))
    })?;

    info!(id = work_group_id, "work group updated");
    state_attributes(&info)
}

pub async fn delete(client: &DlcClient, identifier: &str) -> Result<()> {
    let work_group_id = parse_group_id(identifier)?;
    let request = DeleteWorkGroupRequest {
        work_group_ids: vec![work_group_id],
    };
    match client.call::<_, EmptyResponse>("DeleteWorkGroup", &request).await {
        Ok(_) => {
            info!(id = work_group_id, "work group deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

fn user_id_set(attrs: &HashMap<String, Value>) -> HashSet<String> {
    match attrs.get("user_ids") {
        Some(Value::List(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => HashSet::new(),
    }
}

async fn reconcile_members(
    client: &DlcClient,
    work_group_id: i64,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> Result<()> {
    let current = user_id_set(from);
    let desired = user_id_set(to);

    let added: Vec<String> = desired.difference(&current).cloned().collect();
    let removed: Vec<String> = current.difference(&desired).cloned().collect();

    if !added.is_empty() {
        let request = AddUsersToWorkGroupRequest {
            add_info: UserIdSetOfWorkGroupId {
                work_group_id,
                user_ids: added,
            },
        };
        let _: EmptyResponse = client.call("AddUsersToWorkGroup", &request).await?;
    }

    if !removed.is_empty() {
        let request = DeleteUsersFromWorkGroupRequest {
            add_info: UserIdSetOfWorkGroupId {
                work_group_id,
                user_ids: removed,
            },
        };
        let _: EmptyResponse = client.call("DeleteUsersFromWorkGroup", &request).await?;
    }

    Ok(())
}

async fn reconcile_policies(
    client: &DlcClient,
    work_group_id: i64,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> Result<()> {
    let current = policies_from_attrs(from)?;
    let desired = policies_from_attrs(to)?;

    let attach: Vec<Policy> = desired
        .iter()
        .filter(|p| !current.contains(p))
        .cloned()
        .collect();
    let detach: Vec<Policy> = current
        .iter()
        .filter(|p| !desired.contains(p))
        .cloned()
        .collect();

    if !attach.is_empty() {
        let request = AttachWorkGroupPolicyRequest {
            work_group_id,
            policy_set: Some(attach),
        };
        let _: EmptyResponse = client.call("AttachWorkGroupPolicy", &request).await?;
    }

    if !detach.is_empty() {
        let request = DetachWorkGroupPolicyRequest {
            work_group_id,
            policy_set: Some(detach),
        };
        let _: EmptyResponse = client.call("DetachWorkGroupPolicy", &request).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::work_group::WorkGroupUser;

    fn policy_map(operation: &str, database: &str) -> Value {
        let mut map = HashMap::new();
        map.insert(
            "operation".to_string(),
            Value::String(operation.to_string()),
        );
        map.insert("database".to_string(), Value::String(database.to_string()));
        map.insert("catalog".to_string(), Value::String("DataLakeCatalog".to_string()));
        Value::Map(map)
    }

    #[test]
    fn schema_validates_manifest_with_policies() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "work_group_name".to_string(),
            Value::String("analysts".to_string()),
        );
        attrs.insert(
            "user_ids".to_string(),
            Value::List(vec![Value::String("alice".to_string())]),
        );
        attrs.insert(
            "policy_set".to_string(),
            Value::List(vec![policy_map("SELECT", "sales")]),
        );

        assert!(schema().validate(&attrs).is_ok());
    }

    #[test]
    fn schema_rejects_policy_without_operation() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "work_group_name".to_string(),
            Value::String("analysts".to_string()),
        );
        let mut bad = HashMap::new();
        bad.insert("database".to_string(), Value::String("sales".to_string()));
        attrs.insert(
            "policy_set".to_string(),
            Value::List(vec![Value::Map(bad)]),
        );

        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn policies_parse_from_attribute_maps() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "policy_set".to_string(),
            Value::List(vec![policy_map("SELECT", "sales")]),
        );

        let policies = policies_from_attrs(&attrs).unwrap();
        assert_eq!(policies.len(), 1);
        assert_eq!(policies[0].operation, "SELECT");
        assert_eq!(policies[0].database.as_deref(), Some("sales"));
    }

    #[test]
    fn state_attributes_flatten_membership_and_strip_service_keys() {
        let info = WorkGroupInfo {
            work_group_id: 42,
            work_group_name: "analysts".to_string(),
            work_group_description: Some("reporting".to_string()),
            user_num: Some(1),
            user_set: Some(vec![WorkGroupUser {
                user_id: "alice".to_string(),
                user_description: None,
                creator: Some("root".to_string()),
                create_time: None,
            }]),
            policy_set: Some(vec![Policy {
                database: Some("sales".to_string()),
                operation: "SELECT".to_string(),
                id: Some(9),
                create_time: Some("2024-05-01 00:00:00".to_string()),
                ..Default::default()
            }]),
            creator: None,
            create_time: None,
        };

        let attrs = state_attributes(&info).unwrap();
        assert_eq!(
            attrs.get("user_ids"),
            Some(&Value::List(vec![Value::String("alice".to_string())]))
        );
        assert!(attrs.get("user_set").is_none());

        let Some(Value::List(policies)) = attrs.get("policy_set") else {
            panic!("expected policy list");
        };
        let Value::Map(policy) = &policies[0] else {
            panic!("expected policy map");
        };
        assert_eq!(policy.get("operation"), Some(&Value::String("SELECT".to_string())));
        assert!(policy.get("id").is_none());
        assert!(policy.get("create_time").is_none());
    }

    #[test]
    fn group_id_parses_or_errors() {
        assert_eq!(parse_group_id("42").unwrap(), 42);
        assert!(parse_group_id("analysts").is_err());
    }
}
