//! `dlc.user` - a DLC account bound to policies and work groups
//!
//! The service identifier is the user id itself. Policy and work group
//! bindings are separate calls, reconciled by set deltas on update.

use std::collections::{HashMap, HashSet};

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use crate::api::data_engine::EmptyResponse;
use crate::api::user::{
    AttachUserPolicyRequest, BindWorkGroupsToUserRequest, CreateUserRequest, DeleteUserRequest,
    DescribeUsersRequest, DescribeUsersResponse, DetachUserPolicyRequest, ModifyUserRequest,
    UnbindWorkGroupsFromUserRequest, UserInfo, WorkGroupIdSetOfUserId,
};
use crate::api::work_group::Policy;
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{attributes_from_response, opt_str, request_from_attributes};
use crate::error::{DlcError, Result};
use crate::resources::collect_pages;
use crate::resources::work_group::{policies_from_attrs, policy_list};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.user")
        .with_description("DLC user account with policies and group memberships")
        .attribute(AttributeSchema::new("user_id", AttributeType::String).required())
        .attribute(AttributeSchema::new("user_description", AttributeType::String))
        .attribute(AttributeSchema::new(
            "user_type",
            AttributeType::Enum(vec!["ADMIN".to_string(), "COMMON".to_string()]),
        ))
        .attribute(AttributeSchema::new("user_alias", AttributeType::String))
        .attribute(AttributeSchema::new(
            "work_group_ids",
            AttributeType::List(Box::new(AttributeType::Int)),
        ))
        .attribute(AttributeSchema::new("policy_set", policy_list()))
        .attribute(AttributeSchema::new("creator", AttributeType::String).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::String).computed())
}

pub async fn find(client: &DlcClient, user_id: &str) -> Result<Option<UserInfo>> {
    let request = DescribeUsersRequest {
        offset: 0,
        limit: PAGE_LIMIT,
        user_id: Some(user_id.to_string()),
        ..Default::default()
    };

    let response: DescribeUsersResponse = match client.call("DescribeUsers", &request).await {
        Ok(r) => r,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };

    Ok(response.user_set.into_iter().find(|u| u.user_id == user_id))
}

/// List every user, following offset/limit pages to the end
pub async fn list(client: &DlcClient) -> Result<Vec<UserInfo>> {
    collect_pages(|offset| async move {
        let request = DescribeUsersRequest {
            offset,
            limit: PAGE_LIMIT,
            ..Default::default()
        };
        let page: DescribeUsersResponse = client.call("DescribeUsers", &request).await?;
        Ok((page.user_set, page.total_count))
    })
    .await
}

/// Flatten a user description into state attributes
pub fn state_attributes(info: &UserInfo) -> Result<HashMap<String, Value>> {
    let mut attrs = attributes_from_response(info)?;

    // Group membership is represented as the work_group_ids list.
    if let Some(groups) = &info.work_group_set {
        let ids: Vec<Value> = groups.iter().map(|g| Value::Int(g.work_group_id)).collect();
        attrs.insert("work_group_ids".to_string(), Value::List(ids));
    }
    attrs.remove("work_group_set");

    if let Some(Value::List(policies)) = attrs.get_mut("policy_set") {
        for policy in policies {
            if let Value::Map(map) = policy {
                for key in super::work_group::SERVICE_POLICY_KEYS {
                    map.remove(*key);
                }
            }
        }
    }

    Ok(attrs)
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    let request: CreateUserRequest = request_from_attributes(attrs)?;
    let user_id = request.user_id.clone();

    let _: EmptyResponse = client.call("CreateUser", &request).await?;
    info!(user = %user_id, "user created");

    let info = find(client, &user_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!("user {} not visible after create", user_id))
    })?;

    Ok((user_id, state_attributes(&info)?))
}

pub async fn read(client: &DlcClient, user_id: &str) -> Result<Option<HashMap<String, Value>>> {
    match find(client, user_id).await? {
        Some(info) => Ok(Some(state_attributes(&info)?)),
        None => Ok(None),
    }
}

pub async fn update(
    client: &DlcClient,
    user_id: &str,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    if let Some(description) = opt_str(to, "user_description")
        && opt_str(from, "user_description") != Some(description)
    {
        let request = ModifyUserRequest {
            user_id: user_id.to_string(),
            user_description: description.to_string(),
        };
        let _: EmptyResponse = client.call("ModifyUser", &request).await?;
    }

    reconcile_work_groups(client, user_id, from, to).await?;
    reconcile_policies(client, user_id, from, to).await?;

    let info = find(client, user_id).await?.ok_or_else(|| {
        DlcError::MalformedResponse(format!("user {} not visible after update", user_id))
    })?;

    info!(user = %user_id, "user updated");
    state_attributes(&info)
}

pub async fn delete(client: &DlcClient, user_id: &str) -> Result<()> {
    let request = DeleteUserRequest {
        user_ids: vec![user_id.to_string()],
    };
    match client.call::<_, EmptyResponse>("DeleteUser", &request).await {
        Ok(_) => {
            info!(user = %user_id, "user deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => Ok(()),
        Err(e) => Err(e),
    }
}

fn work_group_id_set(attrs: &HashMap<String, Value>) -> HashSet<i64> {
    match attrs.get("work_group_ids") {
        Some(Value::List(items)) => items.iter().filter_map(Value::as_int).collect(),
        _ => HashSet::new(),
    }
}

async fn reconcile_work_groups(
    client: &DlcClient,
    user_id: &str,
    from: &HashMap<String, Value>,
    to: &HashMap<String, Value>,
) -> Result<()> {
    let current = work_group_id_set(from);
    let desired = work_group_id_set(to);

    let added: Vec<i64> = desired.difference(&current).copied().collect();
    let removed: Vec<i64> = current.difference(&desired).copied().collect();

    if !added.is_empty() {
        let request = BindWorkGroupsToUserRequest {
            add_info: WorkGroupIdSetOfUserId {
                user_id: user_id.to_string(),
                work_group_ids: added,
            },
        };
        let _: EmptyResponse = client.call("BindWorkGroupsToUser", &request).await?;
    }

    if !removed.is_empty() {
        let request = UnbindWorkGroupsFromUserRequest {
            add_info: WorkGroupIdSetOfUserId {
                user_id: user_id.to_string(),
                work_group_ids: removed,
            },
        };
        let _: EmptyResponse = client.call("UnbindWorkGroupsFromUser", &request).await?;
    }

    Ok(())
}

async fn reconcile_policies(
    client: &DlcClient,
    user_id: &str,
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
        let request = AttachUserPolicyRequest {
            user_id: user_id.to_string(),
            policy_set: Some(attach),
        };
        let _: EmptyResponse = client.call("AttachUserPolicy", &request).await?;
    }

    if !detach.is_empty() {
        let request = DetachUserPolicyRequest {
            user_id: user_id.to_string(),
            policy_set: Some(detach),
        };
        let _: EmptyResponse = client.call("DetachUserPolicy", &request).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::user::UserWorkGroup;

    #[test]
    fn schema_validates_manifest() {
        let mut attrs = HashMap::new();
        attrs.insert("user_id".to_string(), Value::String("alice".to_string()));
        attrs.insert("user_type".to_string(), Value::String("COMMON".to_string()));
        attrs.insert(
            "work_group_ids".to_string(),
            Value::List(vec![Value::Int(7)]),
        );

        assert!(schema().validate(&attrs).is_ok());
    }

    #[test]
    fn schema_rejects_unknown_user_type() {
        let mut attrs = HashMap::new();
        attrs.insert("user_id".to_string(), Value::String("alice".to_string()));
        attrs.insert("user_type".to_string(), Value::String("ROOT".to_string()));

        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn state_attributes_flatten_group_membership() {
        let info = UserInfo {
            user_id: "alice".to_string(),
            user_description: Some("analyst".to_string()),
            user_type: Some("COMMON".to_string()),
            user_alias: None,
            policy_set: None,
            work_group_set: Some(vec![UserWorkGroup {
                work_group_id: 7,
                work_group_name: Some("analysts".to_string()),
            }]),
            creator: None,
            create_time: None,
        };

        let attrs = state_attributes(&info).unwrap();
        assert_eq!(
            attrs.get("work_group_ids"),
            Some(&Value::List(vec![Value::Int(7)]))
        );
        assert!(attrs.get("work_group_set").is_none());
        assert_eq!(
            attrs.get("user_id"),
            Some(&Value::String("alice".to_string()))
        );
    }
}
