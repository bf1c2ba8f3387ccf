//! Work group API shapes
//!
//! A work group is a named grouping of users sharing permission policies.

use serde::{Deserialize, Serialize};

use super::Filter;

/// Permission policy bound to a user or work group
///
/// The deepest nested shape in the provider; it flattens into attribute
/// maps through the generic key-casing bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Policy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine: Option<String>,
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub re_auth: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkGroupRequest {
    pub work_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateWorkGroupResponse {
    pub work_group_id: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWorkGroupsRequest {
    pub offset: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeWorkGroupsResponse {
    #[serde(default)]
    pub work_group_set: Vec<WorkGroupInfo>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkGroupInfo {
    pub work_group_id: i64,
    pub work_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_num: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_set: Option<Vec<WorkGroupUser>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// User membership entry inside a work group
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkGroupUser {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyWorkGroupRequest {
    pub work_group_id: i64,
    pub work_group_description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteWorkGroupRequest {
    pub work_group_ids: Vec<i64>,
}

/// Membership change payload shared by add/delete user operations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserIdSetOfWorkGroupId {
    pub work_group_id: i64,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddUsersToWorkGroupRequest {
    pub add_info: UserIdSetOfWorkGroupId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteUsersFromWorkGroupRequest {
    pub add_info: UserIdSetOfWorkGroupId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachWorkGroupPolicyRequest {
    pub work_group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachWorkGroupPolicyRequest {
    pub work_group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
}
