//! User API shapes

use serde::{Deserialize, Serialize};

use super::Filter;
use super::work_group::Policy;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateUserRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
    /// "ADMIN" or "COMMON"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeUsersRequest {
    pub offset: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeUsersResponse {
    #[serde(default)]
    pub user_set: Vec<UserInfo>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserInfo {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_set: Option<Vec<UserWorkGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
}

/// Work group membership entry attached to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserWorkGroup {
    pub work_group_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyUserRequest {
    pub user_id: String,
    pub user_description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteUserRequest {
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AttachUserPolicyRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachUserPolicyRequest {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_set: Option<Vec<Policy>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BindWorkGroupsToUserRequest {
    pub add_info: WorkGroupIdSetOfUserId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnbindWorkGroupsFromUserRequest {
    pub add_info: WorkGroupIdSetOfUserId,
}

/// Membership change payload shared by bind/unbind operations
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WorkGroupIdSetOfUserId {
    pub user_id: String,
    pub work_group_ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_request_serializes() {
        let req = CreateUserRequest {
            user_id: "100012345678".to_string(),
            user_description: Some("etl operator".to_string()),
            policy_set: None,
            user_type: Some("COMMON".to_string()),
            user_alias: None,
            work_group_ids: Some(vec![42]),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["UserId"], "100012345678");
        assert_eq!(json["UserType"], "COMMON");
        assert_eq!(json["WorkGroupIds"][0], 42);
        assert!(json.get("PolicySet").is_none());
    }

    #[test]
    fn users_response_decodes() {
        let json = serde_json::json!({
            "TotalCount": 1,
            "UserSet": [{
                "UserId": "alice",
                "UserType": "ADMIN",
                "WorkGroupSet": [{"WorkGroupId": 7, "WorkGroupName": "ops"}]
            }]
        });

        let resp: DescribeUsersResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.total_count, 1);
        assert_eq!(
            resp.user_set[0].work_group_set.as_ref().unwrap()[0].work_group_id,
            7
        );
    }
}
