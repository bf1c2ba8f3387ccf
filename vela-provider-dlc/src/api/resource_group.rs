//! Standard engine resource group API shapes

use serde::{Deserialize, Serialize};

use super::{Filter, KVPair};

/// Lifecycle codes reported for a resource group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceGroupState {
    Failed,
    Initializing,
    Suspended,
    Running,
    Deleting,
    Suspending,
    Resuming,
    Unknown(i64),
}

impl ResourceGroupState {
    pub fn from_code(code: i64) -> Self {
        match code {
            -1 => Self::Failed,
            0 => Self::Initializing,
            1 => Self::Suspended,
            2 => Self::Running,
            3 => Self::Deleting,
            4 => Self::Suspending,
            5 => Self::Resuming,
            other => Self::Unknown(other),
        }
    }

    /// States the service moves through on its own; polling should keep
    /// waiting while one of these is reported.
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Deleting | Self::Suspending | Self::Resuming
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateStandardEngineResourceGroupRequest {
    pub engine_resource_group_name: String,
    pub data_engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_launch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group_scene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_config_pairs: Option<Vec<KVPair>>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStandardEngineResourceGroupsRequest {
    pub offset: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sorting: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeStandardEngineResourceGroupsResponse {
    #[serde(default)]
    pub user_engine_resource_group_infos: Vec<ResourceGroupInfo>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceGroupInfo {
    pub engine_resource_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_resource_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group_state: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_launch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group_scene: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// Base-info updates (description-level fields) are a separate call from
/// resource sizing changes on the vendor side; both are folded here since
/// the service accepts partial payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateStandardEngineResourceGroupRequest {
    pub engine_resource_group_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_launch: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_pause_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_cu_spec: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub static_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_config_pairs: Option<Vec<KVPair>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteStandardEngineResourceGroupRequest {
    pub engine_resource_group_name: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LaunchStandardEngineResourceGroupsRequest {
    pub engine_resource_group_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PauseStandardEngineResourceGroupsRequest {
    pub engine_resource_group_names: Vec<String>,
}
