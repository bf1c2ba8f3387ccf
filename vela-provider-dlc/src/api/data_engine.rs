//! Data engine API shapes
//!
//! A data engine is a DLC compute cluster (Spark or Presto). Engines move
//! through a small integer state machine on the service side; the codes are
//! modeled explicitly so polling can tell "still converging" from terminal
//! failure.

use serde::{Deserialize, Serialize};

use super::{Filter, KVPair};

/// Service-side engine lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Deleted,
    Failed,
    Initializing,
    Suspended,
    Running,
    ToBeDeleted,
    Deleting,
    Suspending,
    Resuming,
}

impl EngineState {
    /// Decode the wire state code
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -2 => Some(Self::Deleted),
            -1 => Some(Self::Failed),
            0 => Some(Self::Initializing),
            1 => Some(Self::Suspended),
            2 => Some(Self::Running),
            3 => Some(Self::ToBeDeleted),
            4 => Some(Self::Deleting),
            5 => Some(Self::Suspending),
            6 => Some(Self::Resuming),
            _ => None,
        }
    }

    /// Whether the engine can still converge toward a target state
    pub fn is_transitional(self) -> bool {
        matches!(
            self,
            Self::Initializing | Self::Deleting | Self::Suspending | Self::Resuming
        )
    }
}

/// Scheduled suspend/resume strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrontabResumeSuspendStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_strategy: Option<i64>,
}

/// Default resource template for sessions started on this engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionResourceTemplate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_nums: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executor_max_numbers: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDataEngineRequest {
    pub engine_type: String,
    pub data_engine_name: String,
    pub cluster_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_span: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend_strategy: Option<CrontabResumeSuspendStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_exec_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerable_queue_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_version_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_switch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resource_template: Option<SessionResourceTemplate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDataEngineResponse {
    pub data_engine_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDataEnginesRequest {
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
pub struct DescribeDataEnginesResponse {
    #[serde(default)]
    pub data_engines: Vec<DataEngineInfo>,
    #[serde(default)]
    pub total_count: i64,
}

/// Engine description as returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataEngineInfo {
    pub data_engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_type: Option<String>,
    pub state: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_exec_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerable_queue_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend_strategy: Option<CrontabResumeSuspendStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_version_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_switch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resource_template: Option<SessionResourceTemplate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_config_pairs: Option<Vec<KVPair>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDataEngineRequest {
    pub data_engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_clusters: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_resume: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_suspend_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crontab_resume_suspend_strategy: Option<CrontabResumeSuspendStrategy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrency: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerable_queue_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_switch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elastic_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_resource_template: Option<SessionResourceTemplate>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteDataEngineRequest {
    pub data_engine_names: Vec<String>,
}

/// Suspend (operate = "suspend") or resume (operate = "resume") an engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SuspendResumeDataEngineRequest {
    pub data_engine_name: String,
    pub operate: String,
}

/// Replace the session-level configuration pairs of an engine
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateDataEngineConfigRequest {
    pub data_engine_name: String,
    pub data_engine_config_pairs: Vec<KVPair>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_lakefs_status: Option<bool>,
}

/// Empty response body (most mutations return only a RequestId)
#[derive(Debug, Clone, Deserialize)]
pub struct EmptyResponse {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_state_codes() {
        assert_eq!(EngineState::from_code(2), Some(EngineState::Running));
        assert_eq!(EngineState::from_code(1), Some(EngineState::Suspended));
        assert_eq!(EngineState::from_code(-1), Some(EngineState::Failed));
        assert_eq!(EngineState::from_code(99), None);
    }

    #[test]
    fn transitional_states() {
        assert!(EngineState::Initializing.is_transitional());
        assert!(EngineState::Resuming.is_transitional());
        assert!(!EngineState::Running.is_transitional());
        assert!(!EngineState::Failed.is_transitional());
    }

    #[test]
    fn create_request_omits_unset_fields() {
        let req = CreateDataEngineRequest {
            engine_type: "spark".to_string(),
            data_engine_name: "vela-engine".to_string(),
            cluster_type: "spark_cr".to_string(),
            max_clusters: Some(5),
            ..Default::default()
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["EngineType"], "spark");
        assert_eq!(json["MaxClusters"], 5);
        assert!(json.get("MinClusters").is_none());
        assert!(json.get("CidrBlock").is_none());
    }

    #[test]
    fn describe_response_defaults() {
        let json = serde_json::json!({"RequestId": "req-1"});
        let resp: DescribeDataEnginesResponse = serde_json::from_value(json).unwrap();
        assert!(resp.data_engines.is_empty());
        assert_eq!(resp.total_count, 0);
    }

    #[test]
    fn engine_info_decodes() {
        let json = serde_json::json!({
            "DataEngineName": "vela-engine",
            "DataEngineId": "engine-abc",
            "EngineType": "spark",
            "State": 2,
            "MaxClusters": 5,
            "SessionResourceTemplate": {"DriverSize": "small", "ExecutorNums": 2}
        });
        let info: DataEngineInfo = serde_json::from_value(json).unwrap();
        assert_eq!(info.data_engine_name, "vela-engine");
        assert_eq!(EngineState::from_code(info.state), Some(EngineState::Running));
        assert_eq!(
            info.session_resource_template.unwrap().driver_size.as_deref(),
            Some("small")
        );
    }
}
