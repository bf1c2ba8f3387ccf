//! Data mask strategy API shapes

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDataMaskStrategyRequest {
    pub strategy: DataMaskStrategy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateDataMaskStrategyResponse {
    #[serde(default)]
    pub strategy_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataMaskStrategy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<DataMaskStrategyGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
}

/// A work group granted the masked view of the data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataMaskStrategyGroup {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_group_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDataMaskStrategiesRequest {
    pub offset: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeDataMaskStrategiesResponse {
    #[serde(default)]
    pub strategies: Vec<DataMaskStrategy>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ModifyDataMaskStrategyRequest {
    pub strategy: DataMaskStrategy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteDataMaskStrategyRequest {
    pub strategy_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_nests_strategy() {
        let req = CreateDataMaskStrategyRequest {
            strategy: DataMaskStrategy {
                strategy_name: Some("pii-mask".to_string()),
                strategy_type: Some("MASK".to_string()),
                groups: Some(vec![DataMaskStrategyGroup {
                    work_group_id: Some(7),
                    strategy_type: Some("MASK_SHOW_FIRST_4".to_string()),
                }]),
                ..Default::default()
            },
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["Strategy"]["StrategyName"], "pii-mask");
        assert_eq!(json["Strategy"]["Groups"][0]["WorkGroupId"], 7);
        assert!(json["Strategy"].get("StrategyId").is_none());
    }

    #[test]
    fn strategies_decode() {
        let json = serde_json::json!({
            "TotalCount": 1,
            "Strategies": [{
                "StrategyId": "strategy-1",
                "StrategyName": "pii-mask",
                "State": 0
            }]
        });

        let resp: DescribeDataMaskStrategiesResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.strategies[0].strategy_id.as_deref(), Some("strategy-1"));
    }
}
