//! Network connection API shapes

use serde::{Deserialize, Serialize};

use super::Filter;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CreateNetworkConnectionRequest {
    pub network_connection_name: String,
    /// 2 for ENI-based connections, 4 for gateway connections.
    pub network_connection_type: i64,
    pub data_engine_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniq_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_cidr_block: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeNetworkConnectionsRequest {
    pub offset: i64,
    pub limit: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DescribeNetworkConnectionsResponse {
    #[serde(default)]
    pub network_connection_set: Vec<NetworkConnectionInfo>,
    #[serde(default)]
    pub total_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NetworkConnectionInfo {
    pub network_connection_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_connection_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_engine_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniq_vpc_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_time: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UpdateNetworkConnectionRequest {
    pub network_connection_name: String,
    pub network_connection_desc: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteNetworkConnectionRequest {
    pub network_connection_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_serializes() {
        let req = CreateNetworkConnectionRequest {
            network_connection_name: "vpc-link".to_string(),
            network_connection_type: 2,
            data_engine_name: "shared-engine".to_string(),
            network_connection_desc: None,
            uniq_vpc_id: Some("vpc-abc123".to_string()),
            subnet_id: Some("subnet-def456".to_string()),
            subnet_cidr_block: Some("10.0.1.0/24".to_string()),
        };

        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["NetworkConnectionType"], 2);
        assert_eq!(json["UniqVpcId"], "vpc-abc123");
        assert!(json.get("NetworkConnectionDesc").is_none());
    }

    #[test]
    fn connection_list_decodes_empty() {
        let resp: DescribeNetworkConnectionsResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(resp.network_connection_set.is_empty());
        assert_eq!(resp.total_count, 0);
    }
}
