//! `dlc.data_engine` - a Spark or Presto compute cluster
//!
//! Engine creation and the suspend/resume transitions are asynchronous on
//! the service side, so every mutation here ends with a poll on the engine
//! state code until it settles.

use std::collections::HashMap;

use tracing::info;

use vela_core::resource::Value;
use vela_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types, validate_cron};

use crate::api::data_engine::{
    CreateDataEngineRequest, CreateDataEngineResponse, DataEngineInfo, DeleteDataEngineRequest,
    DescribeDataEnginesRequest, DescribeDataEnginesResponse, EmptyResponse, EngineState,
    SuspendResumeDataEngineRequest, UpdateDataEngineRequest,
};
use crate::api::Filter;
use crate::client::{DlcClient, PAGE_LIMIT};
use crate::convert::{
    attributes_from_response, kv_pairs_from_map, map_from_kv_pairs, opt_str,
    request_from_attributes,
};
use crate::error::Result;
use crate::resources::{Readiness, collect_pages, wait_for};

pub fn schema() -> ResourceSchema {
    ResourceSchema::new("dlc.data_engine")
        .with_description("DLC compute engine (Spark or Presto cluster)")
        .attribute(AttributeSchema::new("data_engine_name", AttributeType::String).required())
        .attribute(
            AttributeSchema::new(
                "engine_type",
                AttributeType::Enum(vec!["spark".to_string(), "presto".to_string()]),
            )
            .required(),
        )
        .attribute(
            AttributeSchema::new(
                "cluster_type",
                AttributeType::Enum(vec!["spark_cu".to_string(), "presto_cu".to_string()]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("mode", types::positive_int()))
        .attribute(AttributeSchema::new("size", types::positive_int()))
        .attribute(AttributeSchema::new("pay_mode", types::non_negative_int()))
        .attribute(AttributeSchema::new("min_clusters", types::positive_int()))
        .attribute(AttributeSchema::new("max_clusters", types::positive_int()))
        .attribute(AttributeSchema::new("auto_resume", AttributeType::Bool))
        .attribute(AttributeSchema::new("auto_suspend", AttributeType::Bool))
        .attribute(AttributeSchema::new("auto_suspend_time", types::positive_int()))
        .attribute(AttributeSchema::new("cidr_block", types::cidr()))
        .attribute(AttributeSchema::new("message", AttributeType::String))
        .attribute(AttributeSchema::new("time_span", types::positive_int()))
        .attribute(AttributeSchema::new("time_unit", AttributeType::String))
        .attribute(AttributeSchema::new(
            "crontab_resume_suspend",
            types::non_negative_int(),
        ))
        .attribute(AttributeSchema::new(
            "crontab_resume_suspend_strategy",
            crontab_strategy_type(),
        ))
        .attribute(AttributeSchema::new("engine_exec_type", AttributeType::String))
        .attribute(AttributeSchema::new("max_concurrency", types::positive_int()))
        .attribute(AttributeSchema::new(
            "tolerable_queue_time",
            types::non_negative_int(),
        ))
        .attribute(AttributeSchema::new(
            "image_version_name",
            AttributeType::String,
        ))
        .attribute(AttributeSchema::new("elastic_switch", AttributeType::Bool))
        .attribute(AttributeSchema::new("elastic_limit", types::positive_int()))
        .attribute(AttributeSchema::new(
            "session_resource_template",
            types::scalar_map(),
        ))
        .attribute(AttributeSchema::new(
            "data_engine_config_pairs",
            AttributeType::Map(Box::new(AttributeType::String)),
        ))
        .attribute(
            AttributeSchema::new(
                "desired_state",
                AttributeType::Enum(vec!["running".to_string(), "suspended".to_string()]),
            )
            .with_default(Value::String("running".to_string())),
        )
        .attribute(AttributeSchema::new("data_engine_id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("state", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("create_time", AttributeType::Int).computed())
        .attribute(AttributeSchema::new("update_time", AttributeType::Int).computed())
}

/// Scheduled suspend/resume strategy: a scalar map whose resume_time and
/// suspend_time entries must be cron expressions
fn crontab_strategy_type() -> AttributeType {
    AttributeType::Custom {
        name: "CrontabResumeSuspendStrategy".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: validate_crontab_strategy,
    }
}

fn validate_crontab_strategy(value: &Value) -> std::result::Result<(), String> {
    let Value::Map(map) = value else {
        return Err("Expected map".to_string());
    };

    for (key, v) in map {
        match (key.as_str(), v) {
            ("resume_time" | "suspend_time", Value::String(expr)) => validate_cron(expr)?,
            ("resume_time" | "suspend_time", _) => {
                return Err(format!("Value for '{}' must be a cron string", key));
            }
            (_, Value::String(_) | Value::Int(_) | Value::Bool(_)) => {}
            _ => return Err(format!("Value for key '{}' must be a scalar", key)),
        }
    }

    Ok(())
}

/// Look up one engine by exact name
///
/// Returns None when the service reports no match, either as an empty page
/// or as a ResourceNotFound error.
pub async fn find(client: &DlcClient, name: &str) -> Result<Option<DataEngineInfo>> {
    let request = DescribeDataEnginesRequest {
        offset: 0,
        limit: PAGE_LIMIT,
        filters: Some(vec![Filter::new("data-engine-name", name)]),
        ..Default::default()
    };

    let response: DescribeDataEnginesResponse =
        match client.call("DescribeDataEngines", &request).await {
            Ok(r) => r,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

    Ok(response
        .data_engines
        .into_iter()
        .find(|e| e.data_engine_name == name))
}

/// List every engine, following offset/limit pages to the end
pub async fn list(client: &DlcClient, filters: Option<Vec<Filter>>) -> Result<Vec<DataEngineInfo>> {
    let filters = &filters;
    collect_pages(|offset| async move {
        let request = DescribeDataEnginesRequest {
            offset,
            limit: PAGE_LIMIT,
            filters: filters.clone(),
            ..Default::default()
        };
        let page: DescribeDataEnginesResponse =
            client.call("DescribeDataEngines", &request).await?;
        Ok((page.data_engines, page.total_count))
    })
    .await
}

/// Flatten an engine description into state attributes
pub fn state_attributes(info: &DataEngineInfo) -> Result<HashMap<String, Value>> {
    let mut attrs = attributes_from_response(info)?;
    if let Some(pairs) = &info.data_engine_config_pairs {
        attrs.insert(
            "data_engine_config_pairs".to_string(),
            map_from_kv_pairs(pairs),
        );
    }
    let desired = match EngineState::from_code(info.state) {
        Some(EngineState::Suspended) => "suspended",
        _ => "running",
    };
    attrs.insert(
        "desired_state".to_string(),
        Value::String(desired.to_string()),
    );
    Ok(attrs)
}

pub async fn create(
    client: &DlcClient,
    attrs: &HashMap<String, Value>,
) -> Result<(String, HashMap<String, Value>)> {
    // Config pairs are a map in manifests but a {Key, Value} list on the wire.
    let mut plain = attrs.clone();
    plain.remove("data_engine_config_pairs");
    let mut request: CreateDataEngineRequest = request_from_attributes(&plain)?;
    request.data_engine_config_pairs = kv_pairs_from_map(attrs, "data_engine_config_pairs");
    let name = request.data_engine_name.clone();

    let _response: CreateDataEngineResponse = client.call("CreateDataEngine", &request).await?;

    let info = wait_until_settled(client, &name, "engine creation").await?;
    info!(engine = %name, "data engine created");

    if opt_str(attrs, "desired_state") == Some("suspended") {
        suspend_resume(client, &name, "suspend").await?;
        let info = wait_until_settled(client, &name, "engine suspend").await?;
        let attrs = state_attributes(&info)?;
        return Ok((name, attrs));
    }

    let attrs = state_attributes(&info)?;
    Ok((name, attrs))
}

pub async fn read(client: &DlcClient, name: &str) -> Result<Option<HashMap<String, Value>>> {
    match find(client, name).await? {
        Some(info) => Ok(Some(state_attributes(&info)?)),
        None => Ok(None),
    }
}

pub async fn update(
    client: &DlcClient,
    name: &str,
    attrs: &HashMap<String, Value>,
) -> Result<HashMap<String, Value>> {
    let request: UpdateDataEngineRequest = request_from_attributes(attrs)?;
    let _: EmptyResponse = client.call("UpdateDataEngine", &request).await?;
    let mut info = wait_until_settled(client, name, "engine update").await?;

    // Reconcile the running/suspended target after the sizing update.
    if let Some(desired) = opt_str(attrs, "desired_state") {
        let current = EngineState::from_code(info.state);
        let operate = match (desired, current) {
            ("suspended", Some(EngineState::Running)) => Some("suspend"),
            ("running", Some(EngineState::Suspended)) => Some("resume"),
            _ => None,
        };
        if let Some(operate) = operate {
            suspend_resume(client, name, operate).await?;
            info = wait_until_settled(client, name, "engine state transition").await?;
        }
    }

    info!(engine = %name, "data engine updated");
    state_attributes(&info)
}

pub async fn delete(client: &DlcClient, name: &str) -> Result<()> {
    let request = DeleteDataEngineRequest {
        data_engine_names: vec![name.to_string()],
    };
    match client.call::<_, EmptyResponse>("DeleteDataEngine", &request).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    }

    wait_for("engine deletion", || async move {
        match find(client, name).await? {
            None => Ok(Readiness::Ready(())),
            Some(info) => match EngineState::from_code(info.state) {
                Some(EngineState::Deleted) => Ok(Readiness::Ready(())),
                Some(s) if s.is_transitional() || s == EngineState::ToBeDeleted => {
                    Ok(Readiness::Converging(format!("{:?}", s)))
                }
                Some(s) => Ok(Readiness::Failed(format!("{:?}", s))),
                None => Ok(Readiness::Converging(format!("code {}", info.state))),
            },
        }
    })
    .await?;

    info!(engine = %name, "data engine deleted");
    Ok(())
}

async fn suspend_resume(client: &DlcClient, name: &str, operate: &str) -> Result<()> {
    let request = SuspendResumeDataEngineRequest {
        data_engine_name: name.to_string(),
        operate: operate.to_string(),
    };
    let _: EmptyResponse = client.call("SuspendResumeDataEngine", &request).await?;
    Ok(())
}

/// Poll until the engine leaves its transitional states
async fn wait_until_settled(
    client: &DlcClient,
    name: &str,
    what: &str,
) -> Result<DataEngineInfo> {
    wait_for(what, || async move {
        match find(client, name).await? {
            None => Ok(Readiness::Converging("not visible yet".to_string())),
            Some(info) => match EngineState::from_code(info.state) {
                Some(EngineState::Running) | Some(EngineState::Suspended) => {
                    Ok(Readiness::Ready(info))
                }
                Some(s) if s.is_transitional() => Ok(Readiness::Converging(format!("{:?}", s))),
                Some(s) => Ok(Readiness::Failed(format!("{:?}", s))),
                None => Ok(Readiness::Converging(format!("code {}", info.state))),
            },
        }
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_validates_complete_manifest() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("analytics".to_string()),
        );
        attrs.insert("engine_type".to_string(), Value::String("spark".to_string()));
        attrs.insert(
            "cluster_type".to_string(),
            Value::String("spark_cu".to_string()),
        );
        attrs.insert("size".to_string(), Value::Int(16));
        attrs.insert("auto_resume".to_string(), Value::Bool(true));
        attrs.insert(
            "cidr_block".to_string(),
            Value::String("10.0.0.0/16".to_string()),
        );

        assert!(schema().validate(&attrs).is_ok());
    }

    #[test]
    fn crontab_strategy_requires_cron_times() {
        let mut strategy = HashMap::new();
        strategy.insert(
            "resume_time".to_string(),
            Value::String("0 8 ? * 1,2,3,4,5".to_string()),
        );
        strategy.insert(
            "suspend_time".to_string(),
            Value::String("0 20 ? * 1,2,3,4,5".to_string()),
        );
        strategy.insert("suspend_strategy".to_string(), Value::Int(0));
        assert!(validate_crontab_strategy(&Value::Map(strategy)).is_ok());

        let mut bad = HashMap::new();
        bad.insert(
            "resume_time".to_string(),
            Value::String("whenever".to_string()),
        );
        assert!(validate_crontab_strategy(&Value::Map(bad)).is_err());
    }

    #[test]
    fn schema_rejects_bad_crontab_strategy() {
        let mut strategy = HashMap::new();
        strategy.insert(
            "suspend_time".to_string(),
            Value::String("0 8 ? * 1;5".to_string()),
        );

        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("analytics".to_string()),
        );
        attrs.insert("engine_type".to_string(), Value::String("spark".to_string()));
        attrs.insert(
            "cluster_type".to_string(),
            Value::String("spark_cu".to_string()),
        );
        attrs.insert(
            "crontab_resume_suspend_strategy".to_string(),
            Value::Map(strategy),
        );

        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn schema_rejects_bad_engine_type() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("analytics".to_string()),
        );
        attrs.insert("engine_type".to_string(), Value::String("flink".to_string()));
        attrs.insert(
            "cluster_type".to_string(),
            Value::String("spark_cu".to_string()),
        );

        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn schema_rejects_setting_computed_state() {
        let mut attrs = HashMap::new();
        attrs.insert(
            "data_engine_name".to_string(),
            Value::String("analytics".to_string()),
        );
        attrs.insert("engine_type".to_string(), Value::String("spark".to_string()));
        attrs.insert(
            "cluster_type".to_string(),
            Value::String("spark_cu".to_string()),
        );
        attrs.insert("state".to_string(), Value::Int(2));

        assert!(schema().validate(&attrs).is_err());
    }

    #[test]
    fn state_attributes_carry_desired_state() {
        let info = DataEngineInfo {
            data_engine_name: "analytics".to_string(),
            data_engine_id: Some("engine-abc".to_string()),
            engine_type: Some("spark".to_string()),
            cluster_type: Some("spark_cu".to_string()),
            state: 1,
            mode: None,
            size: Some(16),
            min_clusters: None,
            max_clusters: None,
            auto_resume: None,
            auto_suspend: None,
            auto_suspend_time: None,
            cidr_block: None,
            message: None,
            engine_exec_type: None,
            max_concurrency: None,
            tolerable_queue_time: None,
            crontab_resume_suspend: None,
            crontab_resume_suspend_strategy: None,
            image_version_name: None,
            elastic_switch: None,
            elastic_limit: None,
            session_resource_template: None,
            data_engine_config_pairs: None,
            create_time: Some(1_700_000_000),
            update_time: None,
        };

        let attrs = state_attributes(&info).unwrap();
        assert_eq!(
            attrs.get("desired_state"),
            Some(&Value::String("suspended".to_string()))
        );
        assert_eq!(attrs.get("state"), Some(&Value::Int(1)));
        assert_eq!(
            attrs.get("data_engine_id"),
            Some(&Value::String("engine-abc".to_string()))
        );
    }
}
