//! DLC Provider implementation
//!
//! Dispatches the generic resource operations onto the per-type handlers.
//! Every handler performs the same mechanical steps: attributes to a typed
//! request, retried API call, response flattened back into state
//! attributes.

use std::collections::HashMap;

use vela_core::provider::{ProviderError, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State, Value};

use crate::client::DlcClient;
use crate::convert::require_str;
use crate::error::{DlcError, Result};
use crate::resources::{
    data_engine, data_mask_strategy, network_connection, resource_group, session_parameters,
    sources, user, work_group,
};

/// Tencent Cloud DLC provider
pub struct DlcProvider {
    client: DlcClient,
}

impl DlcProvider {
    pub fn new(client: DlcClient) -> Self {
        Self { client }
    }

    /// Create a provider from the standard environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(DlcClient::from_env()?))
    }

    pub fn region(&self) -> &str {
        self.client.region()
    }

    /// Read a managed resource through its service-side identifier
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let Some(identifier) = identifier else {
            return Ok(State::not_found(id.clone()));
        };

        let result = match id.resource_type.as_str() {
            "dlc.data_engine" => data_engine::read(&self.client, identifier).await,
            "dlc.work_group" => work_group::read(&self.client, identifier).await,
            "dlc.user" => user::read(&self.client, identifier).await,
            "dlc.resource_group" => resource_group::read(&self.client, identifier).await,
            "dlc.network_connection" => network_connection::read(&self.client, identifier).await,
            "dlc.data_mask_strategy" => data_mask_strategy::read(&self.client, identifier).await,
            "dlc.session_parameters" => session_parameters::read(&self.client, identifier).await,
            other => return Err(unknown_type(other, id)),
        };

        match result {
            Ok(Some(attributes)) => {
                Ok(State::existing(id.clone(), attributes).with_identifier(identifier))
            }
            Ok(None) => Ok(State::not_found(id.clone())),
            Err(e) if e.is_not_found() => Ok(State::not_found(id.clone())),
            Err(e) => Err(provider_error(e, id)),
        }
    }

    /// Execute a data-source query
    pub async fn read_source(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let result = match resource.id.resource_type.as_str() {
            "dlc.data_engines" => sources::read_data_engines(&self.client, attrs).await,
            "dlc.work_groups" => sources::read_work_groups(&self.client, attrs).await,
            "dlc.users" => sources::read_users(&self.client, attrs).await,
            "dlc.resource_groups" => sources::read_resource_groups(&self.client, attrs).await,
            "dlc.network_connections" => {
                sources::read_network_connections(&self.client, attrs).await
            }
            other => return Err(unknown_type(other, &resource.id)),
        };

        result
            .map(|attributes| State::existing(resource.id.clone(), attributes))
            .map_err(|e| provider_error(e, &resource.id))
    }

    /// Create a resource and return its initial state
    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let result = match resource.id.resource_type.as_str() {
            "dlc.data_engine" => data_engine::create(&self.client, attrs).await,
            "dlc.work_group" => work_group::create(&self.client, attrs).await,
            "dlc.user" => user::create(&self.client, attrs).await,
            "dlc.resource_group" => resource_group::create(&self.client, attrs).await,
            "dlc.network_connection" => network_connection::create(&self.client, attrs).await,
            "dlc.data_mask_strategy" => data_mask_strategy::create(&self.client, attrs).await,
            "dlc.session_parameters" => session_parameters::create(&self.client, attrs).await,
            other => return Err(unknown_type(other, &resource.id)),
        };

        result
            .map(|(identifier, attributes)| {
                State::existing(resource.id.clone(), attributes).with_identifier(identifier)
            })
            .map_err(|e| provider_error(e, &resource.id))
    }

    /// Update a resource in place
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let result = match id.resource_type.as_str() {
            "dlc.data_engine" => {
                let name = engine_name(&to.attributes).map_err(|e| provider_error(e, id))?;
                data_engine::update(&self.client, name, &to.attributes).await
            }
            "dlc.work_group" => {
                work_group::update(&self.client, identifier, &from.attributes, &to.attributes)
                    .await
            }
            "dlc.user" => {
                user::update(&self.client, identifier, &from.attributes, &to.attributes).await
            }
            "dlc.resource_group" => {
                resource_group::update(&self.client, identifier, &to.attributes).await
            }
            "dlc.network_connection" => {
                network_connection::update(&self.client, identifier, &to.attributes).await
            }
            "dlc.data_mask_strategy" => {
                data_mask_strategy::update(&self.client, identifier, &to.attributes).await
            }
            "dlc.session_parameters" => {
                session_parameters::update(&self.client, identifier, &to.attributes).await
            }
            other => return Err(unknown_type(other, id)),
        };

        result
            .map(|attributes| {
                State::existing(id.clone(), attributes).with_identifier(identifier)
            })
            .map_err(|e| provider_error(e, id))
    }

    /// Delete a resource; a resource that is already gone is not an error
    pub async fn delete_resource(&self, id: &ResourceId, identifier: &str) -> ProviderResult<()> {
        let result = match id.resource_type.as_str() {
            "dlc.data_engine" => data_engine::delete(&self.client, identifier).await,
            "dlc.work_group" => work_group::delete(&self.client, identifier).await,
            "dlc.user" => user::delete(&self.client, identifier).await,
            "dlc.resource_group" => resource_group::delete(&self.client, identifier).await,
            "dlc.network_connection" => network_connection::delete(&self.client, identifier).await,
            "dlc.data_mask_strategy" => data_mask_strategy::delete(&self.client, identifier).await,
            "dlc.session_parameters" => session_parameters::delete(&self.client, identifier).await,
            other => return Err(unknown_type(other, id)),
        };

        match result {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(provider_error(e, id)),
        }
    }
}

fn engine_name(attrs: &HashMap<String, Value>) -> Result<&str> {
    require_str(attrs, "data_engine_name")
}

fn unknown_type(resource_type: &str, id: &ResourceId) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", resource_type))
        .for_resource(id.clone())
}

fn provider_error(e: DlcError, id: &ResourceId) -> ProviderError {
    ProviderError::new(e.to_string())
        .for_resource(id.clone())
        .with_cause(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Credentials;

    fn provider() -> DlcProvider {
        let credentials = Credentials {
            secret_id: "AKIDtest".to_string(),
            secret_key: "secret".to_string(),
            token: None,
        };
        DlcProvider::new(DlcClient::new(credentials, "ap-guangzhou"))
    }

    #[tokio::test]
    async fn read_without_identifier_is_not_found() {
        let p = provider();
        let id = ResourceId::new("dlc.data_engine", "main");
        let state = p.read_resource(&id, None).await.unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn unknown_resource_type_is_an_error() {
        let p = provider();
        let id = ResourceId::new("dlc.unknown", "x");
        let err = p.read_resource(&id, Some("id")).await.unwrap_err();
        assert!(err.to_string().contains("Unknown resource type"));
    }

    #[test]
    fn provider_error_keeps_api_detail() {
        let id = ResourceId::new("dlc.user", "alice");
        let err = provider_error(
            DlcError::Api {
                code: "InvalidParameter".to_string(),
                message: "bad".to_string(),
                request_id: "req-1".to_string(),
            },
            &id,
        );
        let text = err.to_string();
        assert!(text.contains("dlc.user.alice"));
        assert!(text.contains("InvalidParameter"));
    }
}
