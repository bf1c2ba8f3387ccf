//! Vela Tencent Cloud DLC Provider
//!
//! Manages Data Lake Compute engines, access control, resource groups,
//! network connections, and data masking policies through the DLC API.
//!
//! ## Module Structure
//!
//! - `client` - TC3-signed HTTP transport with bounded retry
//! - `api` - Wire-format request and response types
//! - `convert` - Attribute map to wire format bridging
//! - `resources` - Resource type definitions and CRUD handlers
//! - `provider` - DlcProvider implementation

pub mod api;
pub mod client;
pub mod convert;
pub mod error;
pub mod provider;
pub mod resources;

// Re-export main types
pub use client::{Credentials, DlcClient};
pub use error::DlcError;
pub use provider::DlcProvider;

use vela_core::provider::{BoxFuture, Provider, ProviderResult};
use vela_core::resource::{Resource, ResourceId, State};

use resources::resource_types;

impl Provider for DlcProvider {
    fn name(&self) -> &'static str {
        "dlc"
    }

    fn resource_types(&self) -> Vec<Box<dyn vela_core::provider::ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move { self.read_resource(&id, identifier.as_deref()).await })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.read_source(&resource).await })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move { self.create_resource(&resource).await })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move { self.update_resource(&id, &identifier, &from, &to).await })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move { self.delete_resource(&id, &identifier).await })
    }
}
