//! Resource type definitions and per-type operation handlers
//!
//! Each submodule owns one resource type: its attribute schema plus the
//! create/read/update/delete handlers driving the corresponding API group.
//! Data sources live in `sources`.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use vela_core::provider::{ResourceSchema, ResourceType};

use crate::client::PAGE_LIMIT;
use crate::error::{DlcError, Result};

pub mod data_engine;
pub mod data_mask_strategy;
pub mod network_connection;
pub mod resource_group;
pub mod session_parameters;
pub mod sources;
pub mod user;
pub mod work_group;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
        }
    };
    ($name:ident, $type_name:expr, $schema:expr, data_source) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
            fn is_data_source(&self) -> bool {
                true
            }
        }
    };
}

define_resource_type!(DataEngineType, "dlc.data_engine", data_engine::schema());
define_resource_type!(WorkGroupType, "dlc.work_group", work_group::schema());
define_resource_type!(UserType, "dlc.user", user::schema());
define_resource_type!(
    ResourceGroupType,
    "dlc.resource_group",
    resource_group::schema()
);
define_resource_type!(
    NetworkConnectionType,
    "dlc.network_connection",
    network_connection::schema()
);
define_resource_type!(
    DataMaskStrategyType,
    "dlc.data_mask_strategy",
    data_mask_strategy::schema()
);
define_resource_type!(
    SessionParametersType,
    "dlc.session_parameters",
    session_parameters::schema()
);

define_resource_type!(
    DataEnginesSource,
    "dlc.data_engines",
    sources::data_engines_schema(),
    data_source
);
define_resource_type!(
    WorkGroupsSource,
    "dlc.work_groups",
    sources::work_groups_schema(),
    data_source
);
define_resource_type!(UsersSource, "dlc.users", sources::users_schema(), data_source);
define_resource_type!(
    ResourceGroupsSource,
    "dlc.resource_groups",
    sources::resource_groups_schema(),
    data_source
);
define_resource_type!(
    NetworkConnectionsSource,
    "dlc.network_connections",
    sources::network_connections_schema(),
    data_source
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(DataEngineType),
        Box::new(WorkGroupType),
        Box::new(UserType),
        Box::new(ResourceGroupType),
        Box::new(NetworkConnectionType),
        Box::new(DataMaskStrategyType),
        Box::new(SessionParametersType),
        Box::new(DataEnginesSource),
        Box::new(WorkGroupsSource),
        Box::new(UsersSource),
        Box::new(ResourceGroupsSource),
        Box::new(NetworkConnectionsSource),
    ]
}

// =============================================================================
// Pagination
// =============================================================================

/// Accumulate offset/limit pages until a short page arrives or the offset
/// reaches the total the service reports
///
/// `fetch` receives the offset for the next page and returns the page's
/// items together with the reported total count.
pub(crate) async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<(Vec<T>, i64)>>,
{
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let (page, total_count) = fetch(offset).await?;

        let count = page.len() as i64;
        items.extend(page);
        offset += count;

        if count < PAGE_LIMIT || offset >= total_count {
            break;
        }
    }

    Ok(items)
}

// =============================================================================
// Polling
// =============================================================================

pub(crate) const WAIT_MAX_ATTEMPTS: u32 = 60;
pub(crate) const WAIT_INTERVAL: Duration = Duration::from_secs(10);

/// Outcome of one polling probe
pub(crate) enum Readiness<T> {
    Ready(T),
    Converging(String),
    Failed(String),
}

/// Poll `probe` until it reports ready, a terminal failure, or the attempt
/// budget runs out
pub(crate) async fn wait_for<T, F, Fut>(what: &str, mut probe: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Readiness<T>>>,
{
    for attempt in 1..=WAIT_MAX_ATTEMPTS {
        match probe().await? {
            Readiness::Ready(value) => return Ok(value),
            Readiness::Converging(state) => {
                debug!(what, attempt, state = %state, "waiting");
                if attempt < WAIT_MAX_ATTEMPTS {
                    tokio::time::sleep(WAIT_INTERVAL).await;
                }
            }
            Readiness::Failed(state) => {
                return Err(DlcError::UnexpectedState {
                    what: what.to_string(),
                    state,
                });
            }
        }
    }

    Err(DlcError::Timeout {
        what: what.to_string(),
        attempts: WAIT_MAX_ATTEMPTS,
    })
}
