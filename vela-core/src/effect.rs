//! Effect - Side effects represented as values
//!
//! An Effect describes one operation against the cloud service without
//! performing it. Plans are lists of Effects; the Interpreter executes them.

use crate::resource::{Resource, ResourceId, State};

/// A single operation to perform against the provider
#[derive(Debug, Clone)]
pub enum Effect {
    /// Read a data source (carries the filter attributes)
    Read(Resource),
    /// Create a resource
    Create(Resource),
    /// Update a resource from its current state to the desired one
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete a resource
    Delete(ResourceId),
}

impl Effect {
    /// Returns whether executing this Effect mutates remote state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    /// The identity of the resource this Effect touches
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } => id,
            Effect::Delete(id) => id,
        }
    }
}
