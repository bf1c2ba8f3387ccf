//! Vela State Management
//!
//! This crate provides state management for the Vela infrastructure tool.
//! Managed DLC resources and their service-side identifiers persist in a
//! versioned state file, guarded by a lock for safe concurrent access.
//!
//! The state management system consists of:
//!
//! - **StateFile**: The main state structure containing all managed resources
//! - **StateBackend**: A trait for state storage backends
//! - **LockInfo**: Information about state locks for concurrent access control

pub mod backend;
pub mod backends;
pub mod lock;
pub mod state;

// Re-export main types for convenience
pub use backend::{BackendConfig, BackendError, BackendResult, StateBackend};
pub use backends::create_backend;
pub use lock::LockInfo;
pub use state::{ResourceState, StateFile};
