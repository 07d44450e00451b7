//! Physics error types
//!
//! "Not initialized yet" is never an error here; those paths return `Option`.

use std::fmt;

/// Error type for physics operations
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// No vehicle registered under this id
    VehicleNotFound(String),
    /// Triangle mesh could not be turned into a collider
    InvalidTriMesh {
        /// Name the body would have been registered under
        name: String,
        /// Reason reported by the collider builder
        reason: String,
    },
    /// Shape parameters are degenerate or non-finite
    InvalidShape(String),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::VehicleNotFound(id) => write!(f, "Vehicle not found: {}", id),
            PhysicsError::InvalidTriMesh { name, reason } => {
                write!(f, "Invalid triangle mesh for '{}': {}", name, reason)
            }
            PhysicsError::InvalidShape(name) => write!(f, "Invalid shape for '{}'", name),
        }
    }
}

impl std::error::Error for PhysicsError {}
