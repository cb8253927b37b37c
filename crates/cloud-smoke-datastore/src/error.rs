// crates/cloud-smoke-datastore/src/error.rs
// ============================================================================
// Module: Datastore Errors
// Description: Failure classes of the Datastore driver.
// Purpose: Separate transport, service, and data-shape failures.
// Dependencies: thiserror
// ============================================================================

use thiserror::Error;

/// Datastore driver failures.
///
/// # Invariants
/// - `Status` carries the HTTP status returned by the service.
/// - `NotFound` is only produced by lookups that require an entity.
#[derive(Debug, Error)]
pub enum DatastoreError {
    /// Request could not be sent or the response could not be read.
    #[error("datastore request failed: {0}")]
    Http(String),
    /// Service answered with a non-success status.
    #[error("datastore returned status {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Service error message.
        message: String,
    },
    /// Response or stored entity had an unexpected shape.
    #[error("datastore decode failed: {0}")]
    Decode(String),
    /// Object could not be converted into entity properties.
    #[error("datastore encode failed: {0}")]
    Encode(String),
    /// Filter condition or value is not usable.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),
    /// Key is malformed or cannot be used for the operation.
    #[error("invalid key: {0}")]
    InvalidKey(String),
    /// Entity does not exist.
    #[error("entity not found: {0}")]
    NotFound(String),
    /// Driver was closed.
    #[error("datastore driver is closed")]
    Closed,
}

impl DatastoreError {
    /// Returns true when the error means the entity or key does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Status {
                    status: 404,
                    ..
                }
        )
    }
}
