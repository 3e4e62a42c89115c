//! Controller error taxonomy.
//!
//! Callers see a `Result`-shaped return: either a snapshot/configuration
//! or one of these kinds with an explanatory message. The HTTP
//! collaborator maps `Validation` to 400 with the field-scoped list and
//! the rest to 500.

use thiserror::Error;

use crate::hal::bus::BusError;

/// Error type for controller operations.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// Configuration rejected; carries the full list of reasons.
    #[error("configuration rejected: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// Operation not permitted in the current state.
    #[error("operation not permitted: {0}")]
    ServiceState(String),

    /// An I²C transaction failed at the OS layer.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Operation attempted after shutdown.
    #[error("controller already disposed")]
    AlreadyDisposed,

    /// Cooperative cancellation observed.
    #[error("operation cancelled")]
    Cancelled,

    /// An operation-level timeout fired.
    #[error("timed out: {0}")]
    Timeout(String),
}

/// Result alias for controller operations.
pub type ControllerResult<T> = Result<T, ControllerError>;
