//! Controller-facing shared types.
//!
//! Everything the roof controller service and its consumers need to agree
//! on: the status enums, the digital-input model, configuration,
//! the error taxonomy, and the published snapshots.

pub mod config;
pub mod error;
pub mod inputs;
pub mod snapshot;
pub mod status;
