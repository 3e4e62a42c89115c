//! Roof Common Library
//!
//! This crate provides the shared vocabulary for the roof controller
//! workspace: status and stop-reason enums, the digital-input model,
//! configuration loading and validation, the error taxonomy, published
//! snapshots, and the expander-board register map with its bus capability.
//!
//! # Module Structure
//!
//! - [`controller`] - Controller-facing types (status, config, errors, snapshots)
//! - [`hal`] - Expander board register map and the `RegisterBus` capability
//! - [`consts`] - System-wide constants
//! - [`prelude`] - Common re-exports for convenience

pub mod consts;
pub mod controller;
pub mod hal;
pub mod prelude;
