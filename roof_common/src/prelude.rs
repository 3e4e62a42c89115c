//! Prelude module for common re-exports.
//!
//! `use roof_common::prelude::*;` pulls in the types nearly every
//! consumer needs without listing individual paths.

// ─── Status ─────────────────────────────────────────────────────────
pub use crate::controller::status::{MotionDirection, RoofStatus, StopReason};

// ─── Inputs ─────────────────────────────────────────────────────────
pub use crate::controller::inputs::{ChannelEdge, DigitalInputSnapshot, InputChannel};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::controller::config::{ConfigError, RoofControllerConfig};

// ─── Errors & Results ───────────────────────────────────────────────
pub use crate::controller::error::{ControllerError, ControllerResult};

// ─── Snapshots ──────────────────────────────────────────────────────
pub use crate::controller::snapshot::{HealthSnapshot, StatusSnapshot};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::bus::{BusError, RegisterBus};
pub use crate::hal::consts::RelayId;
pub use crate::hal::led::LedMask;
