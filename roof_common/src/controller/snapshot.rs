//! Published snapshots: operator status and host health.
//!
//! Both serialize in camelCase — the HTTP collaborator republishes them
//! verbatim to the UI feed and the health probe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::{RoofStatus, StopReason};

/// Copy-on-change status published to subscribers and returned by every
/// command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    /// Current controller status.
    pub status: RoofStatus,
    /// True while a motion command is in flight.
    pub is_moving: bool,
    /// Why the most recent motion ended.
    pub last_stop_reason: StopReason,
    /// Timestamp of the most recent status transition.
    pub last_transition_utc: DateTime<Utc>,
    /// True while the safety watchdog is armed.
    pub is_watchdog_active: bool,
    /// Time until the watchdog fires, floored at zero [s].
    pub watchdog_seconds_remaining: f64,
    /// Drive at commanded speed.
    pub is_at_speed: bool,
    /// Backed by a physical bus handle rather than the simulator.
    pub is_using_physical_hardware: bool,
    /// Development bypass active: limits treated as never engaged.
    pub is_ignoring_physical_limit_switches: bool,
}

/// Health snapshot consumed by the host's probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub is_initialized: bool,
    pub is_service_disposed: bool,
    pub status: RoofStatus,
    pub is_moving: bool,
    pub last_stop_reason: StopReason,
    pub last_transition_utc: DateTime<Utc>,
    pub is_watchdog_active: bool,
    pub watchdog_seconds_remaining: f64,
    /// `initialized && !disposed && status != Error`.
    pub ready: bool,
    pub ignores_physical_limit_switches: bool,
    pub hardware_mode: bool,
}
