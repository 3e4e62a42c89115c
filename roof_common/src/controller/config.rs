//! Controller configuration: record, defaults, validation, TOML loading.
//!
//! Every field carries a `#[serde(default)]` so a partial file
//! deserializes against the documented defaults. Validation produces the
//! full list of failures rather than stopping at the first, so an
//! operator fixing a config file sees everything at once.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::consts::{
    DEBOUNCE_MS_DEFAULT, POLL_INTERVAL_MS_DEFAULT, SAFETY_WATCHDOG_TIMEOUT_DEFAULT,
    VERIFICATION_INTERVAL_DEFAULT,
};
use crate::hal::consts::{RELAY_COUNT, RelayId};

// ─── Error Type ─────────────────────────────────────────────────────

/// Error type for configuration loading.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// Reading the file failed.
    #[error("failed to read configuration {path}: {reason}")]
    ReadError { path: String, reason: String },

    /// TOML parsing failed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("configuration validation failed: {}", .0.join("; "))]
    ValidationError(Vec<String>),
}

// ─── Configuration Record ───────────────────────────────────────────

/// Roof controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoofControllerConfig {
    /// Duration before an in-flight motion is force-stopped into `Error` [s].
    #[serde(default = "default_watchdog_timeout")]
    pub safety_watchdog_timeout_s: f64,

    /// Relay driving the open direction (1..=4).
    #[serde(default = "default_open_relay")]
    pub open_relay_id: RelayId,

    /// Relay driving the close direction (1..=4).
    #[serde(default = "default_close_relay")]
    pub close_relay_id: RelayId,

    /// Relay pulsed to reset the drive's fault latch (1..=4).
    #[serde(default = "default_clear_fault_relay")]
    pub clear_fault_relay_id: RelayId,

    /// Fail-safe stop relay (1..=4): de-energized = STOP asserted.
    #[serde(default = "default_stop_relay")]
    pub stop_relay_id: RelayId,

    /// Enable the periodic digital-input poller. When false, status is
    /// refreshed only on explicit command or hardware read request.
    #[serde(default = "default_true")]
    pub enable_digital_input_polling: bool,

    /// Input poll period [ms].
    #[serde(default = "default_poll_interval")]
    pub digital_input_poll_interval_ms: u64,

    /// Run a coarser verification re-read while the roof is moving.
    /// Requires polling to be enabled.
    #[serde(default = "default_true")]
    pub enable_periodic_verification_while_moving: bool,

    /// Verification period while moving [s].
    #[serde(default = "default_verification_interval")]
    pub periodic_verification_interval_s: f64,

    /// Limit switches are wired normally-closed (raw HIGH = not engaged).
    #[serde(default = "default_true")]
    pub use_normally_closed_limit_switches: bool,

    /// Debounce window for the input poller [ms].
    #[serde(default = "default_debounce")]
    pub limit_switch_debounce_ms: u64,

    /// Development bypass: treat limit inputs as never engaged.
    #[serde(default)]
    pub ignore_physical_limit_switches: bool,

    /// Host process restart backoff [s]. Consumed by the host, surfaced
    /// back through `get_configuration` for operator visibility only.
    #[serde(default)]
    pub restart_on_failure_wait_time_s: Option<f64>,
}

fn default_watchdog_timeout() -> f64 {
    SAFETY_WATCHDOG_TIMEOUT_DEFAULT
}
fn default_open_relay() -> RelayId {
    1
}
fn default_close_relay() -> RelayId {
    2
}
fn default_clear_fault_relay() -> RelayId {
    3
}
fn default_stop_relay() -> RelayId {
    4
}
fn default_poll_interval() -> u64 {
    POLL_INTERVAL_MS_DEFAULT
}
fn default_verification_interval() -> f64 {
    VERIFICATION_INTERVAL_DEFAULT
}
fn default_debounce() -> u64 {
    DEBOUNCE_MS_DEFAULT
}
fn default_true() -> bool {
    true
}

impl Default for RoofControllerConfig {
    fn default() -> Self {
        Self {
            safety_watchdog_timeout_s: default_watchdog_timeout(),
            open_relay_id: default_open_relay(),
            close_relay_id: default_close_relay(),
            clear_fault_relay_id: default_clear_fault_relay(),
            stop_relay_id: default_stop_relay(),
            enable_digital_input_polling: true,
            digital_input_poll_interval_ms: default_poll_interval(),
            enable_periodic_verification_while_moving: true,
            periodic_verification_interval_s: default_verification_interval(),
            use_normally_closed_limit_switches: true,
            limit_switch_debounce_ms: default_debounce(),
            ignore_physical_limit_switches: false,
            restart_on_failure_wait_time_s: None,
        }
    }
}

impl RoofControllerConfig {
    /// Validate all parameters. Returns the full list of failures.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut failures = Vec::new();

        if !(self.safety_watchdog_timeout_s > 0.0) {
            failures.push(format!(
                "safety_watchdog_timeout_s must be > 0, got {}",
                self.safety_watchdog_timeout_s
            ));
        }
        if self.digital_input_poll_interval_ms == 0 {
            failures.push("digital_input_poll_interval_ms must be > 0".to_string());
        }
        if !(self.periodic_verification_interval_s > 0.0) {
            failures.push(format!(
                "periodic_verification_interval_s must be > 0, got {}",
                self.periodic_verification_interval_s
            ));
        } else if self.periodic_verification_interval_s > self.safety_watchdog_timeout_s {
            failures.push(format!(
                "periodic_verification_interval_s {} must not exceed safety_watchdog_timeout_s {}",
                self.periodic_verification_interval_s, self.safety_watchdog_timeout_s
            ));
        }
        if self.enable_periodic_verification_while_moving && !self.enable_digital_input_polling {
            failures.push(
                "enable_periodic_verification_while_moving requires enable_digital_input_polling"
                    .to_string(),
            );
        }

        let relays = self.relay_assignment();
        for (name, id) in relays {
            if id < 1 || id > RELAY_COUNT {
                failures.push(format!("{name} {id} out of range [1, {RELAY_COUNT}]"));
            }
        }
        for i in 0..relays.len() {
            for j in (i + 1)..relays.len() {
                if relays[i].1 == relays[j].1 {
                    failures.push(format!(
                        "relay identifiers must be unique: {} and {} are both {}",
                        relays[i].0, relays[j].0, relays[i].1
                    ));
                }
            }
        }

        if let Some(wait) = self.restart_on_failure_wait_time_s {
            if wait < 0.0 {
                failures.push(format!(
                    "restart_on_failure_wait_time_s must be >= 0, got {wait}"
                ));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// The four relay assignments with their option names.
    pub fn relay_assignment(&self) -> [(&'static str, RelayId); 4] {
        [
            ("open_relay_id", self.open_relay_id),
            ("close_relay_id", self.close_relay_id),
            ("clear_fault_relay_id", self.clear_fault_relay_id),
            ("stop_relay_id", self.stop_relay_id),
        ]
    }

    /// True when the two configs assign any relay differently.
    pub fn relay_assignment_differs(&self, other: &Self) -> bool {
        self.open_relay_id != other.open_relay_id
            || self.close_relay_id != other.close_relay_id
            || self.clear_fault_relay_id != other.clear_fault_relay_id
            || self.stop_relay_id != other.stop_relay_id
    }

    /// Safety watchdog timeout as a `Duration`.
    #[inline]
    pub fn watchdog_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.safety_watchdog_timeout_s.max(0.0))
    }

    /// Input poll interval as a `Duration`.
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.digital_input_poll_interval_ms)
    }

    /// Periodic verification interval as a `Duration`.
    #[inline]
    pub fn verification_interval(&self) -> Duration {
        Duration::from_secs_f64(self.periodic_verification_interval_s.max(0.0))
    }

    /// Debounce window as a `Duration`.
    #[inline]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.limit_switch_debounce_ms)
    }

    /// Load and validate a configuration from a TOML file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let config: Self =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate().map_err(ConfigError::ValidationError)?;
        info!(path = %path.display(), "roof controller configuration loaded");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(RoofControllerConfig::default().validate().is_ok());
    }

    #[test]
    fn duplicate_relay_ids_rejected() {
        let config = RoofControllerConfig {
            open_relay_id: 1,
            close_relay_id: 1,
            ..Default::default()
        };
        let failures = config.validate().unwrap_err();
        assert!(
            failures.iter().any(|f| f.contains("unique")),
            "expected a uniqueness failure, got {failures:?}"
        );
    }

    #[test]
    fn relay_id_out_of_range_rejected() {
        let config = RoofControllerConfig {
            stop_relay_id: 5,
            ..Default::default()
        };
        let failures = config.validate().unwrap_err();
        assert!(failures.iter().any(|f| f.contains("stop_relay_id")));

        let config = RoofControllerConfig {
            open_relay_id: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn watchdog_timeout_must_be_positive() {
        let config = RoofControllerConfig {
            safety_watchdog_timeout_s: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn verification_bounded_by_watchdog() {
        let config = RoofControllerConfig {
            safety_watchdog_timeout_s: 5.0,
            periodic_verification_interval_s: 6.0,
            ..Default::default()
        };
        let failures = config.validate().unwrap_err();
        assert!(failures.iter().any(|f| f.contains("must not exceed")));
    }

    #[test]
    fn verification_requires_polling() {
        let config = RoofControllerConfig {
            enable_digital_input_polling: false,
            enable_periodic_verification_while_moving: true,
            ..Default::default()
        };
        let failures = config.validate().unwrap_err();
        assert!(failures.iter().any(|f| f.contains("requires")));
    }

    #[test]
    fn all_failures_reported_at_once() {
        let config = RoofControllerConfig {
            safety_watchdog_timeout_s: -1.0,
            digital_input_poll_interval_ms: 0,
            open_relay_id: 9,
            ..Default::default()
        };
        let failures = config.validate().unwrap_err();
        assert!(failures.len() >= 3, "got {failures:?}");
    }

    #[test]
    fn duration_accessors() {
        let config = RoofControllerConfig {
            safety_watchdog_timeout_s: 1.5,
            digital_input_poll_interval_ms: 20,
            limit_switch_debounce_ms: 40,
            ..Default::default()
        };
        assert_eq!(config.watchdog_timeout(), Duration::from_millis(1500));
        assert_eq!(config.poll_interval(), Duration::from_millis(20));
        assert_eq!(config.debounce(), Duration::from_millis(40));
    }

    #[test]
    fn relay_assignment_differs() {
        let a = RoofControllerConfig::default();
        let mut b = a.clone();
        assert!(!a.relay_assignment_differs(&b));
        b.stop_relay_id = 3;
        b.clear_fault_relay_id = 4;
        assert!(a.relay_assignment_differs(&b));
    }
}
