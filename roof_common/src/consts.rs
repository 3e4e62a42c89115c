//! System-wide constants.

/// Consecutive bus failures during motion that force a safety stop.
pub const MAX_CONSECUTIVE_BUS_ERRORS: u32 = 3;

/// Default fault-clear pulse width [ms], used by callers that do not
/// specify one.
pub const DEFAULT_CLEAR_FAULT_PULSE_MS: u64 = 250;

/// Re-check period of the input poller while polling is disabled [ms].
///
/// The poller thread stays alive and wakes at this coarse cadence (or on
/// a configuration notification) so that re-enabling polling never spawns
/// a new thread.
pub const POLLER_IDLE_RECHECK_MS: u64 = 250;

// ── Configuration defaults ──────────────────────────────────────────

/// Default safety watchdog timeout [s].
pub const SAFETY_WATCHDOG_TIMEOUT_DEFAULT: f64 = 60.0;
/// Default digital input poll interval [ms].
pub const POLL_INTERVAL_MS_DEFAULT: u64 = 25;
/// Default periodic verification interval while moving [s].
pub const VERIFICATION_INTERVAL_DEFAULT: f64 = 5.0;
/// Default limit switch debounce window [ms].
pub const DEBOUNCE_MS_DEFAULT: u64 = 50;
