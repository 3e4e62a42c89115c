//! Roof status, stop reason, and direction enums.
//!
//! All enums use `#[repr(u8)]` for a compact layout and serde derive so
//! snapshots serialize with the variant names the API consumers expect.

use core::fmt;
use serde::{Deserialize, Serialize};

// ─── Roof Status ────────────────────────────────────────────────────

/// Controller status.
///
/// `Open` and `Closed` are the terminal at-limit states; `Opening` and
/// `Closing` are the motion states; `PartiallyOpen` / `PartiallyClose`
/// are resting mid-travel states distinguished by the last commanded
/// direction. `Error` is sticky until an explicit fault clear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum RoofStatus {
    /// Status has never been derived.
    Unknown = 0,
    /// Constructed but `initialize()` has not run yet.
    NotInitialized = 1,
    /// At rest, no limit engaged, never moved since initialization.
    Stopped = 2,
    /// Moving toward the forward (open) limit.
    Opening = 3,
    /// Moving toward the reverse (closed) limit.
    Closing = 4,
    /// Forward limit engaged.
    Open = 5,
    /// Reverse limit engaged.
    Closed = 6,
    /// Stopped mid-travel, last commanded direction was open.
    PartiallyOpen = 7,
    /// Stopped mid-travel, last commanded direction was close.
    PartiallyClose = 8,
    /// Fault latched — requires an explicit fault clear.
    Error = 9,
}

impl RoofStatus {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::NotInitialized),
            2 => Some(Self::Stopped),
            3 => Some(Self::Opening),
            4 => Some(Self::Closing),
            5 => Some(Self::Open),
            6 => Some(Self::Closed),
            7 => Some(Self::PartiallyOpen),
            8 => Some(Self::PartiallyClose),
            9 => Some(Self::Error),
            _ => None,
        }
    }

    /// Returns true while a motion command is in flight.
    #[inline]
    pub const fn is_moving(&self) -> bool {
        matches!(self, Self::Opening | Self::Closing)
    }

    /// Returns true for the terminal at-limit states.
    #[inline]
    pub const fn is_at_limit(&self) -> bool {
        matches!(self, Self::Open | Self::Closed)
    }

    /// Returns true for the non-error resting states.
    ///
    /// `resting` = {Stopped, Open, Closed, PartiallyOpen, PartiallyClose}
    #[inline]
    pub const fn is_resting(&self) -> bool {
        matches!(
            self,
            Self::Stopped | Self::Open | Self::Closed | Self::PartiallyOpen | Self::PartiallyClose
        )
    }
}

impl Default for RoofStatus {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for RoofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unknown => "Unknown",
            Self::NotInitialized => "NotInitialized",
            Self::Stopped => "Stopped",
            Self::Opening => "Opening",
            Self::Closing => "Closing",
            Self::Open => "Open",
            Self::Closed => "Closed",
            Self::PartiallyOpen => "PartiallyOpen",
            Self::PartiallyClose => "PartiallyClose",
            Self::Error => "Error",
        };
        write!(f, "{s}")
    }
}

// ─── Stop Reason ────────────────────────────────────────────────────

/// Why the most recent motion ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StopReason {
    /// No motion has ended yet.
    None = 0,
    /// Ordinary commanded stop.
    NormalStop = 1,
    /// Motion completed at a limit switch.
    LimitReached = 2,
    /// The safety watchdog force-stopped the motion.
    SafetyWatchdogTimeout = 3,
    /// Operator emergency stop.
    EmergencyStop = 4,
    /// Motor fault line asserted or contradictory limit state.
    FaultDetected = 5,
    /// Service disposal stopped an in-flight motion.
    SystemDisposal = 6,
    /// A stop command interrupted the motion.
    CommandIssued = 7,
}

impl StopReason {
    /// Convert from raw `u8`. Returns `None` for invalid values.
    #[inline]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::NormalStop),
            2 => Some(Self::LimitReached),
            3 => Some(Self::SafetyWatchdogTimeout),
            4 => Some(Self::EmergencyStop),
            5 => Some(Self::FaultDetected),
            6 => Some(Self::SystemDisposal),
            7 => Some(Self::CommandIssued),
            _ => None,
        }
    }
}

impl Default for StopReason {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "None",
            Self::NormalStop => "NormalStop",
            Self::LimitReached => "LimitReached",
            Self::SafetyWatchdogTimeout => "SafetyWatchdogTimeout",
            Self::EmergencyStop => "EmergencyStop",
            Self::FaultDetected => "FaultDetected",
            Self::SystemDisposal => "SystemDisposal",
            Self::CommandIssued => "CommandIssued",
        };
        write!(f, "{s}")
    }
}

// ─── Motion Direction ───────────────────────────────────────────────

/// Commanded travel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MotionDirection {
    /// Toward the forward (open) limit.
    Open = 0,
    /// Toward the reverse (closed) limit.
    Close = 1,
}

impl MotionDirection {
    #[inline]
    pub const fn opposite(&self) -> Self {
        match self {
            Self::Open => Self::Close,
            Self::Close => Self::Open,
        }
    }

    /// Status while moving in this direction.
    #[inline]
    pub const fn moving_status(&self) -> RoofStatus {
        match self {
            Self::Open => RoofStatus::Opening,
            Self::Close => RoofStatus::Closing,
        }
    }

    /// Resting status after a mid-travel stop in this direction.
    #[inline]
    pub const fn partial_status(&self) -> RoofStatus {
        match self {
            Self::Open => RoofStatus::PartiallyOpen,
            Self::Close => RoofStatus::PartiallyClose,
        }
    }

    /// Terminal status at this direction's travel limit.
    #[inline]
    pub const fn limit_status(&self) -> RoofStatus {
        match self {
            Self::Open => RoofStatus::Open,
            Self::Close => RoofStatus::Closed,
        }
    }
}
