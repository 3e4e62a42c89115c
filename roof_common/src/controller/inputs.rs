//! Digital input model: channels, raw→logical translation, edges.
//!
//! The expander exposes four inputs on register bits 0..3. The poller and
//! driver deal in *raw* electrical levels; polarity translation to logical
//! limit/fault/at-speed signals happens here, driven by the wiring option
//! in the configuration.

use serde::{Deserialize, Serialize};

use crate::controller::status::MotionDirection;
use crate::hal::consts::INPUT_COUNT;

// ─── Input Channels ─────────────────────────────────────────────────

/// Semantic identity of an input bit. The bit index equals the variant
/// discriminant: IN1=bit0 .. IN4=bit3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum InputChannel {
    /// IN1 — forward (open) travel limit switch.
    ForwardLimit = 0,
    /// IN2 — reverse (closed) travel limit switch.
    ReverseLimit = 1,
    /// IN3 — motor drive fault line, active HIGH.
    Fault = 2,
    /// IN4 — drive at-speed indication, active HIGH.
    AtSpeed = 3,
}

impl InputChannel {
    /// Convert from a bit index (0..4). Returns `None` otherwise.
    #[inline]
    pub const fn from_bit(bit: u8) -> Option<Self> {
        match bit {
            0 => Some(Self::ForwardLimit),
            1 => Some(Self::ReverseLimit),
            2 => Some(Self::Fault),
            3 => Some(Self::AtSpeed),
            _ => None,
        }
    }

    /// Mask with only this channel's bit set.
    #[inline]
    pub const fn mask(&self) -> u8 {
        1 << (*self as u8)
    }

    /// All channels in bit order.
    pub const ALL: [Self; INPUT_COUNT as usize] = [
        Self::ForwardLimit,
        Self::ReverseLimit,
        Self::Fault,
        Self::AtSpeed,
    ];
}

/// A debounced transition on one input channel, in raw polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEdge {
    /// Which input settled.
    pub channel: InputChannel,
    /// The new settled raw electrical level.
    pub settled_high: bool,
}

// ─── Logical Snapshot ───────────────────────────────────────────────

/// Logical view of the four inputs after polarity translation.
///
/// For normally-closed limit wiring, raw HIGH means the circuit is intact
/// and the limit is NOT engaged, so the logical limit inverts the raw
/// level. Normally-open wiring reads straight through. The fault and
/// at-speed lines are active-HIGH regardless of limit wiring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalInputSnapshot {
    /// Forward (open) limit engaged.
    pub forward_limit: bool,
    /// Reverse (closed) limit engaged.
    pub reverse_limit: bool,
    /// Motor drive fault asserted.
    pub fault: bool,
    /// Drive at commanded speed.
    pub at_speed: bool,
}

impl DigitalInputSnapshot {
    /// Translate a raw input register value to logical signals.
    pub fn from_raw(raw: u8, normally_closed_limits: bool) -> Self {
        let bit = |ch: InputChannel| raw & ch.mask() != 0;
        let limit = |ch: InputChannel| {
            if normally_closed_limits {
                !bit(ch)
            } else {
                bit(ch)
            }
        };
        Self {
            forward_limit: limit(InputChannel::ForwardLimit),
            reverse_limit: limit(InputChannel::ReverseLimit),
            fault: bit(InputChannel::Fault),
            at_speed: bit(InputChannel::AtSpeed),
        }
    }

    /// Both travel limits engaged at once — a wiring or switch fault.
    #[inline]
    pub const fn both_limits(&self) -> bool {
        self.forward_limit && self.reverse_limit
    }

    /// Either travel limit engaged.
    #[inline]
    pub const fn any_limit(&self) -> bool {
        self.forward_limit || self.reverse_limit
    }

    /// Development bypass view: limits reported as never engaged.
    /// The fault line is still honored.
    #[inline]
    pub const fn ignoring_limits(self) -> Self {
        Self {
            forward_limit: false,
            reverse_limit: false,
            ..self
        }
    }

    /// The limit signal for a travel direction.
    #[inline]
    pub const fn limit_for(&self, direction: MotionDirection) -> bool {
        match direction {
            MotionDirection::Open => self.forward_limit,
            MotionDirection::Close => self.reverse_limit,
        }
    }
}
