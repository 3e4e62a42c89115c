//! Indicator LED mask and its status mapping.

use bitflags::bitflags;

use crate::controller::status::RoofStatus;

bitflags! {
    /// Front-panel LED mask, bits 0..3 = LED1..LED4.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LedMask: u8 {
        /// LED1 — roof fully open.
        const OPEN     = 0b0001;
        /// LED2 — roof fully closed.
        const CLOSED   = 0b0010;
        /// LED3 — fault asserted or controller in error.
        const FAULT    = 0b0100;
        /// LED4 — drive at speed.
        const AT_SPEED = 0b1000;
    }
}

impl LedMask {
    /// Recompute the mask for a status publish.
    pub fn for_status(status: RoofStatus, fault_asserted: bool, at_speed: bool) -> Self {
        let mut mask = Self::empty();
        if status == RoofStatus::Open {
            mask |= Self::OPEN;
        }
        if status == RoofStatus::Closed {
            mask |= Self::CLOSED;
        }
        if fault_asserted || status == RoofStatus::Error {
            mask |= Self::FAULT;
        }
        if at_speed {
            mask |= Self::AT_SPEED;
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn led_mapping() {
        assert_eq!(
            LedMask::for_status(RoofStatus::Open, false, false),
            LedMask::OPEN
        );
        assert_eq!(
            LedMask::for_status(RoofStatus::Closed, false, true),
            LedMask::CLOSED | LedMask::AT_SPEED
        );
        assert_eq!(
            LedMask::for_status(RoofStatus::Error, false, false),
            LedMask::FAULT
        );
        // Fault line asserted lights the fault LED even before the
        // controller latches Error.
        assert_eq!(
            LedMask::for_status(RoofStatus::Opening, true, false),
            LedMask::FAULT
        );
        assert_eq!(
            LedMask::for_status(RoofStatus::PartiallyOpen, false, false),
            LedMask::empty()
        );
    }
}
