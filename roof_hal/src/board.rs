//! Typed relay/input board driver.
//!
//! Maps semantic operations to register reads/writes and encapsulates
//! the expander's register map. Relay changes go through the device's
//! set/clear registers so two concurrent requesters cannot lose an
//! update to a read-modify-write race.

use std::sync::Arc;

use tracing::debug;

use roof_common::hal::bus::{BusError, RegisterBus};
use roof_common::hal::consts::{
    NIBBLE_MASK, REG_INPUT_MASK, REG_LED_MASK, REG_RELAY_CLEAR, REG_RELAY_MASK, REG_RELAY_SET,
    RelayId,
};
use roof_common::hal::led::LedMask;

/// Relay/input board driver over a shared register bus.
#[derive(Clone)]
pub struct RelayBoard {
    bus: Arc<dyn RegisterBus>,
}

impl RelayBoard {
    pub fn new(bus: Arc<dyn RegisterBus>) -> Self {
        Self { bus }
    }

    /// Transport description for logs.
    pub fn describe(&self) -> String {
        self.bus.describe()
    }

    /// True when backed by physical hardware.
    pub fn is_physical(&self) -> bool {
        self.bus.is_physical()
    }

    /// Write the full 4-bit relay register.
    pub fn set_relay_mask(&self, mask: u8) -> Result<(), BusError> {
        debug!("relay mask write 0b{:04b}", mask & NIBBLE_MASK);
        self.bus.write_register(REG_RELAY_MASK, mask & NIBBLE_MASK)
    }

    /// Energize one relay via the device's set register.
    pub fn energize_relay(&self, relay: RelayId) -> Result<(), BusError> {
        debug!(relay, "energize");
        self.bus.write_register(REG_RELAY_SET, relay)
    }

    /// De-energize one relay via the device's clear register.
    pub fn de_energize_relay(&self, relay: RelayId) -> Result<(), BusError> {
        debug!(relay, "de-energize");
        self.bus.write_register(REG_RELAY_CLEAR, relay)
    }

    /// Read the raw 4-bit input register.
    pub fn read_input_mask(&self) -> Result<u8, BusError> {
        Ok(self.bus.read_register(REG_INPUT_MASK)? & NIBBLE_MASK)
    }

    /// Read back the relay register for verification.
    pub fn read_relay_mask(&self) -> Result<u8, BusError> {
        Ok(self.bus.read_register(REG_RELAY_MASK)? & NIBBLE_MASK)
    }

    /// Drive the four indicator LEDs.
    pub fn set_led_mask(&self, mask: LedMask) -> Result<(), BusError> {
        self.bus.write_register(REG_LED_MASK, mask.bits())
    }

    /// Leave the board safe: all relays de-energized, LEDs cleared.
    ///
    /// Both writes are attempted even if the first fails; the first
    /// error is returned.
    pub fn all_off(&self) -> Result<(), BusError> {
        let relays = self.set_relay_mask(0);
        let leds = self.set_led_mask(LedMask::empty());
        relays.and(leds)
    }
}
