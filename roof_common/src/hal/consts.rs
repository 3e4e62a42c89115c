//! Bit-exact register map of the four-relay / four-input I²C expander.

use static_assertions::const_assert;

/// Factory-default 7-bit device address.
pub const DEFAULT_I2C_ADDRESS: u16 = 0x0E;

/// Default Linux bus device path.
pub const DEFAULT_I2C_BUS_PATH: &str = "/dev/i2c-1";

/// Relay mask register: bits 0..3 = relays 1..4, 1 = energized.
pub const REG_RELAY_MASK: u8 = 0x00;
/// Relay set register: write the relay number (1..4) to set that bit.
pub const REG_RELAY_SET: u8 = 0x01;
/// Relay clear register: write the relay number (1..4) to clear that bit.
pub const REG_RELAY_CLEAR: u8 = 0x02;
/// Digital input mask register: bits 0..3 = IN1..IN4, raw HIGH = 1.
pub const REG_INPUT_MASK: u8 = 0x03;
/// LED mask register: bits 0..3 = LED1..LED4.
pub const REG_LED_MASK: u8 = 0x05;

/// Number of relays on the board.
pub const RELAY_COUNT: u8 = 4;
/// Number of digital inputs on the board.
pub const INPUT_COUNT: u8 = 4;

/// Relay identifier — 1-based (1..=4), maps to mask bit `id - 1`.
pub type RelayId = u8;

/// Mask bit for a relay id. Caller guarantees `id` is in `1..=4`.
#[inline]
pub const fn relay_bit(id: RelayId) -> u8 {
    1 << (id - 1)
}

/// Low nibble mask covering all four relays / inputs / LEDs.
pub const NIBBLE_MASK: u8 = 0x0F;

const_assert!(RELAY_COUNT == INPUT_COUNT);
const_assert!(relay_bit(RELAY_COUNT) & !NIBBLE_MASK == 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_bits() {
        assert_eq!(relay_bit(1), 0b0001);
        assert_eq!(relay_bit(2), 0b0010);
        assert_eq!(relay_bit(3), 0b0100);
        assert_eq!(relay_bit(4), 0b1000);
    }
}
