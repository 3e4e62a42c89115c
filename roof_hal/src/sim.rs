//! In-memory register file with device-faithful semantics.
//!
//! Preserves the expander's set/clear-bit registers so the board driver
//! behaves identically over the simulator and real hardware. Extras for
//! tests: a journal of every register write (to assert relay sequencing
//! order) and failure injection for bus-error paths.

use parking_lot::Mutex;

use roof_common::controller::inputs::InputChannel;
use roof_common::hal::bus::{BusError, RegisterBus};
use roof_common::hal::consts::{
    NIBBLE_MASK, REG_INPUT_MASK, REG_LED_MASK, REG_RELAY_CLEAR, REG_RELAY_MASK, REG_RELAY_SET,
    RELAY_COUNT,
};

#[derive(Debug, Default)]
struct SimState {
    relay_mask: u8,
    input_mask: u8,
    led_mask: u8,
    writes: Vec<(u8, u8)>,
    fail_reads: u32,
    fail_writes: u32,
    fail_writes_skip: u32,
}

/// Simulated expander board.
///
/// The default input state models normally-closed limit wiring with the
/// roof mid-travel: IN1 and IN2 HIGH (circuits intact), fault and
/// at-speed LOW.
pub struct SimulatedBus {
    state: Mutex<SimState>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::with_input_mask(
            InputChannel::ForwardLimit.mask() | InputChannel::ReverseLimit.mask(),
        )
    }

    /// Start with a specific raw input register value.
    pub fn with_input_mask(raw: u8) -> Self {
        Self {
            state: Mutex::new(SimState {
                input_mask: raw & NIBBLE_MASK,
                ..Default::default()
            }),
        }
    }

    /// Drive one input line to a raw electrical level.
    pub fn set_input(&self, channel: InputChannel, high: bool) {
        let mut state = self.state.lock();
        if high {
            state.input_mask |= channel.mask();
        } else {
            state.input_mask &= !channel.mask();
        }
    }

    /// Replace the whole raw input register.
    pub fn set_input_mask(&self, raw: u8) {
        self.state.lock().input_mask = raw & NIBBLE_MASK;
    }

    pub fn relay_mask(&self) -> u8 {
        self.state.lock().relay_mask
    }

    pub fn led_mask(&self) -> u8 {
        self.state.lock().led_mask
    }

    pub fn input_mask(&self) -> u8 {
        self.state.lock().input_mask
    }

    /// Journal of `(register, value)` writes since the last drain.
    pub fn take_writes(&self) -> Vec<(u8, u8)> {
        std::mem::take(&mut self.state.lock().writes)
    }

    /// Fail the next `n` register reads.
    pub fn fail_next_reads(&self, n: u32) {
        self.state.lock().fail_reads = n;
    }

    /// Fail the next `n` register writes.
    pub fn fail_next_writes(&self, n: u32) {
        self.fail_next_writes_after(0, n);
    }

    /// Let `skip` writes through, then fail the following `n`.
    pub fn fail_next_writes_after(&self, skip: u32, n: u32) {
        let mut state = self.state.lock();
        state.fail_writes_skip = skip;
        state.fail_writes = n;
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterBus for SimulatedBus {
    fn read_register(&self, register: u8) -> Result<u8, BusError> {
        let mut state = self.state.lock();
        if state.fail_reads > 0 {
            state.fail_reads -= 1;
            return Err(BusError::Read {
                register,
                reason: "injected failure".into(),
            });
        }
        match register {
            REG_RELAY_MASK => Ok(state.relay_mask),
            REG_INPUT_MASK => Ok(state.input_mask),
            REG_LED_MASK => Ok(state.led_mask),
            _ => Err(BusError::UnsupportedRegister { register }),
        }
    }

    fn write_register(&self, register: u8, value: u8) -> Result<(), BusError> {
        let mut state = self.state.lock();
        if state.fail_writes_skip > 0 {
            state.fail_writes_skip -= 1;
        } else if state.fail_writes > 0 {
            state.fail_writes -= 1;
            return Err(BusError::Write {
                register,
                reason: "injected failure".into(),
            });
        }
        match register {
            REG_RELAY_MASK => state.relay_mask = value & NIBBLE_MASK,
            REG_RELAY_SET if (1..=RELAY_COUNT).contains(&value) => {
                state.relay_mask |= 1 << (value - 1);
            }
            REG_RELAY_CLEAR if (1..=RELAY_COUNT).contains(&value) => {
                state.relay_mask &= !(1 << (value - 1));
            }
            REG_RELAY_SET | REG_RELAY_CLEAR => {
                return Err(BusError::Write {
                    register,
                    reason: format!("relay number {value} out of range"),
                });
            }
            REG_LED_MASK => state.led_mask = value & NIBBLE_MASK,
            _ => return Err(BusError::UnsupportedRegister { register }),
        }
        state.writes.push((register, value));
        Ok(())
    }

    fn describe(&self) -> String {
        "simulated expander".to_string()
    }

    fn is_physical(&self) -> bool {
        false
    }
}
