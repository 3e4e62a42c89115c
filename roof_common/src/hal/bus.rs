//! `RegisterBus` capability and bus error type.
//!
//! Concrete bus access is abstracted behind this trait so the board
//! driver works identically over the Linux I²C device and the in-memory
//! register file used by tests and `--simulate` runs. Implementations
//! serialize their transactions internally; callers may issue compound
//! operations (set-bit then read-back) without extra locking.

use thiserror::Error;

/// Error type for bus transactions.
///
/// Transient in principle — callers may retry. The controller converts a
/// streak of failures during motion into a safety stop.
#[derive(Debug, Clone, Error)]
pub enum BusError {
    /// Opening the bus device failed.
    #[error("failed to open I2C bus {path}: {reason}")]
    Open { path: String, reason: String },

    /// Selecting the slave address failed.
    #[error("failed to select I2C address 0x{address:02x}: {reason}")]
    AddressSelect { address: u16, reason: String },

    /// Register read failed at the OS layer.
    #[error("read of register 0x{register:02x} failed: {reason}")]
    Read { register: u8, reason: String },

    /// Register write failed at the OS layer.
    #[error("write of register 0x{register:02x} failed: {reason}")]
    Write { register: u8, reason: String },

    /// The device has no such register.
    #[error("unsupported register 0x{register:02x}")]
    UnsupportedRegister { register: u8 },
}

/// Byte-level access to the expander's 8-bit registers.
pub trait RegisterBus: Send + Sync {
    /// Read one register.
    fn read_register(&self, register: u8) -> Result<u8, BusError>;

    /// Write one register. Fire-and-forget beyond the bus ACK.
    fn write_register(&self, register: u8, value: u8) -> Result<(), BusError>;

    /// Human-readable transport description for logs.
    fn describe(&self) -> String;

    /// True when backed by a physical bus handle rather than a register
    /// file in memory. Surfaced as the hardware-mode flag.
    fn is_physical(&self) -> bool;
}
