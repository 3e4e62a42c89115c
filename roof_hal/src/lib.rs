//! # Roof HAL
//!
//! Hardware access for the roof controller: the typed relay/input board
//! driver, the Linux `/dev/i2c-*` register bus, and an in-memory
//! simulated bus for development and tests.
//!
//! The board driver works over the [`roof_common::hal::bus::RegisterBus`]
//! capability, so swapping the physical bus for the simulator is a
//! construction-time decision, not a code path.

pub mod board;
#[cfg(target_os = "linux")]
pub mod linux;
pub mod sim;

pub use board::RelayBoard;
#[cfg(target_os = "linux")]
pub use linux::LinuxI2cBus;
pub use sim::SimulatedBus;
