//! # Roof Controller Service
//!
//! Drives an observatory roof's variable-frequency motor drive through a
//! four-relay / four-input I²C expander: motion state machine, fail-safe
//! relay sequencing, debounced input polling, safety watchdog, periodic
//! motion verification, fault-clear pulsing, and a push-based status
//! publisher.
//!
//! ## Concurrency model
//!
//! One coarse `parking_lot::Mutex` guards all mutable controller state;
//! the board driver serializes bus transactions behind its own finer
//! lock. The poller, watchdog, and verifier run as plain threads that
//! take the state lock when they fire. Timed waits go through a single
//! condvar paired with the state mutex, so disarming a timer (bumping
//! the motion epoch and notifying) can never lose a wakeup.

pub mod controller;
pub mod debounce;
pub(crate) mod poller;
pub mod publisher;

pub use controller::RoofController;
