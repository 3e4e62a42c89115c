//! Roof motion controller: state machine, relay sequencing, safety
//! watchdog, periodic verification, fault-clear pulsing, configuration
//! lifecycle, and disposal.
//!
//! A transition is: take the state lock → compute the decision from
//! `(status, inputs, command)` → emit relay actions under the lock →
//! arm/disarm timers under the lock → release → publish. Single register
//! exchanges are short enough to run under the lock; the fault-clear
//! pulse releases it across the wait (the condvar wait drops the guard).

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use roof_common::consts::MAX_CONSECUTIVE_BUS_ERRORS;
use roof_common::controller::config::RoofControllerConfig;
use roof_common::controller::error::{ControllerError, ControllerResult};
use roof_common::controller::inputs::{ChannelEdge, DigitalInputSnapshot, InputChannel};
use roof_common::controller::snapshot::{HealthSnapshot, StatusSnapshot};
use roof_common::controller::status::{MotionDirection, RoofStatus, StopReason};
use roof_common::hal::bus::BusError;
use roof_common::hal::consts::RelayId;
use roof_common::hal::led::LedMask;
use roof_hal::RelayBoard;

use crate::debounce::InputDebouncer;
use crate::poller;
use crate::publisher::{StatusPublisher, SubscriptionId};

// ─── Internal State ─────────────────────────────────────────────────

/// Armed safety watchdog.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WatchdogArm {
    pub(crate) armed_at: Instant,
    pub(crate) timeout: Duration,
    pub(crate) epoch: u64,
}

pub(crate) struct ControllerState {
    pub(crate) config: RoofControllerConfig,
    pub(crate) status: RoofStatus,
    pub(crate) last_stop_reason: StopReason,
    pub(crate) last_transition_utc: DateTime<Utc>,
    pub(crate) last_direction: Option<MotionDirection>,
    /// Last settled raw input register.
    pub(crate) raw_inputs: u8,
    /// Logical view of `raw_inputs` (polarity applied, bypass not applied).
    pub(crate) inputs: DigitalInputSnapshot,
    pub(crate) initialized: bool,
    /// Bumped on every motion start and stop; cancels watchdog/verifier.
    pub(crate) motion_epoch: u64,
    pub(crate) watchdog: Option<WatchdogArm>,
    pub(crate) bus_error_streak: u32,
    pub(crate) pulse_active: bool,
    pub(crate) poller_thread: Option<JoinHandle<()>>,
}

pub(crate) struct ControllerCore {
    pub(crate) board: RelayBoard,
    pub(crate) state: Mutex<ControllerState>,
    /// Paired with `state`; every timed wait goes through it so that
    /// disarming a timer can never lose a wakeup.
    pub(crate) cv: Condvar,
    pub(crate) debouncer: Mutex<InputDebouncer>,
    pub(crate) publisher: StatusPublisher,
    pub(crate) disposed: AtomicBool,
}

// ─── Public Handle ──────────────────────────────────────────────────

/// The roof controller service.
///
/// One owned instance created at startup and handed to the transport
/// layer; dropping it without [`RoofController::dispose`] still leaves
/// the board safe.
pub struct RoofController {
    core: Arc<ControllerCore>,
}

impl RoofController {
    /// Validate the configuration and construct the controller.
    ///
    /// No hardware is touched until [`RoofController::initialize`].
    pub fn new(board: RelayBoard, config: RoofControllerConfig) -> ControllerResult<Self> {
        config.validate().map_err(ControllerError::Validation)?;
        let core = Arc::new(ControllerCore {
            board,
            state: Mutex::new(ControllerState {
                config,
                status: RoofStatus::NotInitialized,
                last_stop_reason: StopReason::None,
                last_transition_utc: Utc::now(),
                last_direction: None,
                raw_inputs: 0,
                inputs: DigitalInputSnapshot::default(),
                initialized: false,
                motion_epoch: 0,
                watchdog: None,
                bus_error_streak: 0,
                pulse_active: false,
                poller_thread: None,
            }),
            cv: Condvar::new(),
            debouncer: Mutex::new(InputDebouncer::new()),
            publisher: StatusPublisher::new(),
            disposed: AtomicBool::new(false),
        });
        Ok(Self { core })
    }

    /// Read the inputs, derive the initial status, start the poller.
    ///
    /// Idempotent: a second call returns the current snapshot.
    pub fn initialize(&self) -> ControllerResult<StatusSnapshot> {
        self.core.ensure_live()?;
        let (snap, fault) = {
            let mut st = self.core.state.lock();
            if st.initialized {
                return Ok(self.core.snapshot_locked(&st));
            }
            // Known-safe baseline before anything else.
            self.core.board.set_relay_mask(0)?;
            let raw = self.core.board.read_input_mask()?;
            self.core.set_raw_locked(&mut st, raw);

            let eff = self.core.effective_inputs(&st);
            let (status, reason) = initial_status(eff);
            self.core.transition_locked(&mut st, status, reason);
            st.initialized = true;
            st.poller_thread = Some(poller::spawn(Arc::clone(&self.core)));
            info!(
                transport = %self.core.board.describe(),
                status = %st.status,
                "roof controller initialized; raw inputs 0b{raw:04b}"
            );
            (self.core.snapshot_locked(&st), st.inputs.fault)
        };
        self.core.publish(&snap, fault);
        Ok(snap)
    }

    /// Command the roof open.
    pub fn open(&self) -> ControllerResult<StatusSnapshot> {
        self.start_motion(MotionDirection::Open)
    }

    /// Command the roof closed.
    pub fn close(&self) -> ControllerResult<StatusSnapshot> {
        self.start_motion(MotionDirection::Close)
    }

    /// Stop any in-flight motion and settle into a resting status.
    pub fn stop(&self, reason: StopReason) -> ControllerResult<StatusSnapshot> {
        self.core.ensure_live()?;
        let (snap, fault) = {
            let mut st = self.core.state.lock();
            self.core.ensure_initialized(&st)?;
            if st.status == RoofStatus::Error {
                return Err(ControllerError::ServiceState(
                    "controller is in Error; clear the fault first".into(),
                ));
            }
            // Settle against fresh limits when the bus cooperates.
            if let Ok(raw) = self.core.board.read_input_mask() {
                st.bus_error_streak = 0;
                self.core.set_raw_locked(&mut st, raw);
            }
            self.core.stop_locked(&mut st, reason);
            (self.core.snapshot_locked(&st), st.inputs.fault)
        };
        self.core.publish(&snap, fault);
        Ok(snap)
    }

    /// Pulse the clear-fault relay, then refresh the status.
    ///
    /// The only path that can take the controller out of `Error`.
    pub fn clear_fault(&self, pulse: Duration) -> ControllerResult<bool> {
        self.core.ensure_live()?;
        let (snap, fault) = {
            let mut st = self.core.state.lock();
            self.core.ensure_initialized(&st)?;
            if st.status.is_moving() {
                return Err(ControllerError::ServiceState(
                    "cannot clear fault while the roof is moving".into(),
                ));
            }
            if st.pulse_active {
                return Err(ControllerError::ServiceState(
                    "a fault-clear pulse is already in progress".into(),
                ));
            }
            let clear_relay = st.config.clear_fault_relay_id;
            self.core.board.energize_relay(clear_relay)?;
            st.pulse_active = true;
            info!(pulse_ms = pulse.as_millis() as u64, "fault-clear pulse started");

            // The wait releases the state lock; other operations and the
            // poller keep running. Only disposal cuts the pulse short.
            let deadline = Instant::now() + pulse;
            let mut cancelled = false;
            loop {
                if self.core.disposed.load(Ordering::SeqCst) {
                    cancelled = true;
                    break;
                }
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                self.core.cv.wait_for(&mut st, deadline - now);
            }

            st.pulse_active = false;
            let released = self.core.board.de_energize_relay(clear_relay);
            if cancelled {
                if let Err(e) = released {
                    error!(error = %e, "failed to release clear-fault relay on cancellation");
                }
                return Err(ControllerError::Cancelled);
            }
            released?;
            info!("fault-clear pulse completed");

            let raw = self.core.board.read_input_mask()?;
            self.core.set_raw_locked(&mut st, raw);
            self.core.rederive_idle_locked(&mut st, true);
            (self.core.snapshot_locked(&st), st.inputs.fault)
        };
        self.core.publish(&snap, fault);
        Ok(true)
    }

    /// Re-read the inputs and re-derive the status.
    ///
    /// Hardware is read on every call; `force_hardware_read` is accepted
    /// for interface compatibility.
    pub fn refresh_status(&self, force_hardware_read: bool) -> ControllerResult<StatusSnapshot> {
        self.core.ensure_live()?;
        let (snap, fault) = {
            let mut st = self.core.state.lock();
            self.core.ensure_initialized(&st)?;
            debug!(force_hardware_read, "explicit status refresh");
            let raw = self.core.board.read_input_mask()?;
            st.bus_error_streak = 0;
            let prev = self.core.effective_inputs(&st);
            self.core.set_raw_locked(&mut st, raw);
            if st.status.is_moving() {
                self.core.evaluate_motion_inputs_locked(&mut st, prev);
            } else {
                self.core.rederive_idle_locked(&mut st, false);
            }
            (self.core.snapshot_locked(&st), st.inputs.fault)
        };
        self.core.publish(&snap, fault);
        Ok(snap)
    }

    /// Current status snapshot.
    pub fn get_status(&self) -> ControllerResult<StatusSnapshot> {
        self.core.ensure_live()?;
        let st = self.core.state.lock();
        Ok(self.core.snapshot_locked(&st))
    }

    /// Current effective configuration.
    pub fn get_configuration(&self) -> ControllerResult<RoofControllerConfig> {
        self.core.ensure_live()?;
        Ok(self.core.state.lock().config.clone())
    }

    /// Validate and atomically apply a new configuration.
    ///
    /// Rejected while the roof is moving. Relay reassignment additionally
    /// requires a non-`Error` state so a latched fault is cleared under
    /// the mapping that was active when it occurred.
    pub fn update_configuration(
        &self,
        config: RoofControllerConfig,
    ) -> ControllerResult<RoofControllerConfig> {
        self.core.ensure_live()?;
        config.validate().map_err(ControllerError::Validation)?;
        let publish = {
            let mut st = self.core.state.lock();
            if st.status.is_moving() {
                return Err(ControllerError::ServiceState(
                    "cannot update configuration while the roof is moving".into(),
                ));
            }
            if st.status == RoofStatus::Error && config.relay_assignment_differs(&st.config) {
                return Err(ControllerError::ServiceState(
                    "relay reassignment requires the fault to be cleared first".into(),
                ));
            }
            let polarity_changed = config.use_normally_closed_limit_switches
                != st.config.use_normally_closed_limit_switches;
            st.config = config;
            if polarity_changed {
                st.inputs = DigitalInputSnapshot::from_raw(
                    st.raw_inputs,
                    st.config.use_normally_closed_limit_switches,
                );
            }
            // Wake the poller so the new interval/enable takes effect.
            self.core.cv.notify_all();
            info!("configuration updated");
            st.initialized
                .then(|| (self.core.snapshot_locked(&st), st.inputs.fault))
        };
        if let Some((snap, fault)) = publish {
            self.core.publish(&snap, fault);
        }
        self.get_configuration()
    }

    /// Health snapshot for the host's probe. Works even after disposal.
    pub fn health(&self) -> HealthSnapshot {
        let st = self.core.state.lock();
        let disposed = self.core.disposed.load(Ordering::SeqCst);
        let snap = self.core.snapshot_locked(&st);
        HealthSnapshot {
            is_initialized: st.initialized,
            is_service_disposed: disposed,
            status: snap.status,
            is_moving: snap.is_moving,
            last_stop_reason: snap.last_stop_reason,
            last_transition_utc: snap.last_transition_utc,
            is_watchdog_active: snap.is_watchdog_active,
            watchdog_seconds_remaining: snap.watchdog_seconds_remaining,
            ready: st.initialized && !disposed && st.status != RoofStatus::Error,
            ignores_physical_limit_switches: snap.is_ignoring_physical_limit_switches,
            hardware_mode: snap.is_using_physical_hardware,
        }
    }

    /// Register a status-change callback.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusSnapshot) + Send + Sync + 'static,
    {
        self.core.publisher.subscribe(callback)
    }

    /// Remove a status-change callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.core.publisher.unsubscribe(id)
    }

    /// Last published snapshot, if any.
    pub fn latest_published(&self) -> Option<StatusSnapshot> {
        self.core.publisher.latest()
    }

    /// Cancel background tasks, stop any motion, and leave the board
    /// safe (all relays de-energized, LEDs cleared).
    ///
    /// Idempotent; subsequent operations fail with `AlreadyDisposed`.
    pub fn dispose(&self) -> ControllerResult<()> {
        if self.core.disposed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("disposing roof controller");
        let (poller_thread, publish) = {
            let mut st = self.core.state.lock();
            if st.status.is_moving() {
                self.core.stop_locked(&mut st, StopReason::SystemDisposal);
            } else {
                st.watchdog = None;
                st.motion_epoch += 1;
            }
            self.core.cv.notify_all();
            (
                st.poller_thread.take(),
                st.initialized.then(|| self.core.snapshot_locked(&st)),
            )
        };
        if let Some(handle) = poller_thread {
            let _ = handle.join();
        }
        let all_off = self.core.board.all_off();
        if let Some(snap) = publish {
            // LEDs were just cleared; notify subscribers directly.
            self.core.publisher.publish(&snap);
        }
        if let Err(e) = all_off {
            error!(error = %e, "failed to leave board safe on disposal");
            return Err(e.into());
        }
        info!("roof controller disposed");
        Ok(())
    }

    // ─── Motion start ───────────────────────────────────────────────

    fn start_motion(&self, direction: MotionDirection) -> ControllerResult<StatusSnapshot> {
        self.core.ensure_live()?;
        let (result, publish) = {
            let mut st = self.core.state.lock();
            self.core.ensure_initialized(&st)?;

            match st.status {
                RoofStatus::Error => {
                    return Err(ControllerError::ServiceState(
                        "controller is in Error; clear the fault first".into(),
                    ));
                }
                s if s == direction.moving_status() => {
                    // Duplicate command: success, no relay writes re-issued.
                    debug!(?direction, "duplicate motion command ignored");
                    return Ok(self.core.snapshot_locked(&st));
                }
                s if s.is_moving() => {
                    return Err(ControllerError::ServiceState(format!(
                        "roof is {s}; stop before reversing direction"
                    )));
                }
                _ => {}
            }

            // Decide against fresh inputs, not the last settled sample.
            let raw = self.core.board.read_input_mask()?;
            st.bus_error_streak = 0;
            self.core.set_raw_locked(&mut st, raw);
            let eff = self.core.effective_inputs(&st);

            if eff.fault {
                self.core
                    .transition_locked(&mut st, RoofStatus::Error, StopReason::FaultDetected);
                let snap = self.core.snapshot_locked(&st);
                (
                    Err(ControllerError::ServiceState(
                        "motor fault asserted; clear the fault first".into(),
                    )),
                    Some((snap, st.inputs.fault)),
                )
            } else if eff.both_limits() {
                self.core
                    .transition_locked(&mut st, RoofStatus::Error, StopReason::FaultDetected);
                let snap = self.core.snapshot_locked(&st);
                (
                    Err(ControllerError::ServiceState(
                        "both limit switches engaged; check wiring".into(),
                    )),
                    Some((snap, st.inputs.fault)),
                )
            } else if eff.limit_for(direction) {
                // Already at the destination limit.
                self.core.transition_locked(
                    &mut st,
                    direction.limit_status(),
                    StopReason::LimitReached,
                );
                let snap = self.core.snapshot_locked(&st);
                (
                    Err(ControllerError::ServiceState(format!(
                        "roof is already {}",
                        direction.limit_status()
                    ))),
                    Some((snap, st.inputs.fault)),
                )
            } else {
                match self
                    .core
                    .energize_sequence_locked(&mut st, direction, &self.core)
                {
                    Ok(()) => {
                        let snap = self.core.snapshot_locked(&st);
                        (Ok(snap.clone()), Some((snap, st.inputs.fault)))
                    }
                    Err(e) => (Err(e), None),
                }
            }
        };
        if let Some((snap, fault)) = publish {
            self.core.publish(&snap, fault);
        }
        result
    }
}

impl Drop for RoofController {
    fn drop(&mut self) {
        if !self.core.disposed.load(Ordering::SeqCst) {
            if let Err(e) = self.dispose() {
                warn!(error = %e, "disposal on drop failed");
            }
        }
    }
}

// ─── Core Internals ─────────────────────────────────────────────────

impl ControllerCore {
    pub(crate) fn ensure_live(&self) -> ControllerResult<()> {
        if self.disposed.load(Ordering::SeqCst) {
            Err(ControllerError::AlreadyDisposed)
        } else {
            Ok(())
        }
    }

    fn ensure_initialized(&self, st: &ControllerState) -> ControllerResult<()> {
        if st.initialized {
            Ok(())
        } else {
            Err(ControllerError::ServiceState(
                "controller not initialized".into(),
            ))
        }
    }

    /// Logical inputs with the development bypass applied.
    pub(crate) fn effective_inputs(&self, st: &ControllerState) -> DigitalInputSnapshot {
        if st.config.ignore_physical_limit_switches {
            st.inputs.ignoring_limits()
        } else {
            st.inputs
        }
    }

    /// Install an authoritative raw reading and re-seed the debouncer so
    /// the poller does not double-report it.
    pub(crate) fn set_raw_locked(&self, st: &mut ControllerState, raw: u8) {
        st.raw_inputs = raw;
        st.inputs =
            DigitalInputSnapshot::from_raw(raw, st.config.use_normally_closed_limit_switches);
        self.debouncer.lock().seed(raw);
    }

    fn transition_locked(&self, st: &mut ControllerState, status: RoofStatus, reason: StopReason) {
        if st.status != status {
            info!(from = %st.status, to = %status, %reason, "status transition");
            st.last_transition_utc = Utc::now();
        }
        st.status = status;
        st.last_stop_reason = reason;
    }

    fn direction_relay(config: &RoofControllerConfig, direction: MotionDirection) -> RelayId {
        match direction {
            MotionDirection::Open => config.open_relay_id,
            MotionDirection::Close => config.close_relay_id,
        }
    }

    /// Ordered motion-start sequence. Any failure rolls energized relays
    /// back to the safe all-off state and leaves the status unchanged.
    /// `core` is the owning `Arc` of `self`, used to hand the watchdog
    /// and verifier threads their reference.
    fn energize_sequence_locked(
        &self,
        st: &mut ControllerState,
        direction: MotionDirection,
        core: &Arc<ControllerCore>,
    ) -> ControllerResult<()> {
        let drive_relay = Self::direction_relay(&st.config, direction);
        let opposing_relay = Self::direction_relay(&st.config, direction.opposite());
        let stop_relay = st.config.stop_relay_id;

        // 1. The opposing direction must be out of the circuit first.
        self.board.de_energize_relay(opposing_relay)?;

        // 2. Select the direction while STOP is still asserted.
        if let Err(e) = self.board.energize_relay(drive_relay) {
            let _ = self.board.de_energize_relay(drive_relay);
            return Err(e.into());
        }

        // 3. Release the fail-safe stop relay; motion begins.
        if let Err(e) = self.board.energize_relay(stop_relay) {
            let _ = self.board.de_energize_relay(drive_relay);
            let _ = self.board.de_energize_relay(stop_relay);
            return Err(e.into());
        }

        // 4. Commit: status, timestamps, watchdog, verifier.
        st.last_direction = Some(direction);
        let last_reason = st.last_stop_reason;
        self.transition_locked(st, direction.moving_status(), last_reason);
        st.motion_epoch += 1;
        let epoch = st.motion_epoch;
        let timeout = st.config.watchdog_timeout();
        st.watchdog = Some(WatchdogArm {
            armed_at: Instant::now(),
            timeout,
            epoch,
        });
        spawn_watchdog(Arc::clone(core), epoch);
        if st.config.enable_periodic_verification_while_moving
            && st.config.enable_digital_input_polling
        {
            spawn_verifier(Arc::clone(core), epoch, st.config.verification_interval());
        }
        info!(
            ?direction,
            watchdog_s = timeout.as_secs_f64(),
            "motion started"
        );
        Ok(())
    }

    /// Ordered stop sequence plus resting-status derivation.
    pub(crate) fn stop_locked(&self, st: &mut ControllerState, reason: StopReason) {
        let relays_ok = self.release_relays_locked(st);
        self.disarm_timers_locked(st);

        let eff = self.effective_inputs(st);
        let (status, reason) = if !relays_ok {
            (RoofStatus::Error, StopReason::FaultDetected)
        } else if reason == StopReason::SafetyWatchdogTimeout {
            (RoofStatus::Error, StopReason::SafetyWatchdogTimeout)
        } else if eff.fault || eff.both_limits() {
            (RoofStatus::Error, StopReason::FaultDetected)
        } else if eff.forward_limit {
            (RoofStatus::Open, StopReason::LimitReached)
        } else if eff.reverse_limit {
            (RoofStatus::Closed, StopReason::LimitReached)
        } else {
            match st.last_direction {
                Some(direction) => (direction.partial_status(), reason),
                None => (RoofStatus::Stopped, reason),
            }
        };
        self.transition_locked(st, status, reason);
    }

    /// Immediate stop directly into `Error` (contradictory inputs,
    /// faults, bus-error streaks).
    pub(crate) fn stop_into_error_locked(&self, st: &mut ControllerState, reason: StopReason) {
        let _ = self.release_relays_locked(st);
        self.disarm_timers_locked(st);
        self.transition_locked(st, RoofStatus::Error, reason);
    }

    /// De-energize stop relay first (motion inhibited immediately), then
    /// both direction relays. Every write is attempted.
    fn release_relays_locked(&self, st: &ControllerState) -> bool {
        let mut ok = true;
        for relay in [
            st.config.stop_relay_id,
            st.config.open_relay_id,
            st.config.close_relay_id,
        ] {
            if let Err(e) = self.board.de_energize_relay(relay) {
                ok = false;
                error!(relay, error = %e, "relay de-energize failed during stop");
            }
        }
        ok
    }

    fn disarm_timers_locked(&self, st: &mut ControllerState) {
        st.watchdog = None;
        st.motion_epoch += 1;
        self.cv.notify_all();
    }

    /// React to fresh inputs while moving. `prev` is the effective view
    /// before the update, so direction contradictions fire only on a
    /// genuine rising edge — leaving the opposite limit at motion start
    /// is a falling edge and is ignored.
    pub(crate) fn evaluate_motion_inputs_locked(
        &self,
        st: &mut ControllerState,
        prev: DigitalInputSnapshot,
    ) {
        let direction = match st.status {
            RoofStatus::Opening => MotionDirection::Open,
            RoofStatus::Closing => MotionDirection::Close,
            _ => return,
        };
        let eff = self.effective_inputs(st);

        if eff.fault {
            error!("motor fault asserted during motion");
            self.stop_into_error_locked(st, StopReason::FaultDetected);
        } else if eff.both_limits() {
            error!("both limit switches engaged during motion");
            self.stop_into_error_locked(st, StopReason::FaultDetected);
        } else if eff.limit_for(direction) {
            self.stop_locked(st, StopReason::LimitReached);
        } else if eff.limit_for(direction.opposite()) && !prev.limit_for(direction.opposite()) {
            error!(
                ?direction,
                "opposite limit engaged during motion; contradicts commanded direction"
            );
            self.stop_into_error_locked(st, StopReason::FaultDetected);
        }
    }

    /// Re-derive a non-moving status from the current inputs.
    ///
    /// `Error` is sticky: only the fault-clear path passes
    /// `allow_error_exit` and can settle back to `Stopped`.
    pub(crate) fn rederive_idle_locked(&self, st: &mut ControllerState, allow_error_exit: bool) {
        let eff = self.effective_inputs(st);
        if eff.fault || eff.both_limits() {
            if st.status != RoofStatus::Error {
                warn!(
                    fault = eff.fault,
                    both_limits = eff.both_limits(),
                    "fault condition while idle"
                );
            }
            self.transition_locked(st, RoofStatus::Error, StopReason::FaultDetected);
            return;
        }
        if st.status == RoofStatus::Error && !allow_error_exit {
            return;
        }
        if eff.forward_limit {
            self.transition_locked(st, RoofStatus::Open, StopReason::LimitReached);
        } else if eff.reverse_limit {
            self.transition_locked(st, RoofStatus::Closed, StopReason::LimitReached);
        } else if !st.status.is_resting() {
            let reason = st.last_stop_reason;
            self.transition_locked(st, RoofStatus::Stopped, reason);
        }
    }

    /// One debounced edge from the poller.
    pub(crate) fn handle_edge(&self, edge: ChannelEdge) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let (snap, fault) = {
            let mut st = self.state.lock();
            if !st.initialized {
                return;
            }
            let prev = self.effective_inputs(&st);
            if edge.settled_high {
                st.raw_inputs |= edge.channel.mask();
            } else {
                st.raw_inputs &= !edge.channel.mask();
            }
            st.inputs = DigitalInputSnapshot::from_raw(
                st.raw_inputs,
                st.config.use_normally_closed_limit_switches,
            );
            debug!(channel = ?edge.channel, settled_high = edge.settled_high, "input edge");

            if st.status.is_moving() {
                self.evaluate_motion_inputs_locked(&mut st, prev);
            } else if edge.channel != InputChannel::AtSpeed {
                // At-speed never drives a transition; everything else can.
                self.rederive_idle_locked(&mut st, false);
            }
            (self.snapshot_locked(&st), st.inputs.fault)
        };
        self.publish(&snap, fault);
    }

    /// Record a failed input read; a streak during motion forces a
    /// safety stop. Returns true when a stop happened.
    pub(crate) fn note_bus_error_locked(&self, st: &mut ControllerState, err: &BusError) -> bool {
        st.bus_error_streak += 1;
        warn!(error = %err, streak = st.bus_error_streak, "input read failed");
        if st.status.is_moving() && st.bus_error_streak >= MAX_CONSECUTIVE_BUS_ERRORS {
            error!(
                streak = st.bus_error_streak,
                "bus error streak during motion; forcing safety stop"
            );
            self.stop_into_error_locked(st, StopReason::FaultDetected);
            return true;
        }
        false
    }

    pub(crate) fn snapshot_locked(&self, st: &ControllerState) -> StatusSnapshot {
        let (watchdog_active, remaining) = match st.watchdog {
            Some(arm) => {
                let remaining = arm.timeout.saturating_sub(arm.armed_at.elapsed());
                (true, remaining.as_secs_f64())
            }
            None => (false, 0.0),
        };
        StatusSnapshot {
            status: st.status,
            is_moving: st.status.is_moving(),
            last_stop_reason: st.last_stop_reason,
            last_transition_utc: st.last_transition_utc,
            is_watchdog_active: watchdog_active,
            watchdog_seconds_remaining: remaining,
            is_at_speed: st.inputs.at_speed,
            is_using_physical_hardware: self.board.is_physical(),
            is_ignoring_physical_limit_switches: st.config.ignore_physical_limit_switches,
        }
    }

    /// LED refresh + subscriber notification. Never called with the
    /// state lock held.
    pub(crate) fn publish(&self, snap: &StatusSnapshot, fault_asserted: bool) {
        let mask = LedMask::for_status(snap.status, fault_asserted, snap.is_at_speed);
        if let Err(e) = self.board.set_led_mask(mask) {
            warn!(error = %e, "LED update failed");
        }
        self.publisher.publish(snap);
    }
}

// ─── Initial status derivation ──────────────────────────────────────

/// Status from an initial input snapshot.
fn initial_status(inputs: DigitalInputSnapshot) -> (RoofStatus, StopReason) {
    if inputs.fault || inputs.both_limits() {
        (RoofStatus::Error, StopReason::FaultDetected)
    } else if inputs.forward_limit {
        (RoofStatus::Open, StopReason::LimitReached)
    } else if inputs.reverse_limit {
        (RoofStatus::Closed, StopReason::LimitReached)
    } else {
        (RoofStatus::Stopped, StopReason::None)
    }
}

// ─── Timer threads ──────────────────────────────────────────────────

/// Single-shot safety watchdog. Waits on the state condvar so a normal
/// motion end (epoch bump + notify) wakes and retires it immediately.
pub(crate) fn spawn_watchdog(core: Arc<ControllerCore>, epoch: u64) {
    std::thread::spawn(move || {
        let mut st = core.state.lock();
        loop {
            if core.disposed.load(Ordering::SeqCst) {
                return;
            }
            let Some(arm) = st.watchdog else { return };
            if arm.epoch != epoch || st.motion_epoch != epoch || !st.status.is_moving() {
                return;
            }
            let elapsed = arm.armed_at.elapsed();
            if elapsed >= arm.timeout {
                break;
            }
            core.cv.wait_for(&mut st, arm.timeout - elapsed);
        }
        error!("safety watchdog expired; motion did not complete in time");
        core.stop_locked(&mut st, StopReason::SafetyWatchdogTimeout);
        let snap = core.snapshot_locked(&st);
        let fault = st.inputs.fault;
        drop(st);
        core.publish(&snap, fault);
    });
}

/// Coarse input re-read while moving; catches edges the poller missed.
pub(crate) fn spawn_verifier(core: Arc<ControllerCore>, epoch: u64, interval: Duration) {
    std::thread::spawn(move || {
        let mut st = core.state.lock();
        loop {
            if core.disposed.load(Ordering::SeqCst) {
                return;
            }
            if st.motion_epoch != epoch || !st.status.is_moving() {
                return;
            }
            let timed_out = core.cv.wait_for(&mut st, interval).timed_out();
            if core.disposed.load(Ordering::SeqCst) {
                return;
            }
            if st.motion_epoch != epoch || !st.status.is_moving() {
                return;
            }
            if !timed_out {
                continue;
            }
            let before = st.status;
            match core.board.read_input_mask() {
                Ok(raw) => {
                    st.bus_error_streak = 0;
                    let prev = core.effective_inputs(&st);
                    core.set_raw_locked(&mut st, raw);
                    core.evaluate_motion_inputs_locked(&mut st, prev);
                }
                Err(e) => {
                    core.note_bus_error_locked(&mut st, &e);
                }
            }
            if st.status != before {
                let snap = core.snapshot_locked(&st);
                let fault = st.inputs.fault;
                drop(st);
                core.publish(&snap, fault);
                return;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_status_derivation() {
        let none = DigitalInputSnapshot::default();
        assert_eq!(initial_status(none), (RoofStatus::Stopped, StopReason::None));

        let forward = DigitalInputSnapshot {
            forward_limit: true,
            ..none
        };
        assert_eq!(
            initial_status(forward),
            (RoofStatus::Open, StopReason::LimitReached)
        );

        let reverse = DigitalInputSnapshot {
            reverse_limit: true,
            ..none
        };
        assert_eq!(
            initial_status(reverse),
            (RoofStatus::Closed, StopReason::LimitReached)
        );

        let both = DigitalInputSnapshot {
            forward_limit: true,
            reverse_limit: true,
            ..none
        };
        assert_eq!(
            initial_status(both),
            (RoofStatus::Error, StopReason::FaultDetected)
        );

        let fault = DigitalInputSnapshot { fault: true, ..none };
        assert_eq!(
            initial_status(fault),
            (RoofStatus::Error, StopReason::FaultDetected)
        );
    }
}
