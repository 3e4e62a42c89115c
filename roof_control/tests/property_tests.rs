//! Property tests over random command sequences.
//!
//! Polling is disabled and the inputs never change, so every sequence is
//! deterministic; the watchdog is armed but far too long to fire inside
//! a test case.

use std::sync::Arc;
use std::time::Duration;

use proptest::prelude::*;
use roof_common::controller::config::RoofControllerConfig;
use roof_common::controller::status::StopReason;
use roof_control::RoofController;
use roof_hal::{RelayBoard, SimulatedBus};

#[derive(Debug, Clone, Copy)]
enum Command {
    Open,
    Close,
    Stop,
    Refresh,
    ClearFault,
}

fn command_strategy() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Open),
        Just(Command::Close),
        Just(Command::Stop),
        Just(Command::Refresh),
        Just(Command::ClearFault),
    ]
}

fn quiet_config() -> RoofControllerConfig {
    RoofControllerConfig {
        safety_watchdog_timeout_s: 600.0,
        enable_digital_input_polling: false,
        enable_periodic_verification_while_moving: false,
        limit_switch_debounce_ms: 0,
        ..Default::default()
    }
}

fn apply(controller: &RoofController, command: Command) {
    let _ = match command {
        Command::Open => controller.open().map(drop),
        Command::Close => controller.close().map(drop),
        Command::Stop => controller.stop(StopReason::CommandIssued).map(drop),
        Command::Refresh => controller.refresh_status(true).map(drop),
        Command::ClearFault => controller.clear_fault(Duration::from_millis(1)).map(drop),
    };
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Invariants 1-3: direction relays are mutually exclusive, the
    /// fail-safe stop relay is energized exactly while moving, and the
    /// watchdog is armed exactly while moving.
    #[test]
    fn relay_and_watchdog_invariants(commands in prop::collection::vec(command_strategy(), 1..24)) {
        let bus = Arc::new(SimulatedBus::with_input_mask(0b0011));
        let controller = RoofController::new(RelayBoard::new(bus.clone()), quiet_config()).unwrap();
        controller.initialize().unwrap();

        for command in commands {
            apply(&controller, command);

            let mask = bus.relay_mask();
            let snap = controller.get_status().unwrap();
            prop_assert!(
                mask & 0b0001 == 0 || mask & 0b0010 == 0,
                "open and close relays both energized: 0b{mask:04b}"
            );
            prop_assert_eq!(
                mask & 0b1000 != 0,
                snap.status.is_moving(),
                "stop relay {} while status {}", mask & 0b1000 != 0, snap.status
            );
            prop_assert_eq!(snap.is_watchdog_active, snap.is_moving);
            prop_assert_eq!(snap.is_moving, snap.status.is_moving());
        }

        controller.dispose().unwrap();
        prop_assert_eq!(bus.relay_mask(), 0);
    }

    /// Invariant 6: duplicate motion commands and repeated stops are
    /// idempotent.
    #[test]
    fn repeated_commands_converge(commands in prop::collection::vec(command_strategy(), 0..16)) {
        let bus = Arc::new(SimulatedBus::with_input_mask(0b0011));
        let controller = RoofController::new(RelayBoard::new(bus), quiet_config()).unwrap();
        controller.initialize().unwrap();

        for command in commands {
            apply(&controller, command);
        }

        let _ = controller.stop(StopReason::CommandIssued);
        let first = controller.get_status().unwrap().status;
        let _ = controller.stop(StopReason::CommandIssued);
        let second = controller.get_status().unwrap().status;
        prop_assert_eq!(first, second);

        if controller.open().is_ok() {
            let moving = controller.get_status().unwrap();
            let duplicate = controller.open().unwrap();
            prop_assert_eq!(duplicate.status, moving.status);
            prop_assert_eq!(duplicate.last_transition_utc, moving.last_transition_utc);
        }
    }

    /// Invariant 5: a valid configuration round-trips through
    /// `update_configuration` / `get_configuration` unchanged.
    #[test]
    fn configuration_roundtrip(
        watchdog_s in 1.0f64..500.0,
        poll_ms in 1u64..500,
        verification_s in 0.01f64..1.0,
        debounce_ms in 0u64..200,
        relays in proptest::sample::select(vec![
            [1u8, 2, 3, 4],
            [4, 3, 2, 1],
            [2, 1, 4, 3],
            [3, 4, 1, 2],
        ]),
        nc in any::<bool>(),
        verify in any::<bool>(),
        ignore in any::<bool>(),
        restart_wait in proptest::option::of(0.0f64..300.0),
    ) {
        let config = RoofControllerConfig {
            safety_watchdog_timeout_s: watchdog_s,
            open_relay_id: relays[0],
            close_relay_id: relays[1],
            clear_fault_relay_id: relays[2],
            stop_relay_id: relays[3],
            enable_digital_input_polling: true,
            digital_input_poll_interval_ms: poll_ms,
            enable_periodic_verification_while_moving: verify,
            periodic_verification_interval_s: verification_s,
            use_normally_closed_limit_switches: nc,
            limit_switch_debounce_ms: debounce_ms,
            ignore_physical_limit_switches: ignore,
            restart_on_failure_wait_time_s: restart_wait,
        };
        prop_assert!(config.validate().is_ok());

        // Raw levels chosen so neither wiring convention reads a limit
        // as engaged; the initial config uses the same convention so the
        // controller comes up Stopped.
        let initial = RoofControllerConfig {
            use_normally_closed_limit_switches: nc,
            ..quiet_config()
        };
        let bus = Arc::new(SimulatedBus::with_input_mask(if nc { 0b0011 } else { 0b0000 }));
        let controller = RoofController::new(RelayBoard::new(bus), initial).unwrap();
        controller.initialize().unwrap();

        let applied = controller.update_configuration(config.clone()).unwrap();
        prop_assert_eq!(&applied, &config);
        prop_assert_eq!(&controller.get_configuration().unwrap(), &config);
    }
}
