//! Digital input polling thread.
//!
//! Samples the raw input register on the configured cadence, feeds the
//! debouncer, and hands settled edges to the controller. The thread is
//! spawned once at initialization and lives until disposal; while
//! polling is disabled it idles on a coarse re-check wait so that a
//! configuration update can re-enable it without thread churn.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use tracing::info;

use roof_common::consts::POLLER_IDLE_RECHECK_MS;

use crate::controller::ControllerCore;

pub(crate) fn spawn(core: Arc<ControllerCore>) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || run(core))
}

fn run(core: Arc<ControllerCore>) {
    info!("digital input poller started");
    loop {
        let (enabled, window) = {
            let mut st = core.state.lock();
            if core.disposed.load(Ordering::SeqCst) {
                break;
            }
            let enabled = st.config.enable_digital_input_polling;
            let wait = if enabled {
                st.config.poll_interval()
            } else {
                Duration::from_millis(POLLER_IDLE_RECHECK_MS)
            };
            let window = st.config.debounce();
            core.cv.wait_for(&mut st, wait);
            if core.disposed.load(Ordering::SeqCst) {
                break;
            }
            (enabled, window)
        };
        if enabled {
            sample(&core, window);
        }
    }
    info!("digital input poller stopped");
}

fn sample(core: &ControllerCore, window: Duration) {
    match core.board.read_input_mask() {
        Ok(raw) => {
            // The debouncer lock is never taken while holding the state
            // lock here; the controller does the reverse, so keeping the
            // sample outside the state lock avoids any ordering cycle.
            let edges = core.debouncer.lock().sample(raw, Instant::now(), window);
            core.state.lock().bus_error_streak = 0;
            for edge in edges {
                core.handle_edge(edge);
            }
        }
        Err(e) => {
            let publish = {
                let mut st = core.state.lock();
                core.note_bus_error_locked(&mut st, &e)
                    .then(|| (core.snapshot_locked(&st), st.inputs.fault))
            };
            if let Some((snap, fault)) = publish {
                core.publish(&snap, fault);
            }
        }
    }
}
