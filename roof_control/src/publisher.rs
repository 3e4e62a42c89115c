//! Status publisher: versioned copy-on-change snapshot + subscribers.
//!
//! Delivery is best-effort and synchronous; the controller only calls
//! [`StatusPublisher::publish`] after releasing its state lock, so a
//! subscriber may call back into the controller (e.g. `get_status`)
//! without deadlocking. Subscribers must not subscribe or unsubscribe
//! from within a callback.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use roof_common::controller::snapshot::StatusSnapshot;

/// Handle returned by [`StatusPublisher::subscribe`].
pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&StatusSnapshot) + Send + Sync>;

/// Versioned snapshot store with a subscriber callback list.
pub struct StatusPublisher {
    latest: Mutex<Option<StatusSnapshot>>,
    version: AtomicU64,
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl StatusPublisher {
    pub fn new() -> Self {
        Self {
            latest: Mutex::new(None),
            version: AtomicU64::new(0),
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Store the new snapshot, bump the version, notify subscribers.
    pub fn publish(&self, snapshot: &StatusSnapshot) {
        *self.latest.lock() = Some(snapshot.clone());
        self.version.fetch_add(1, Ordering::SeqCst);
        for (_, callback) in self.subscribers.lock().iter() {
            callback(snapshot);
        }
    }

    /// The most recently published snapshot, if any.
    pub fn latest(&self) -> Option<StatusSnapshot> {
        self.latest.lock().clone()
    }

    /// Monotonic publish counter.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&StatusSnapshot) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.lock().push((id, Box::new(callback)));
        id
    }

    /// Returns true if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id);
        subscribers.len() != before
    }
}

impl Default for StatusPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use roof_common::controller::status::{RoofStatus, StopReason};
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    fn snapshot(status: RoofStatus) -> StatusSnapshot {
        StatusSnapshot {
            status,
            is_moving: status.is_moving(),
            last_stop_reason: StopReason::None,
            last_transition_utc: Utc::now(),
            is_watchdog_active: false,
            watchdog_seconds_remaining: 0.0,
            is_at_speed: false,
            is_using_physical_hardware: false,
            is_ignoring_physical_limit_switches: false,
        }
    }

    #[test]
    fn publish_stores_latest_and_bumps_version() {
        let publisher = StatusPublisher::new();
        assert!(publisher.latest().is_none());
        assert_eq!(publisher.version(), 0);

        publisher.publish(&snapshot(RoofStatus::Stopped));
        assert_eq!(publisher.version(), 1);
        assert_eq!(publisher.latest().unwrap().status, RoofStatus::Stopped);

        publisher.publish(&snapshot(RoofStatus::Opening));
        assert_eq!(publisher.version(), 2);
        assert_eq!(publisher.latest().unwrap().status, RoofStatus::Opening);
    }

    #[test]
    fn subscribers_receive_each_publish() {
        let publisher = StatusPublisher::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = seen.clone();
        publisher.subscribe(move |_| {
            seen_cb.fetch_add(1, Ordering::SeqCst);
        });
        publisher.publish(&snapshot(RoofStatus::Stopped));
        publisher.publish(&snapshot(RoofStatus::Opening));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let publisher = StatusPublisher::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_cb = seen.clone();
        let id = publisher.subscribe(move |_| {
            seen_cb.fetch_add(1, Ordering::SeqCst);
        });
        publisher.publish(&snapshot(RoofStatus::Stopped));
        assert!(publisher.unsubscribe(id));
        assert!(!publisher.unsubscribe(id));
        publisher.publish(&snapshot(RoofStatus::Opening));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
