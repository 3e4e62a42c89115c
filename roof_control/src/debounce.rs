//! Per-channel input debouncing.
//!
//! Each of the four channels tracks its last settled value plus the
//! current candidate value and when it was first seen. A candidate
//! settles once it has been observed continuously for the debounce
//! window; settling into a value different from the last settled one
//! emits a [`ChannelEdge`] in raw polarity.

use std::time::{Duration, Instant};

use roof_common::controller::inputs::{ChannelEdge, InputChannel};
use roof_common::hal::consts::INPUT_COUNT;

#[derive(Debug, Clone, Copy, Default)]
struct ChannelFilter {
    /// Last settled raw value. `None` until seeded or first settled.
    settled: Option<bool>,
    /// Candidate value and when it was first observed.
    candidate: Option<(bool, Instant)>,
}

/// Debouncer over the four raw input bits.
#[derive(Debug, Default)]
pub struct InputDebouncer {
    channels: [ChannelFilter; INPUT_COUNT as usize],
}

impl InputDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the baseline settled values without emitting edges.
    ///
    /// Called after an authoritative hardware read (initialization,
    /// explicit refresh) so the next poll does not re-report it.
    pub fn seed(&mut self, raw: u8) {
        for channel in InputChannel::ALL {
            let filter = &mut self.channels[channel as usize];
            filter.settled = Some(raw & channel.mask() != 0);
            filter.candidate = None;
        }
    }

    /// Feed one raw sample; returns the edges that settled.
    pub fn sample(&mut self, raw: u8, now: Instant, window: Duration) -> Vec<ChannelEdge> {
        let mut edges = Vec::new();
        for channel in InputChannel::ALL {
            let value = raw & channel.mask() != 0;
            let filter = &mut self.channels[channel as usize];

            match filter.candidate {
                Some((candidate, _)) if candidate != value => {
                    // Bounce: restart the window on the new value.
                    filter.candidate = Some((value, now));
                }
                Some((candidate, since)) => {
                    if now.duration_since(since) >= window {
                        filter.candidate = None;
                        if filter.settled != Some(candidate) {
                            let emit = filter.settled.is_some();
                            filter.settled = Some(candidate);
                            if emit {
                                edges.push(ChannelEdge {
                                    channel,
                                    settled_high: candidate,
                                });
                            }
                        }
                    }
                }
                None if filter.settled != Some(value) => {
                    if window.is_zero() {
                        let emit = filter.settled.is_some();
                        filter.settled = Some(value);
                        if emit {
                            edges.push(ChannelEdge {
                                channel,
                                settled_high: value,
                            });
                        }
                    } else {
                        filter.candidate = Some((value, now));
                    }
                }
                None => {}
            }
        }
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn edge(channel: InputChannel, settled_high: bool) -> ChannelEdge {
        ChannelEdge {
            channel,
            settled_high,
        }
    }

    #[test]
    fn zero_window_settles_immediately() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0011);
        let edges = deb.sample(0b0010, t0, Duration::ZERO);
        assert_eq!(edges, vec![edge(InputChannel::ForwardLimit, false)]);
        // Stable input emits nothing further.
        assert!(deb.sample(0b0010, t0 + MS, Duration::ZERO).is_empty());
    }

    #[test]
    fn change_must_persist_for_the_window() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0011);
        let window = 10 * MS;

        assert!(deb.sample(0b0010, t0, window).is_empty());
        assert!(deb.sample(0b0010, t0 + 5 * MS, window).is_empty());
        let edges = deb.sample(0b0010, t0 + 10 * MS, window);
        assert_eq!(edges, vec![edge(InputChannel::ForwardLimit, false)]);
    }

    #[test]
    fn bounce_restarts_the_window() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0011);
        let window = 10 * MS;

        assert!(deb.sample(0b0010, t0, window).is_empty());
        // Bounces back before settling.
        assert!(deb.sample(0b0011, t0 + 5 * MS, window).is_empty());
        // Goes low again; the window restarts here.
        assert!(deb.sample(0b0010, t0 + 8 * MS, window).is_empty());
        assert!(deb.sample(0b0010, t0 + 15 * MS, window).is_empty());
        let edges = deb.sample(0b0010, t0 + 18 * MS, window);
        assert_eq!(edges, vec![edge(InputChannel::ForwardLimit, false)]);
    }

    #[test]
    fn settling_back_to_settled_value_emits_nothing() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0000);
        let window = 10 * MS;

        assert!(deb.sample(0b0100, t0, window).is_empty());
        // Returns to the settled value and stays there.
        assert!(deb.sample(0b0000, t0 + 5 * MS, window).is_empty());
        assert!(deb.sample(0b0000, t0 + 20 * MS, window).is_empty());
    }

    #[test]
    fn multiple_channels_settle_independently() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0011);
        let window = 10 * MS;

        assert!(deb.sample(0b0110, t0, window).is_empty());
        let edges = deb.sample(0b0110, t0 + 10 * MS, window);
        assert_eq!(edges.len(), 2);
        assert!(edges.contains(&edge(InputChannel::ForwardLimit, false)));
        assert!(edges.contains(&edge(InputChannel::Fault, true)));
    }

    #[test]
    fn unseeded_first_settle_is_silent() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        assert!(deb.sample(0b1010, t0, Duration::ZERO).is_empty());
        // From then on edges are reported normally.
        let edges = deb.sample(0b1000, t0 + MS, Duration::ZERO);
        assert_eq!(edges, vec![edge(InputChannel::ReverseLimit, false)]);
    }

    #[test]
    fn seed_clears_pending_candidates() {
        let mut deb = InputDebouncer::new();
        let t0 = Instant::now();
        deb.seed(0b0011);
        let window = 10 * MS;
        assert!(deb.sample(0b0010, t0, window).is_empty());
        // An authoritative read overrides the pending candidate.
        deb.seed(0b0011);
        assert!(deb.sample(0b0011, t0 + 20 * MS, window).is_empty());
    }
}
