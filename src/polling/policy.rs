//! Report poll cadence.
//!
//! A policy turns into a schedule: an iterator of delays, one per automatic
//! re-fetch. When the schedule runs dry the engine stops polling on its own.

use std::time::Duration;

use tokio_retry::strategy::{ExponentialBackoff, FixedInterval};

use crate::config::{MAX_POLL_BACKOFF, REPORT_POLL_INTERVAL};

/// How the delay between report fetches evolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollCadence {
    /// Every delay equals the policy interval.
    Fixed,
    /// Delays double after every non-terminal fetch, never above `max_delay`.
    Exponential { max_delay: Duration },
}

/// When to re-fetch a report that is still being analyzed.
///
/// The default is a fixed 5 second delay with no cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub cadence: PollCadence,
    /// Total fetches allowed for one polling run, first fetch included.
    pub max_polls: Option<usize>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::fixed(REPORT_POLL_INTERVAL)
    }
}

impl PollPolicy {
    /// Fixed cadence without a cap.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            cadence: PollCadence::Fixed,
            max_polls: None,
        }
    }

    /// Switches to a doubling cadence capped at `max_delay`.
    pub fn with_backoff(mut self, max_delay: Duration) -> Self {
        self.cadence = PollCadence::Exponential {
            max_delay: max_delay.max(self.interval),
        };
        self
    }

    /// Caps the number of fetches per polling run. The first fetch always
    /// happens, so `0` is treated as `1`.
    pub fn with_max_polls(mut self, max_polls: usize) -> Self {
        self.max_polls = Some(max_polls.max(1));
        self
    }

    /// Delays between consecutive fetches of one polling run.
    ///
    /// The first fetch happens immediately and is not part of the schedule.
    pub fn schedule(&self) -> Box<dyn Iterator<Item = Duration> + Send> {
        let delays: Box<dyn Iterator<Item = Duration> + Send> = match self.cadence {
            PollCadence::Fixed => Box::new(FixedInterval::new(self.interval)),
            PollCadence::Exponential { max_delay } => {
                // base 2 scaled by half the interval: interval, 2x, 4x, ...
                let half_millis = (self.interval.as_millis() / 2).max(1) as u64;
                Box::new(
                    ExponentialBackoff::from_millis(2)
                        .factor(half_millis)
                        .max_delay(max_delay),
                )
            }
        };

        match self.max_polls {
            Some(max_polls) => Box::new(delays.take(max_polls.saturating_sub(1))),
            None => delays,
        }
    }
}

/// Exponential policy starting at `interval`, capped at the default ceiling.
pub fn backoff_policy(interval: Duration) -> PollPolicy {
    PollPolicy::fixed(interval).with_backoff(MAX_POLL_BACKOFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fixed_and_unbounded() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(5));
        assert_eq!(policy.cadence, PollCadence::Fixed);

        let delays: Vec<_> = policy.schedule().take(100).collect();
        assert_eq!(delays.len(), 100);
        assert!(delays.iter().all(|d| *d == Duration::from_secs(5)));
    }

    #[test]
    fn test_backoff_doubles_up_to_ceiling() {
        let policy = backoff_policy(Duration::from_secs(5));
        let delays: Vec<u64> = policy.schedule().take(6).map(|d| d.as_secs()).collect();
        assert_eq!(delays, vec![5, 10, 20, 40, 60, 60]);
    }

    #[test]
    fn test_max_polls_counts_first_fetch() {
        let policy = PollPolicy::fixed(Duration::from_secs(1)).with_max_polls(3);
        assert_eq!(policy.schedule().count(), 2);

        let single = PollPolicy::fixed(Duration::from_secs(1)).with_max_polls(1);
        assert_eq!(single.schedule().count(), 0);

        let zero = PollPolicy::fixed(Duration::from_secs(1)).with_max_polls(0);
        assert_eq!(zero.max_polls, Some(1));
        assert_eq!(zero.schedule().count(), 0);
    }

    #[test]
    fn test_backoff_ceiling_never_below_interval() {
        let policy = PollPolicy::fixed(Duration::from_secs(90)).with_backoff(Duration::from_secs(60));
        assert_eq!(
            policy.cadence,
            PollCadence::Exponential {
                max_delay: Duration::from_secs(90)
            }
        );
        assert_eq!(policy.schedule().next(), Some(Duration::from_secs(90)));
    }
}
