//! Producer-side rate limiting of frame batches.

use std::time::{Duration, Instant};

use super::command::Command;

/// Default frame batches per second.
pub const DEFAULT_RATE: f64 = 30.0;

/// Limits how often batches are handed to the pipeline.
///
/// A batch offered too early is held back; a newer one replaces it, so at
/// most one batch is ever pending and it is always the most recent.
#[derive(Debug)]
pub struct DrawThrottle {
    interval: Duration,
    last_sent: Option<Instant>,
    pending: Option<Vec<Command>>,
    coalesced: u64,
}

impl Default for DrawThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_RATE)
    }
}

impl DrawThrottle {
    /// A non-positive or non-finite rate disables throttling.
    pub fn new(rate_per_second: f64) -> Self {
        let interval = if rate_per_second.is_finite() && rate_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / rate_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            last_sent: None,
            pending: None,
            coalesced: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of batches dropped in favour of a newer one.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Offer a new batch at `now`.
    ///
    /// Returns the batch when it may be sent right away, otherwise keeps it
    /// as the pending batch and returns `None`.
    pub fn offer(&mut self, batch: Vec<Command>, now: Instant) -> Option<Vec<Command>> {
        if self.is_ready(now) {
            self.pending = None;
            self.last_sent = Some(now);
            return Some(batch);
        }
        if self.pending.replace(batch).is_some() {
            self.coalesced += 1;
        }
        None
    }

    /// Release the pending batch once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<Vec<Command>> {
        if self.pending.is_none() || !self.is_ready(now) {
            return None;
        }
        self.last_sent = Some(now);
        self.pending.take()
    }

    /// When the pending batch becomes sendable.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(match self.last_sent {
            Some(sent) => sent + self.interval,
            None => Instant::now(),
        })
    }

    fn is_ready(&self, now: Instant) -> bool {
        self.last_sent
            .map_or(true, |sent| now.saturating_duration_since(sent) >= self.interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(name: &str) -> Vec<Command> {
        vec![Command::clear(name)]
    }

    fn cleared(batch: &[Command]) -> &str {
        match &batch[0] {
            Command::ClearSurface(clear) => &clear.name,
            other => panic!("unexpected {}", other.kind()),
        }
    }

    #[test]
    fn test_default_rate() {
        let throttle = DrawThrottle::default();
        assert_eq!(throttle.interval(), Duration::from_secs_f64(1.0 / 30.0));
    }

    #[test]
    fn test_first_batch_passes() {
        let mut throttle = DrawThrottle::new(10.0);
        assert!(throttle.offer(batch("a"), Instant::now()).is_some());
        assert!(!throttle.has_pending());
    }

    #[test]
    fn test_early_batches_coalesce_to_latest() {
        let mut throttle = DrawThrottle::new(10.0);
        let t0 = Instant::now();
        throttle.offer(batch("a"), t0);

        assert!(throttle.offer(batch("b"), t0 + Duration::from_millis(20)).is_none());
        assert!(throttle.offer(batch("c"), t0 + Duration::from_millis(40)).is_none());
        assert_eq!(throttle.coalesced(), 1);
        assert_eq!(throttle.next_deadline(), Some(t0 + Duration::from_millis(100)));

        assert!(throttle.poll(t0 + Duration::from_millis(90)).is_none());
        let sent = throttle.poll(t0 + Duration::from_millis(100)).unwrap();
        assert_eq!(cleared(&sent), "c");
        assert!(throttle.next_deadline().is_none());
    }

    #[test]
    fn test_zero_rate_never_throttles() {
        let mut throttle = DrawThrottle::new(0.0);
        let now = Instant::now();
        assert!(throttle.offer(batch("a"), now).is_some());
        assert!(throttle.offer(batch("b"), now).is_some());
    }
}
