//! Sampled execution for digital controllers.
//!
//! A controller only recomputes once the minimum sample interval has passed
//! since its last update; between samples its output is held (zero-order hold).

use std::time::Duration;

/// Tracks when a sampled controller last ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleGate {
    /// Minimum time between two updates.
    pub interval: Duration,
    last: Option<Duration>,
}

impl SampleGate {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether an update is due at `now`. The very first call is always due.
    pub fn is_due(&self, now: Duration) -> bool {
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval,
        }
    }

    /// Time since the last update, `None` before the first one.
    pub fn elapsed(&self, now: Duration) -> Option<Duration> {
        self.last.map(|last| now.saturating_sub(last))
    }

    /// Record an update at `now`.
    pub fn mark(&mut self, now: Duration) {
        self.last = Some(now);
    }

    pub fn last(&self) -> Option<Duration> {
        self.last
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_is_due() {
        let gate = SampleGate::new(Duration::from_secs(10));
        assert!(gate.is_due(Duration::ZERO));
        assert_eq!(gate.elapsed(Duration::from_secs(3)), None);
    }

    #[test]
    fn holds_until_interval_passes() {
        let mut gate = SampleGate::new(Duration::from_secs(10));
        gate.mark(Duration::from_secs(1));
        assert!(!gate.is_due(Duration::from_secs(5)));
        assert!(!gate.is_due(Duration::from_millis(10_999)));
        assert!(gate.is_due(Duration::from_secs(11)));
        assert_eq!(
            gate.elapsed(Duration::from_secs(12)),
            Some(Duration::from_secs(11))
        );
    }

    #[test]
    fn clock_going_backwards_is_not_due() {
        let mut gate = SampleGate::new(Duration::from_secs(1));
        gate.mark(Duration::from_secs(5));
        assert!(!gate.is_due(Duration::from_secs(2)));
        assert_eq!(gate.elapsed(Duration::from_secs(2)), Some(Duration::ZERO));
    }

    #[test]
    fn reset_makes_next_update_due() {
        let mut gate = SampleGate::new(Duration::from_secs(10));
        gate.mark(Duration::from_secs(1));
        gate.reset();
        assert!(gate.is_due(Duration::from_secs(2)));
        assert_eq!(gate.last(), None);
    }
}
