use embassy_time::{Duration, Instant};
use embedded_hal::delay::DelayNs;

/// Periodic trigger driven by caller-supplied timestamps
///
/// Fires on the first poll, then whenever at least `period` elapsed since the last firing.
/// Timestamps going backwards never fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Interval {
    period: Duration,
    last: Option<Instant>,
}

impl Interval {
    pub const fn new(period: Duration) -> Self {
        Self { period, last: None }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last {
            Some(last) => now.saturating_duration_since(last) >= self.period,
            None => true,
        }
    }

    /// Restarts the period at `now` and returns true if the trigger was due.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = self.is_due(now);
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Blocks for `duration` with millisecond resolution.
pub(crate) fn block_for(delay: &mut impl DelayNs, duration: Duration) {
    let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    delay.delay_ms(ms);
}
