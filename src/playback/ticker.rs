use std::time::Duration;

use crate::playback::TICK_RATE;

/// Longest catch-up applied in one go, e.g. after the window was dragged
const MAX_CATCH_UP_TICKS: u32 = 30;

/// Turns wall-clock deltas from the render loop into whole 60 Hz ticks.
///
/// The render loop runs at whatever rate vsync allows; the clock must see a
/// fixed tick rate, so leftover time carries over to the next frame.
#[derive(Debug, Clone)]
pub struct Ticker {
    interval: Duration,
    pending: Duration,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new(TICK_RATE)
    }
}

impl Ticker {
    pub fn new(rate_hz: f64) -> Self {
        Self {
            interval: Duration::from_secs_f64(1.0 / rate_hz),
            pending: Duration::ZERO,
        }
    }

    /// Number of ticks due after `elapsed` more wall-clock time
    pub fn due(&mut self, elapsed: Duration) -> u32 {
        self.pending = self.pending.saturating_add(elapsed);

        let due = self.pending.as_nanos() / self.interval.as_nanos().max(1);
        if due > u128::from(MAX_CATCH_UP_TICKS) {
            self.pending = Duration::ZERO;
            return MAX_CATCH_UP_TICKS;
        }

        let ticks = due as u32;
        self.pending -= self.interval * ticks;
        ticks
    }

    pub fn reset(&mut self) {
        self.pending = Duration::ZERO;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulates_partial_intervals() {
        let mut ticker = Ticker::new(50.0);

        assert_eq!(ticker.due(Duration::from_millis(10)), 0);
        assert_eq!(ticker.due(Duration::from_millis(10)), 1);
        assert_eq!(ticker.due(Duration::from_millis(65)), 3);
        assert_eq!(ticker.due(Duration::from_millis(15)), 1);
    }

    #[test]
    fn test_one_second_is_sixty_ticks() {
        let mut ticker = Ticker::new(60.0);
        let mut total = 0;
        for _ in 0..10 {
            total += ticker.due(Duration::from_millis(100));
        }
        // float rounding of the interval may leave the last tick pending
        assert!((59..=60).contains(&total), "got {}", total);
    }

    #[test]
    fn test_caps_catch_up() {
        let mut ticker = Ticker::new(60.0);
        assert_eq!(ticker.due(Duration::from_secs(5)), MAX_CATCH_UP_TICKS);
        assert_eq!(ticker.due(Duration::ZERO), 0);
    }

    #[test]
    fn test_long_suspend_is_capped_at_once() {
        let mut ticker = Ticker::new(60.0);
        let a_year = Duration::from_secs(365 * 24 * 3600);
        assert_eq!(ticker.due(a_year), MAX_CATCH_UP_TICKS);
        assert_eq!(ticker.due(Duration::MAX), MAX_CATCH_UP_TICKS);
        assert_eq!(ticker.due(Duration::from_millis(1)), 0);
    }
}
