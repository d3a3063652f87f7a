use crate::playback::{EndBehavior, NOMINAL_FRAME_RATE, TICK_RATE};

/// Frames advanced per tick at 1x speed
pub const FRAMES_PER_TICK: f64 = NOMINAL_FRAME_RATE / TICK_RATE;

/// Continuous playback position driven by fixed-rate ticks.
///
/// Data is sampled at 25 Hz while ticks arrive at 60 Hz, so the position
/// accumulates fractional frames; the resolver floors it.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    position: f64,
    paused: bool,
    speed: f64,
    total_frames: usize,
    end_behavior: EndBehavior,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self {
            position: 0.0,
            paused: true,
            speed: 1.0,
            total_frames: 0,
            end_behavior: EndBehavior::Hold,
        }
    }

    pub fn with_end_behavior(mut self, end_behavior: EndBehavior) -> Self {
        self.end_behavior = end_behavior;
        self
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn end_behavior(&self) -> EndBehavior {
        self.end_behavior
    }

    /// Highest reachable position
    pub fn last_position(&self) -> f64 {
        self.total_frames.saturating_sub(1) as f64
    }

    pub fn set_total_frames(&mut self, total: usize) {
        self.total_frames = total;
        self.position = self.clamp(self.position);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Accepts any finite positive multiplier, ignores the rest
    pub fn set_speed(&mut self, speed: f64) -> bool {
        if speed.is_finite() && speed > 0.0 {
            self.speed = speed;
            true
        } else {
            false
        }
    }

    pub fn set_position(&mut self, position: f64) {
        self.position = self.clamp(position);
    }

    /// One scheduler tick
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Apply `ticks` scheduler ticks as a single position update
    pub fn advance(&mut self, ticks: u32) {
        if self.paused || ticks == 0 {
            return;
        }

        let mut position = self.position + ticks as f64 * self.speed * FRAMES_PER_TICK;

        let last = self.last_position();
        if position >= last {
            position = last;
            if self.end_behavior == EndBehavior::Pause {
                self.paused = true;
            }
        }
        self.position = self.clamp(position);
    }

    pub fn reset(&mut self) {
        self.position = 0.0;
        self.paused = true;
        self.speed = 1.0;
    }

    fn clamp(&self, position: f64) -> f64 {
        if position.is_nan() {
            return 0.0;
        }
        position.clamp(0.0, self.last_position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playing(total: usize, speed: f64) -> PlaybackClock {
        let mut clock = PlaybackClock::new();
        clock.set_total_frames(total);
        clock.set_speed(speed);
        clock.set_paused(false);
        clock
    }

    #[test]
    fn test_starts_paused_at_zero() {
        let clock = PlaybackClock::new();
        assert_eq!(clock.position(), 0.0);
        assert!(clock.is_paused());
        assert_eq!(clock.speed(), 1.0);
    }

    #[test]
    fn test_paused_clock_does_not_move() {
        let mut clock = playing(1000, 1.0);
        clock.set_paused(true);
        clock.advance(600);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_advance_scales_with_speed() {
        for speed in [0.25, 0.5, 1.0, 2.0, 8.0] {
            let mut clock = playing(100_000, speed);
            for _ in 0..120 {
                clock.tick();
            }
            let expected = 120.0 * speed * 25.0 / 60.0;
            assert!(
                (clock.position() - expected).abs() < 1e-9,
                "speed {}: {} != {}",
                speed,
                clock.position(),
                expected
            );
        }
    }

    #[test]
    fn test_thirty_ticks_at_4x() {
        let mut clock = playing(10_000, 4.0);
        clock.advance(30);
        assert!((clock.position() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_holds_at_last_frame() {
        let mut clock = playing(100, 16.0);
        clock.advance(1000);
        assert_eq!(clock.position(), 99.0);
        assert!(!clock.is_paused());

        clock.advance(10);
        assert_eq!(clock.position(), 99.0);
    }

    #[test]
    fn test_pause_at_end_behavior() {
        let mut clock = playing(100, 16.0).with_end_behavior(EndBehavior::Pause);
        clock.advance(1000);
        assert_eq!(clock.position(), 99.0);
        assert!(clock.is_paused());
    }

    #[test]
    fn test_empty_session_stays_at_zero() {
        let mut clock = playing(0, 2.0);
        clock.advance(10);
        assert_eq!(clock.position(), 0.0);
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        let mut clock = PlaybackClock::new();
        assert!(!clock.set_speed(0.0));
        assert!(!clock.set_speed(-2.0));
        assert!(!clock.set_speed(f64::NAN));
        assert!(clock.set_speed(3.0));
        assert_eq!(clock.speed(), 3.0);
    }

    #[test]
    fn test_shrinking_total_clamps_position() {
        let mut clock = PlaybackClock::new();
        clock.set_total_frames(500);
        clock.set_position(450.0);
        clock.set_total_frames(100);
        assert_eq!(clock.position(), 99.0);
    }

    #[test]
    fn test_reset() {
        let mut clock = playing(500, 8.0);
        clock.advance(20);
        clock.reset();
        assert_eq!(clock.position(), 0.0);
        assert!(clock.is_paused());
        assert_eq!(clock.speed(), 1.0);
        assert_eq!(clock.total_frames(), 500);
    }
}
