use std::sync::Arc;
use tracing::debug;

use crate::core::Frame;
use crate::playback::{
    EndBehavior, FrameStore, PlaybackClock, Selection, StoreError, MAX_SPEED, MIN_SPEED,
    SPEED_STEPS,
};

/// Discrete control operation, as issued by buttons and shortcuts
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackCommand {
    TogglePause,
    SetPaused(bool),
    SeekTo(i64),
    StepBy(i64),
    SetSpeed(f64),
    SpeedUp,
    SpeedDown,
    SelectDriver(Option<String>),
    Reset,
}

/// Playback engine for a session's telemetry frames
///
/// Owns the frame store, the clock and the driver selection. All control
/// operations are bounds-checked and never fail.
#[derive(Debug, Default)]
pub struct PlaybackEngine {
    store: FrameStore,
    clock: PlaybackClock,
    selection: Selection,
}

impl PlaybackEngine {
    pub fn with_end_behavior(end_behavior: EndBehavior) -> Self {
        Self {
            clock: PlaybackClock::new().with_end_behavior(end_behavior),
            ..Self::default()
        }
    }

    /// Get the frame store
    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    /// Set the total frame count announced by the source
    pub fn set_total_frames(&mut self, total: usize) {
        self.store.set_total(total);
        self.clock.set_total_frames(self.store.total_count());
    }

    /// Append a contiguous batch of frames
    pub fn append_frames(&mut self, start: usize, frames: Vec<Frame>) -> Result<usize, StoreError> {
        self.store.append(start, frames)
    }

    /// Get current playback position (fractional frame index)
    pub fn position(&self) -> f64 {
        self.clock.position()
    }

    /// Get the frame index the resolver reads
    pub fn current_index(&self) -> usize {
        self.clock.position().floor() as usize
    }

    /// Get total number of frames in the session
    pub fn total_frames(&self) -> usize {
        self.clock.total_frames()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    /// Get current playback speed
    pub fn speed(&self) -> f64 {
        self.clock.speed()
    }

    /// Frame under the playhead, `None` while it has not been loaded
    pub fn current_frame(&self) -> Option<&Arc<Frame>> {
        self.store.frame_at(self.current_index())
    }

    /// Advance by `ticks` scheduler ticks
    pub fn tick(&mut self, ticks: u32) {
        self.clock.advance(ticks);
    }

    /// Flip between playing and paused
    pub fn toggle_pause(&mut self) {
        let paused = !self.clock.is_paused();
        self.clock.set_paused(paused);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.clock.set_paused(paused);
    }

    /// Seek to a specific frame, clamped into the session
    pub fn seek_to(&mut self, frame: i64) {
        let last = self.clock.total_frames().saturating_sub(1) as i64;
        self.clock.set_position(frame.clamp(0, last.max(0)) as f64);
    }

    /// Seek relative to the current frame
    pub fn step_by(&mut self, delta: i64) {
        let current = self.current_index() as i64;
        self.seek_to(current.saturating_add(delta));
    }

    /// Set playback speed; only the values offered in the speed selector are accepted
    pub fn set_speed(&mut self, speed: f64) -> bool {
        if !SPEED_STEPS.contains(&speed) {
            debug!("Ignoring unsupported playback speed {}", speed);
            return false;
        }
        self.clock.set_speed(speed)
    }

    /// Double the speed, up to 16x
    pub fn speed_up(&mut self) {
        let speed = (self.clock.speed() * 2.0).clamp(MIN_SPEED, MAX_SPEED);
        self.clock.set_speed(speed);
    }

    /// Halve the speed, down to 0.25x
    pub fn speed_down(&mut self) {
        let speed = (self.clock.speed() / 2.0).clamp(MIN_SPEED, MAX_SPEED);
        self.clock.set_speed(speed);
    }

    /// Select a driver; selecting the highlighted one clears it
    pub fn select_driver(&mut self, code: Option<&str>) {
        self.selection.select(code);
    }

    pub fn selected_driver(&self) -> Option<&str> {
        self.selection.selected()
    }

    /// Apply a control command
    pub fn apply(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::TogglePause => self.toggle_pause(),
            PlaybackCommand::SetPaused(paused) => self.set_paused(paused),
            PlaybackCommand::SeekTo(frame) => self.seek_to(frame),
            PlaybackCommand::StepBy(delta) => self.step_by(delta),
            PlaybackCommand::SetSpeed(speed) => {
                self.set_speed(speed);
            }
            PlaybackCommand::SpeedUp => self.speed_up(),
            PlaybackCommand::SpeedDown => self.speed_down(),
            PlaybackCommand::SelectDriver(code) => self.select_driver(code.as_deref()),
            PlaybackCommand::Reset => self.reset(),
        }
    }

    /// Back to frame 0, paused, 1x, nothing selected
    pub fn reset(&mut self) {
        self.clock.reset();
        self.selection.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn frames(start: usize, count: usize) -> Vec<Frame> {
        (start..start + count)
            .map(|i| Frame {
                t: i as f64 / 25.0,
                lap: 1 + (i / 1000) as u32,
                drivers: HashMap::new(),
                weather: None,
            })
            .collect()
    }

    fn loaded_engine(total: usize) -> PlaybackEngine {
        let mut engine = PlaybackEngine::default();
        engine.set_total_frames(total);
        engine.append_frames(0, frames(0, total)).unwrap();
        engine
    }

    #[test]
    fn test_seek_clamps_into_range() {
        let mut engine = loaded_engine(500);

        engine.seek_to(-20);
        assert_eq!(engine.position(), 0.0);

        engine.seek_to(10_000);
        assert_eq!(engine.position(), 499.0);
        assert!(engine.current_frame().is_some());

        engine.seek_to(123);
        assert_eq!(engine.current_index(), 123);
    }

    #[test]
    fn test_step_back_clamps_at_zero() {
        let mut engine = loaded_engine(1000);
        engine.seek_to(50);
        engine.step_by(-100);
        assert_eq!(engine.position(), 0.0);
    }

    #[test]
    fn test_step_uses_integer_position() {
        let mut engine = loaded_engine(1000);
        engine.seek_to(10);
        engine.set_paused(false);
        engine.tick(1); // 10.4166..
        engine.step_by(100);
        assert_eq!(engine.position(), 110.0);

        engine.step_by(10_000);
        assert_eq!(engine.position(), 999.0);
    }

    #[test]
    fn test_speed_validation_and_doubling() {
        let mut engine = PlaybackEngine::default();

        assert!(!engine.set_speed(3.0));
        assert_eq!(engine.speed(), 1.0);
        assert!(engine.set_speed(8.0));

        engine.speed_up();
        assert_eq!(engine.speed(), 16.0);
        engine.speed_up();
        assert_eq!(engine.speed(), 16.0);

        engine.set_speed(0.5);
        engine.speed_down();
        assert_eq!(engine.speed(), 0.25);
        engine.speed_down();
        assert_eq!(engine.speed(), 0.25);
    }

    #[test]
    fn test_toggle_pause() {
        let mut engine = PlaybackEngine::default();
        assert!(engine.is_paused());
        engine.toggle_pause();
        assert!(!engine.is_paused());
        engine.toggle_pause();
        assert!(engine.is_paused());
    }

    #[test]
    fn test_seek_past_loaded_prefix_waits_for_data() {
        let mut engine = PlaybackEngine::default();
        engine.set_total_frames(1500);
        engine.append_frames(0, frames(0, 1000)).unwrap();

        engine.seek_to(1200);
        assert_eq!(engine.current_index(), 1200);
        assert!(engine.current_frame().is_none());

        engine.append_frames(1000, frames(1000, 500)).unwrap();
        let frame = engine.current_frame().unwrap();
        assert!((frame.t - 1200.0 / 25.0).abs() < 1e-9);
        assert_eq!(frame.lap, 2);
    }

    #[test]
    fn test_playback_runs_over_loaded_prefix() {
        let mut engine = PlaybackEngine::default();
        engine.set_total_frames(1500);
        engine.append_frames(0, frames(0, 1000)).unwrap();
        engine.set_paused(false);
        engine.set_speed(4.0);

        engine.tick(30);
        assert!((engine.position() - 50.0).abs() < 1e-9);
        assert!(engine.current_frame().is_some());
    }

    #[test]
    fn test_selection_survives_ticks() {
        let mut engine = loaded_engine(1000);
        engine.select_driver(Some("ALO"));
        engine.set_paused(false);
        engine.tick(60);
        assert_eq!(engine.selected_driver(), Some("ALO"));
    }

    #[test]
    fn test_commands_go_through_bounds_checks() {
        let mut engine = loaded_engine(300);
        engine.apply(PlaybackCommand::StepBy(100));
        engine.apply(PlaybackCommand::StepBy(100));
        engine.apply(PlaybackCommand::StepBy(100));
        assert_eq!(engine.position(), 299.0);

        engine.apply(PlaybackCommand::SetSpeed(5.0));
        assert_eq!(engine.speed(), 1.0);

        engine.apply(PlaybackCommand::SelectDriver(Some("RUS".into())));
        engine.apply(PlaybackCommand::SelectDriver(Some("RUS".into())));
        assert_eq!(engine.selected_driver(), None);

        engine.apply(PlaybackCommand::SeekTo(0));
        assert_eq!(engine.position(), 0.0);
    }

    #[test]
    fn test_reset_from_any_state() {
        let mut engine = loaded_engine(1000);
        engine.set_speed(16.0);
        engine.set_paused(false);
        engine.tick(10);
        engine.select_driver(Some("NOR"));

        engine.reset();

        assert_eq!(engine.position(), 0.0);
        assert!(engine.is_paused());
        assert_eq!(engine.speed(), 1.0);
        assert_eq!(engine.selected_driver(), None);
    }
}
