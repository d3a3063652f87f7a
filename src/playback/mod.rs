pub mod clock;
pub mod engine;
pub mod selection;
pub mod store;
pub mod ticker;

pub use clock::PlaybackClock;
pub use engine::{PlaybackCommand, PlaybackEngine};
pub use selection::Selection;
pub use store::{FrameStore, StoreError};
pub use ticker::Ticker;

use serde::{Deserialize, Serialize};

/// Sampling rate of the telemetry source, frames per second
pub const NOMINAL_FRAME_RATE: f64 = 25.0;

/// Rate of the playback scheduler, ticks per second
pub const TICK_RATE: f64 = 60.0;

/// Speeds offered by the speed selector
pub const SPEED_STEPS: [f64; 7] = [0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0];

pub const MIN_SPEED: f64 = 0.25;
pub const MAX_SPEED: f64 = 16.0;

/// Frames skipped by the step buttons and arrow keys
pub const STEP_FRAMES: i64 = 100;

/// What the clock does on reaching the last frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndBehavior {
    /// Sit on the last frame, still "playing"
    #[default]
    Hold,
    /// Pause on the last frame
    Pause,
}
