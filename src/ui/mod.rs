pub mod controls;
pub mod leaderboard;
pub mod session_picker;
pub mod shortcuts;
pub mod telemetry_panel;
pub mod track_view;

pub use controls::ControlsBar;
pub use leaderboard::LeaderboardWindow;
pub use session_picker::{OpenRequest, SessionPicker};
pub use shortcuts::{ShortcutAction, ShortcutManager};
pub use telemetry_panel::TelemetryPanel;
pub use track_view::TrackView;
