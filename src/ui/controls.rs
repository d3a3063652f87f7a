use imgui::{Condition, ProgressBar, Ui};

use crate::core::format::format_time;
use crate::playback::{PlaybackCommand, SPEED_STEPS, STEP_FRAMES};
use crate::session::{LoadState, PlaybackSnapshot};

/// Playback controls bar
pub struct ControlsBar {
    speed_labels: Vec<String>,
}

impl ControlsBar {
    pub fn new() -> Self {
        Self {
            speed_labels: SPEED_STEPS.iter().map(|s| format!("{}x", s)).collect(),
        }
    }

    /// Render the bar; returns the commands issued this frame
    pub fn render(
        &self,
        ui: &Ui,
        is_open: &mut bool,
        snapshot: &PlaybackSnapshot,
        total_laps: u32,
    ) -> Vec<PlaybackCommand> {
        let mut commands = Vec::new();

        ui.window("Playback")
            .size([900.0, 130.0], Condition::FirstUseEver)
            .position([10.0, 680.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                // Timeline
                let last = snapshot.total_frames.saturating_sub(1) as f32;
                let mut position = snapshot.position as f32;
                ui.set_next_item_width(-1.0);
                let disabled = ui.begin_disabled(snapshot.total_frames == 0);
                if ui
                    .slider_config("##timeline", 0.0, last.max(1.0))
                    .display_format("")
                    .build(&mut position)
                {
                    commands.push(PlaybackCommand::SeekTo(position.round() as i64));
                }
                disabled.end();

                if ui.button("<<") {
                    commands.push(PlaybackCommand::StepBy(-STEP_FRAMES));
                }
                if ui.is_item_hovered() {
                    ui.tooltip_text("Step backward (Left)");
                }
                ui.same_line();
                let label = if snapshot.paused { "Play" } else { "Pause" };
                if ui.button_with_size(label, [60.0, 0.0]) {
                    commands.push(PlaybackCommand::TogglePause);
                }
                ui.same_line();
                if ui.button(">>") {
                    commands.push(PlaybackCommand::StepBy(STEP_FRAMES));
                }
                if ui.is_item_hovered() {
                    ui.tooltip_text("Step forward (Right)");
                }

                ui.same_line();
                ui.set_next_item_width(80.0);
                let mut speed_idx = speed_index(snapshot.speed);
                if ui.combo_simple_string("Speed", &mut speed_idx, self.speed_labels.as_slice()) {
                    if let Some(&speed) = SPEED_STEPS.get(speed_idx) {
                        commands.push(PlaybackCommand::SetSpeed(speed));
                    }
                }

                ui.same_line();
                ui.text(session_clock(snapshot, total_laps));

                ui.same_line();
                ui.text_disabled(frame_counter(snapshot));

                if let Some(weather) = snapshot.frame.as_ref().and_then(|f| f.weather.as_ref()) {
                    ui.same_line();
                    let temps = match (weather.track_temp, weather.air_temp) {
                        (Some(track), Some(air)) => format!("Track {:.0}°C  Air {:.0}°C", track, air),
                        (Some(track), None) => format!("Track {:.0}°C", track),
                        (None, Some(air)) => format!("Air {:.0}°C", air),
                        (None, None) => String::new(),
                    };
                    ui.text_disabled(temps);
                }

                match &snapshot.load_state {
                    LoadState::Loading => ui.text("Loading session..."),
                    LoadState::Streaming => {
                        ProgressBar::new(snapshot.loading_percent as f32 / 100.0)
                            .overlay_text(format!(
                                "Loading frames {} / {}",
                                snapshot.loaded_frames, snapshot.total_frames
                            ))
                            .build(ui);
                    }
                    LoadState::Halted(reason) => {
                        ui.text_colored(
                            [1.0, 0.7, 0.2, 1.0],
                            format!(
                                "Loading stopped at frame {}: {}",
                                snapshot.loaded_frames, reason
                            ),
                        );
                    }
                    LoadState::Failed(reason) => {
                        ui.text_colored([1.0, 0.3, 0.3, 1.0], format!("Failed to load session: {}", reason));
                    }
                    LoadState::Complete => {}
                }
            });

        commands
    }
}

impl Default for ControlsBar {
    fn default() -> Self {
        Self::new()
    }
}

/// Index of the speed step closest to `speed`
fn speed_index(speed: f64) -> usize {
    SPEED_STEPS
        .iter()
        .enumerate()
        .min_by(|a, b| (a.1 - speed).abs().total_cmp(&(b.1 - speed).abs()))
        .map(|(i, _)| i)
        .unwrap_or(2)
}

/// `MM:SS  Lap n / total`, lap part omitted while unknown
/// Frame counter, noting how much is loaded until the store is complete
fn frame_counter(snapshot: &PlaybackSnapshot) -> String {
    if snapshot.complete {
        format!("Frame: {} / {}", snapshot.frame_index, snapshot.total_frames)
    } else {
        format!(
            "Frame: {} / {} ({} loaded)",
            snapshot.frame_index, snapshot.total_frames, snapshot.loaded_frames
        )
    }
}

fn session_clock(snapshot: &PlaybackSnapshot, total_laps: u32) -> String {
    match &snapshot.frame {
        Some(frame) if total_laps > 0 => {
            format!("{}  Lap {} / {}", format_time(frame.t), frame.lap, total_laps)
        }
        Some(frame) => format_time(frame.t),
        None => "--:--".to_string(),
    }
}
