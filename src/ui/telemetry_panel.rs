use imgui::{Condition, ProgressBar, StyleColor, Ui};

use crate::core::{DriverColors, DrsStatus, Frame};

/// Speed bar full scale, km/h
const MAX_SPEED_KMH: f64 = 350.0;

/// Live readout for the selected driver
pub struct TelemetryPanel;

impl TelemetryPanel {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        ui: &Ui,
        is_open: &mut bool,
        frame: Option<&Frame>,
        colors: &DriverColors,
        selected: Option<&str>,
    ) {
        ui.window("Driver Telemetry")
            .size([280.0, 300.0], Condition::FirstUseEver)
            .position([920.0, 560.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                let Some(code) = selected else {
                    ui.text_disabled("Select a driver on the leaderboard or track");
                    return;
                };
                let Some(driver) = frame.and_then(|f| f.driver(code)) else {
                    ui.text_disabled(format!("No data for {}", code));
                    return;
                };

                let color = colors.get(code).to_rgba(1.0);
                ui.text_colored(color, format!("Driver: {}", code));
                ui.same_line();
                ui.text(format!("P{}", driver.position));
                ui.separator();

                ui.text(format!("Speed: {:.0} km/h", driver.speed));
                ProgressBar::new(speed_fraction(driver.speed))
                    .overlay_text("")
                    .build(ui);

                ui.text(format!("Gear: {}", driver.gear));
                ui.text(format!("Lap: {}", driver.lap));

                let throttle = driver.throttle_percent();
                let brake = driver.brake_percent().clamp(0.0, 100.0);
                {
                    let _bar = ui.push_style_color(StyleColor::PlotHistogram, [0.3, 0.8, 0.4, 1.0]);
                    ProgressBar::new(pedal_fraction(throttle))
                        .overlay_text(format!("THR {:.0}%", throttle))
                        .build(ui);
                }
                {
                    let _bar = ui.push_style_color(StyleColor::PlotHistogram, [0.9, 0.2, 0.2, 1.0]);
                    ProgressBar::new(pedal_fraction(brake))
                        .overlay_text(format!("BRK {:.0}%", brake))
                        .build(ui);
                }

                let drs = driver.drs_status();
                let drs_color = match drs {
                    DrsStatus::Open => [0.3, 0.9, 0.4, 1.0],
                    DrsStatus::Available => [1.0, 0.85, 0.2, 1.0],
                    DrsStatus::Off => [0.6, 0.6, 0.6, 1.0],
                };
                ui.text("DRS:");
                ui.same_line();
                ui.text_colored(drs_color, drs.label());

                let tyre = driver.tyre_compound();
                ui.text("Tyre:");
                ui.same_line();
                ui.text_colored(tyre.color().to_rgba(1.0), tyre.name());
            });
    }
}

impl Default for TelemetryPanel {
    fn default() -> Self {
        Self::new()
    }
}

fn speed_fraction(speed: f64) -> f32 {
    (speed / MAX_SPEED_KMH).clamp(0.0, 1.0) as f32
}

/// Pedal percent as a progress bar fraction
fn pedal_fraction(percent: f64) -> f32 {
    (percent / 100.0).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_fraction_is_clamped() {
        assert_eq!(speed_fraction(0.0), 0.0);
        assert!((speed_fraction(175.0) - 0.5).abs() < 1e-6);
        assert_eq!(speed_fraction(400.0), 1.0);
        assert_eq!(speed_fraction(-5.0), 0.0);
    }

    #[test]
    fn test_pedal_fraction() {
        assert_eq!(pedal_fraction(0.0), 0.0);
        assert!((pedal_fraction(42.0) - 0.42).abs() < 1e-6);
        assert_eq!(pedal_fraction(104.0), 1.0);
    }
}
