//! Track map with the field drawn on top

use imgui::{Condition, MouseButton, Ui};

use crate::core::{DriverColors, Frame, TrackBounds, TrackFit, TrackGeometry, TrackStatus};
use crate::session::PlaybackSnapshot;

const PADDING: f32 = 50.0;
const CAR_RADIUS: f32 = 6.0;
const SELECTED_RADIUS: f32 = 8.0;
const PICK_RADIUS: f32 = 12.0;

const TRACK_EDGE: [f32; 4] = [0.29, 0.33, 0.41, 1.0];
const BACKGROUND: [f32; 4] = [0.09, 0.1, 0.13, 1.0];

/// Track view window
pub struct TrackView {
    show_labels: bool,
}

impl TrackView {
    pub fn new() -> Self {
        Self { show_labels: true }
    }

    /// Render the window; returns the driver clicked on, if any
    pub fn render(
        &mut self,
        ui: &Ui,
        is_open: &mut bool,
        snapshot: &PlaybackSnapshot,
        track: Option<&TrackGeometry>,
        colors: &DriverColors,
        status: Option<&TrackStatus>,
    ) -> Option<String> {
        let mut clicked = None;

        ui.window("Track")
            .size([900.0, 640.0], Condition::FirstUseEver)
            .position([10.0, 30.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                ui.checkbox("Labels", &mut self.show_labels);
                if let Some(status) = status {
                    ui.same_line();
                    ui.text_colored(status.color().to_rgba(1.0), status.label());
                }

                let size = ui.content_region_avail();
                if size[0] < 10.0 || size[1] < 10.0 {
                    return;
                }
                let origin = ui.cursor_screen_pos();
                let draw_list = ui.get_window_draw_list();

                draw_list
                    .add_rect(origin, [origin[0] + size[0], origin[1] + size[1]], BACKGROUND)
                    .filled(true)
                    .rounding(6.0)
                    .build();

                // Cars are still drawn when the outline failed to load
                let fit = match track {
                    Some(track) => {
                        let fit = track.bounds.fit(size[0], size[1], PADDING);
                        for outline in [&track.outer, &track.inner] {
                            let points: Vec<[f32; 2]> = outline
                                .iter()
                                .map(|&[x, y]| offset(fit.apply(x, y), origin))
                                .collect();
                            draw_list.add_polyline(points, TRACK_EDGE).thickness(3.0).build();
                        }
                        fit
                    }
                    None => {
                        ui.text_disabled("Track outline unavailable");
                        match snapshot.frame.as_deref().and_then(field_bounds) {
                            Some(bounds) => bounds.fit(size[0], size[1], PADDING),
                            None => {
                                ui.dummy(size);
                                return;
                            }
                        }
                    }
                };

                let Some(frame) = snapshot.frame.as_deref() else {
                    ui.set_cursor_screen_pos(origin);
                    ui.dummy(size);
                    return;
                };

                let cars = car_positions(frame, &fit, origin);
                let selected = snapshot.selected.as_deref();

                for (code, pos) in &cars {
                    let color = colors.get(code);
                    let is_selected = selected == Some(code.as_str());
                    let alpha = if selected.is_some() && !is_selected { 0.5 } else { 1.0 };
                    let radius = if is_selected { SELECTED_RADIUS } else { CAR_RADIUS };

                    draw_list
                        .add_circle(*pos, radius, color.to_rgba(alpha))
                        .filled(true)
                        .num_segments(16)
                        .build();
                    if is_selected {
                        draw_list
                            .add_circle(*pos, radius, [1.0, 1.0, 1.0, 1.0])
                            .thickness(2.0)
                            .num_segments(16)
                            .build();
                    }
                }

                // Labels go on top of every car
                if self.show_labels {
                    for (code, pos) in &cars {
                        if selected.map_or(true, |s| s == code) {
                            draw_list.add_text([pos[0] + 10.0, pos[1] - 5.0], [1.0, 1.0, 1.0, 1.0], code);
                        }
                    }
                }

                ui.set_cursor_screen_pos(origin);
                let _ = ui.invisible_button("##track_canvas", size);
                if ui.is_item_hovered() {
                    let mouse = ui.io().mouse_pos;
                    if let Some(code) = pick_car(&cars, mouse, PICK_RADIUS) {
                        ui.tooltip_text(code);
                        if ui.is_mouse_clicked(MouseButton::Left) {
                            clicked = Some(code.to_string());
                        }
                    }
                }
            });

        clicked
    }
}

impl Default for TrackView {
    fn default() -> Self {
        Self::new()
    }
}

fn offset(p: [f32; 2], origin: [f32; 2]) -> [f32; 2] {
    [p[0] + origin[0], p[1] + origin[1]]
}

/// Screen position of every car, sorted by code for a stable draw order
fn car_positions(frame: &Frame, fit: &TrackFit, origin: [f32; 2]) -> Vec<(String, [f32; 2])> {
    let mut cars: Vec<(String, [f32; 2])> = frame
        .drivers
        .iter()
        .map(|(code, d)| (code.clone(), offset(fit.apply(d.x, d.y), origin)))
        .collect();
    cars.sort_by(|a, b| a.0.cmp(&b.0));
    cars
}

/// Bounding box of the field, used when there is no outline to fit
fn field_bounds(frame: &Frame) -> Option<TrackBounds> {
    let mut drivers = frame.drivers.values();
    let first = drivers.next()?;
    let init = TrackBounds {
        x_min: first.x,
        x_max: first.x,
        y_min: first.y,
        y_max: first.y,
    };
    Some(drivers.fold(init, |b, d| TrackBounds {
        x_min: b.x_min.min(d.x),
        x_max: b.x_max.max(d.x),
        y_min: b.y_min.min(d.y),
        y_max: b.y_max.max(d.y),
    }))
}

/// Closest car within `radius` of `mouse`
fn pick_car<'a>(cars: &'a [(String, [f32; 2])], mouse: [f32; 2], radius: f32) -> Option<&'a str> {
    cars.iter()
        .map(|(code, p)| {
            let dx = p[0] - mouse[0];
            let dy = p[1] - mouse[1];
            (code.as_str(), dx * dx + dy * dy)
        })
        .filter(|(_, d2)| *d2 <= radius * radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(code, _)| code)
}
