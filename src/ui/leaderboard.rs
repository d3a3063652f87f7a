use imgui::{Condition, Ui};

use crate::core::{DriverColors, Frame, TyreCompound};

/// Running order, click a row to select that driver
pub struct LeaderboardWindow;

impl LeaderboardWindow {
    pub fn new() -> Self {
        Self
    }

    /// Returns the driver whose row was clicked
    pub fn render(
        &self,
        ui: &Ui,
        is_open: &mut bool,
        frame: Option<&Frame>,
        colors: &DriverColors,
        selected: Option<&str>,
    ) -> Option<String> {
        let mut clicked = None;

        ui.window("Leaderboard")
            .size([240.0, 520.0], Condition::FirstUseEver)
            .position([920.0, 30.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                let Some(frame) = frame else {
                    ui.text_disabled("Waiting for data...");
                    return;
                };

                ui.text_colored([0.6, 0.6, 0.6, 1.0], "POS  DRIVER        TYRE");
                ui.separator();

                for (code, driver) in frame.standings() {
                    let color = colors.get(code);
                    let is_selected = selected == Some(code);

                    // Team color stripe
                    let pos = ui.cursor_screen_pos();
                    let line_height = ui.text_line_height();
                    ui.get_window_draw_list()
                        .add_rect([pos[0] + 34.0, pos[1]], [pos[0] + 37.0, pos[1] + line_height], color.to_rgba(1.0))
                        .filled(true)
                        .build();

                    let label = format!("{:>3}     {}##{}", driver.position, code, code);
                    if ui
                        .selectable_config(&label)
                        .selected(is_selected)
                        .build()
                    {
                        clicked = Some(code.to_string());
                    }

                    ui.same_line_with_pos(ui.window_size()[0] - 40.0);
                    tyre_badge(ui, driver.tyre_compound());
                }
            });

        clicked
    }
}

impl Default for LeaderboardWindow {
    fn default() -> Self {
        Self::new()
    }
}

fn tyre_badge(ui: &Ui, compound: TyreCompound) {
    let pos = ui.cursor_screen_pos();
    let size = ui.text_line_height();
    let draw_list = ui.get_window_draw_list();
    draw_list
        .add_rect(pos, [pos[0] + size + 4.0, pos[1] + size], compound.color().to_rgba(1.0))
        .filled(true)
        .rounding(2.0)
        .build();

    // dark text on light compounds
    let text_color = match compound {
        TyreCompound::Medium | TyreCompound::Hard | TyreCompound::Intermediate => [0.0, 0.0, 0.0, 1.0],
        _ => [1.0, 1.0, 1.0, 1.0],
    };
    draw_list.add_text([pos[0] + 3.0, pos[1]], text_color, compound.badge());
    ui.dummy([size + 4.0, size]);
    if ui.is_item_hovered() {
        ui.tooltip_text(compound.name());
    }
}
