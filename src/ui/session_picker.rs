use chrono::{DateTime, Local, Utc};
use imgui::{Condition, Ui};

use crate::core::{SessionId, SessionType};

pub const MIN_YEAR: i32 = 2018;
pub const MAX_YEAR: i32 = 2030;
pub const MAX_ROUND: i32 = 24;

/// Request to open a session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenRequest {
    pub session: SessionId,
    pub force_refresh: bool,
}

/// Session picker dialog
pub struct SessionPicker {
    show: bool,
    year: i32,
    round: i32,
    type_index: usize,
    force_refresh: bool,
}

impl SessionPicker {
    pub fn new(initial: Option<SessionId>) -> Self {
        let mut picker = Self {
            show: initial.is_none(),
            year: 2024,
            round: 1,
            type_index: 0,
            force_refresh: false,
        };
        if let Some(session) = initial {
            picker.set_session(session);
        }
        picker
    }

    pub fn show(&mut self) {
        self.show = true;
    }

    /// Prefill the inputs with `session`
    pub fn set_session(&mut self, session: SessionId) {
        self.year = session.year as i32;
        self.round = session.round as i32;
        self.type_index = SessionType::ALL
            .iter()
            .position(|t| *t == session.session_type)
            .unwrap_or(0);
    }

    /// Session described by the current inputs, clamped to valid values
    pub fn current(&self) -> SessionId {
        let session_type = SessionType::ALL
            .get(self.type_index)
            .copied()
            .unwrap_or(SessionType::Race);
        SessionId::new(
            self.year.clamp(MIN_YEAR, MAX_YEAR) as u16,
            self.round.clamp(1, MAX_ROUND) as u8,
            session_type,
        )
    }

    pub fn render(&mut self, ui: &Ui, last_opened: Option<DateTime<Utc>>) -> Option<OpenRequest> {
        if !self.show {
            return None;
        }

        let mut result = None;
        let mut show = self.show;

        ui.window("Open Session")
            .size([320.0, 230.0], Condition::FirstUseEver)
            .position([400.0, 200.0], Condition::FirstUseEver)
            .opened(&mut show)
            .build(|| {
                ui.input_int("Year", &mut self.year).build();
                ui.input_int("Round", &mut self.round).build();
                self.year = self.year.clamp(MIN_YEAR, MAX_YEAR);
                self.round = self.round.clamp(1, MAX_ROUND);

                let names: Vec<&str> = SessionType::ALL.iter().map(|t| t.display_name()).collect();
                ui.combo_simple_string("Session", &mut self.type_index, names.as_slice());

                ui.checkbox("Force refresh", &mut self.force_refresh);
                if ui.is_item_hovered() {
                    ui.tooltip_text("Ask the backend to recompute the session");
                }

                ui.separator();
                if ui.button("Load Session") {
                    result = Some(OpenRequest {
                        session: self.current(),
                        force_refresh: self.force_refresh,
                    });
                }
                ui.same_line();
                if ui.button("Cancel") {
                    self.show = false;
                }

                if let Some(opened) = last_opened {
                    ui.text_disabled(format!(
                        "Last opened {}",
                        opened.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                    ));
                }
                ui.text_disabled("First load may take a while");
            });

        if result.is_some() || !show {
            self.show = false;
            self.force_refresh = false;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_round_trip() {
        let session = SessionId::new(2023, 21, SessionType::SprintQualifying);
        let picker = SessionPicker::new(Some(session));
        assert_eq!(picker.current(), session);
        assert!(!picker.show);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let mut picker = SessionPicker::new(None);
        assert!(picker.show);
        picker.year = 1950;
        picker.round = 40;
        picker.type_index = 99;

        let session = picker.current();
        assert_eq!(session.year, MIN_YEAR as u16);
        assert_eq!(session.round, MAX_ROUND as u8);
        assert_eq!(session.session_type, SessionType::Race);
    }
}
