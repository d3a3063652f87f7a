use imgui::{Condition, Ui};
use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use crate::playback::{PlaybackCommand, STEP_FRAMES};

/// Keyboard shortcut manager
pub struct ShortcutManager {
    shortcuts: Vec<Shortcut>,
}

#[derive(Clone)]
pub struct Shortcut {
    pub key: KeyCode,
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub action: ShortcutAction,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShortcutAction {
    TogglePause,
    StepBackward,
    StepForward,
    SpeedUp,
    SpeedDown,
    Restart,
    ClearSelection,
    ShowHelp,
}

impl ShortcutAction {
    /// Playback command for this action, `None` for UI-only actions
    pub fn command(&self) -> Option<PlaybackCommand> {
        match self {
            ShortcutAction::TogglePause => Some(PlaybackCommand::TogglePause),
            ShortcutAction::StepBackward => Some(PlaybackCommand::StepBy(-STEP_FRAMES)),
            ShortcutAction::StepForward => Some(PlaybackCommand::StepBy(STEP_FRAMES)),
            ShortcutAction::SpeedUp => Some(PlaybackCommand::SpeedUp),
            ShortcutAction::SpeedDown => Some(PlaybackCommand::SpeedDown),
            ShortcutAction::Restart => Some(PlaybackCommand::SeekTo(0)),
            ShortcutAction::ClearSelection => Some(PlaybackCommand::SelectDriver(None)),
            ShortcutAction::ShowHelp => None,
        }
    }
}

impl ShortcutManager {
    pub fn new() -> Self {
        let mut manager = Self {
            shortcuts: Vec::new(),
        };
        manager.register_defaults();
        manager
    }

    fn register_defaults(&mut self) {
        use ShortcutAction::*;

        // Playback
        self.register(KeyCode::Space, false, TogglePause, "Play/Pause");
        self.register(KeyCode::KeyK, false, TogglePause, "Play/Pause");
        self.register(KeyCode::ArrowLeft, false, StepBackward, "Back 100 frames");
        self.register(KeyCode::ArrowRight, false, StepForward, "Forward 100 frames");
        self.register(KeyCode::ArrowUp, false, SpeedUp, "Double speed");
        self.register(KeyCode::ArrowDown, false, SpeedDown, "Halve speed");
        self.register(KeyCode::Digit0, false, Restart, "Back to start");
        self.register(KeyCode::Numpad0, false, Restart, "Back to start");

        // General
        self.register(KeyCode::Escape, false, ClearSelection, "Clear driver selection");
        self.register(KeyCode::Slash, true, ShowHelp, "Keyboard shortcuts");
        self.register(KeyCode::F1, false, ShowHelp, "Keyboard shortcuts");
    }

    fn register(&mut self, key: KeyCode, shift: bool, action: ShortcutAction, description: &'static str) {
        self.shortcuts.push(Shortcut {
            key,
            ctrl: false,
            shift,
            alt: false,
            action,
            description,
        });
    }

    /// Find the action bound to a key and modifier combination
    pub fn lookup(&self, key: KeyCode, ctrl: bool, shift: bool, alt: bool) -> Option<ShortcutAction> {
        self.shortcuts
            .iter()
            .find(|s| s.key == key && s.ctrl == ctrl && s.shift == shift && s.alt == alt)
            .map(|s| s.action)
    }

    /// Process a key event and return the matching action (if any)
    pub fn process_event(&self, event: &KeyEvent, ctrl: bool, shift: bool, alt: bool) -> Option<ShortcutAction> {
        if event.state != ElementState::Pressed {
            return None;
        }

        match event.physical_key {
            PhysicalKey::Code(code) => self.lookup(code, ctrl, shift, alt),
            _ => None,
        }
    }

    /// Render a shortcuts help window
    pub fn render_help(&self, ui: &Ui, is_open: &mut bool) {
        ui.window("Keyboard Shortcuts")
            .size([340.0, 320.0], Condition::FirstUseEver)
            .position([500.0, 200.0], Condition::FirstUseEver)
            .opened(is_open)
            .build(|| {
                let mut current_category = "";

                for shortcut in &self.shortcuts {
                    let category = match shortcut.action.command() {
                        Some(PlaybackCommand::SelectDriver(_)) | None => "General",
                        Some(_) => "Playback",
                    };

                    if category != current_category {
                        if !current_category.is_empty() {
                            ui.separator();
                        }
                        ui.text(category);
                        current_category = category;
                    }

                    let mut shortcut_str = String::new();
                    if shortcut.ctrl {
                        shortcut_str.push_str("Ctrl+");
                    }
                    if shortcut.alt {
                        shortcut_str.push_str("Alt+");
                    }
                    shortcut_str.push_str(&key_to_string(shortcut.key, shortcut.shift));

                    ui.text(format!("  {:12} - {}", shortcut_str, shortcut.description));
                }
            });
    }
}

fn key_to_string(key: KeyCode, shift: bool) -> String {
    match (key, shift) {
        (KeyCode::Slash, true) => "?".to_string(),
        (KeyCode::Space, _) => "Space".to_string(),
        (KeyCode::Escape, _) => "Esc".to_string(),
        (KeyCode::ArrowLeft, _) => "←".to_string(),
        (KeyCode::ArrowRight, _) => "→".to_string(),
        (KeyCode::ArrowUp, _) => "↑".to_string(),
        (KeyCode::ArrowDown, _) => "↓".to_string(),
        (KeyCode::Digit0, _) => "0".to_string(),
        (KeyCode::Numpad0, _) => "Num 0".to_string(),
        (KeyCode::KeyK, _) => "K".to_string(),
        (code, true) => format!("Shift+{:?}", code),
        (code, false) => format!("{:?}", code),
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playback_keys() {
        let shortcuts = ShortcutManager::new();
        let press = |key| shortcuts.lookup(key, false, false, false);

        assert_eq!(press(KeyCode::Space), Some(ShortcutAction::TogglePause));
        assert_eq!(press(KeyCode::KeyK), Some(ShortcutAction::TogglePause));
        assert_eq!(press(KeyCode::ArrowLeft), Some(ShortcutAction::StepBackward));
        assert_eq!(press(KeyCode::ArrowRight), Some(ShortcutAction::StepForward));
        assert_eq!(press(KeyCode::ArrowUp), Some(ShortcutAction::SpeedUp));
        assert_eq!(press(KeyCode::ArrowDown), Some(ShortcutAction::SpeedDown));
        assert_eq!(press(KeyCode::Digit0), Some(ShortcutAction::Restart));
        assert_eq!(press(KeyCode::Numpad0), Some(ShortcutAction::Restart));
        assert_eq!(press(KeyCode::Escape), Some(ShortcutAction::ClearSelection));
        assert_eq!(press(KeyCode::F1), Some(ShortcutAction::ShowHelp));
        assert_eq!(press(KeyCode::KeyQ), None);
    }

    #[test]
    fn test_modifiers_must_match() {
        let shortcuts = ShortcutManager::new();
        assert_eq!(
            shortcuts.lookup(KeyCode::Slash, false, true, false),
            Some(ShortcutAction::ShowHelp)
        );
        assert_eq!(shortcuts.lookup(KeyCode::Slash, false, false, false), None);
        assert_eq!(shortcuts.lookup(KeyCode::Space, true, false, false), None);
    }

    #[test]
    fn test_actions_map_to_commands() {
        assert_eq!(
            ShortcutAction::StepBackward.command(),
            Some(PlaybackCommand::StepBy(-100))
        );
        assert_eq!(ShortcutAction::Restart.command(), Some(PlaybackCommand::SeekTo(0)));
        assert_eq!(
            ShortcutAction::ClearSelection.command(),
            Some(PlaybackCommand::SelectDriver(None))
        );
        assert!(ShortcutAction::ShowHelp.command().is_none());
    }
}
