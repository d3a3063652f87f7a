use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::SessionId;
use crate::playback::EndBehavior;

pub const APP_DIR: &str = "race-replay";
pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const API_URL_ENV: &str = "RACE_REPLAY_API_URL";

/// Persistent application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_url: String,
    /// Per-request timeout in seconds; the backend can take minutes on a cold session
    pub request_timeout_secs: u64,
    pub end_behavior: EndBehavior,
    pub show_track: bool,
    pub show_leaderboard: bool,
    pub show_telemetry: bool,
    pub show_controls: bool,
    pub show_shortcuts: bool,
    /// Session opened most recently, as `year/round/type`
    pub last_session: Option<String>,
    pub last_opened: Option<DateTime<Utc>>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            request_timeout_secs: 300,
            end_behavior: EndBehavior::Hold,
            show_track: true,
            show_leaderboard: true,
            show_telemetry: true,
            show_controls: true,
            show_shortcuts: false,
            last_session: None,
            last_opened: None,
        }
    }
}

impl AppSettings {
    /// Directory holding settings and the imgui layout
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join(APP_DIR))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("settings.json"))
    }

    pub fn layout_path() -> Option<PathBuf> {
        Self::config_dir().map(|p| p.join("layout.ini"))
    }

    /// Load settings, falling back to defaults, then apply env overrides
    pub fn load() -> Self {
        let mut settings = match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path).unwrap_or_else(|e| {
                warn!("Ignoring settings file: {:#}", e);
                Self::default()
            }),
            _ => Self::default(),
        };
        settings.apply_env(std::env::var(API_URL_ENV).ok());
        settings
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let settings = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(settings)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().context("No config directory on this platform")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!("Saved settings to {}", path.display());
        Ok(())
    }

    fn apply_env(&mut self, api_url: Option<String>) {
        if let Some(url) = api_url.filter(|u| !u.trim().is_empty()) {
            self.api_url = url.trim().to_string();
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Record `session` as the last one opened
    pub fn remember_session(&mut self, session: SessionId) {
        self.last_session = Some(session.to_string());
        self.last_opened = Some(Utc::now());
    }

    /// Last opened session, if it still parses
    pub fn last_session(&self) -> Option<SessionId> {
        self.last_session.as_deref().and_then(|s| s.parse().ok())
    }
}
