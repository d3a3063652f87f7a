use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::core::{DriverColors, Frame, SessionId, TrackGeometry, TrackStatus};

/// Result type for telemetry source operations
pub type SourceResult<T> = Result<T, SourceError>;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("source returned no frames at {start} of {total}")]
    EmptyPage { start: usize, total: usize },

    #[error("{0}")]
    Unavailable(String),
}

/// One page request against the telemetry endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub start_frame: usize,
    pub frame_count: usize,
    /// Ask the backend to recompute instead of serving its cache
    pub force_refresh: bool,
}

/// One page of session telemetry plus the session-wide metadata
/// the backend repeats on every page
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryPage {
    pub frames: Vec<Frame>,
    pub total_frames: usize,
    pub start_frame: usize,
    pub has_more: bool,
    #[serde(default)]
    pub driver_colors: DriverColors,
    #[serde(default)]
    pub total_laps: u32,
    #[serde(default)]
    pub track_statuses: Vec<TrackStatus>,
}

/// Trait for telemetry data providers
///
/// Implementations:
/// - HTTP backend serving precomputed session data
/// - Synthetic in-memory session for tests and demo mode
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    /// Get the name/identifier of this source
    fn name(&self) -> &str;

    /// Fetch a page of frames for a session
    async fn fetch_telemetry(
        &self,
        session: SessionId,
        request: PageRequest,
    ) -> SourceResult<TelemetryPage>;

    /// Fetch the track outline for a session
    async fn fetch_track(&self, session: SessionId) -> SourceResult<TrackGeometry>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_page() {
        let json = r#"{
            "frames": [{"t": 0.0, "lap": 1, "drivers": {}}],
            "track_statuses": [{"status": "1", "start_time": 0.0}],
            "driver_colors": {"VER": [30, 65, 255]},
            "total_laps": 57,
            "total_frames": 140000,
            "start_frame": 0,
            "end_frame": 1,
            "has_more": true
        }"#;

        let page: TelemetryPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.frames.len(), 1);
        assert_eq!(page.total_frames, 140_000);
        assert!(page.has_more);
        assert_eq!(page.total_laps, 57);
        assert_eq!(page.track_statuses[0].end_time, None);
        assert_eq!(page.driver_colors.get("VER"), crate::core::Rgb::new(30, 65, 255));
    }
}
