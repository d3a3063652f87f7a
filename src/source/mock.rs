use async_trait::async_trait;
use std::collections::HashMap;
use std::f64::consts::TAU;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::{
    DriverColors, DriverTelemetry, Frame, Rgb, SessionId, TrackBounds, TrackGeometry, TrackStatus,
    Weather,
};
use crate::playback::NOMINAL_FRAME_RATE;
use crate::source::{PageRequest, SourceError, SourceResult, TelemetryPage, TelemetrySource};

const TRACK_RADIUS: f64 = 1000.0;
const TRACK_HALF_WIDTH: f64 = 40.0;
const OUTLINE_POINTS: usize = 120;
const BASE_LAP_TIME: f64 = 90.0;

const DEFAULT_DRIVERS: &[(&str, Rgb)] = &[
    ("VER", Rgb::new(54, 113, 198)),
    ("NOR", Rgb::new(255, 128, 0)),
    ("LEC", Rgb::new(232, 0, 45)),
    ("HAM", Rgb::new(39, 244, 210)),
    ("ALO", Rgb::new(34, 153, 113)),
    ("GAS", Rgb::new(255, 135, 188)),
];

/// Synthetic telemetry source for testing without a backend
///
/// Drivers lap a circular track at slightly different paces, sampled at the
/// nominal frame rate. Failures can be injected for the initial page or for
/// the page starting at a given frame.
pub struct MockSource {
    name: String,
    total_frames: usize,
    drivers: Vec<(String, Rgb)>,
    latency: Duration,
    track_latency: Option<Duration>,
    ends_at: Option<usize>,
    fail_initial: bool,
    fail_at: Option<usize>,
    requests: Mutex<Vec<PageRequest>>,
}

impl MockSource {
    /// Create a mock session with `total_frames` frames and the default grid
    pub fn new(total_frames: usize) -> Self {
        Self {
            name: "mock".to_string(),
            total_frames,
            drivers: DEFAULT_DRIVERS
                .iter()
                .map(|(code, color)| (code.to_string(), *color))
                .collect(),
            latency: Duration::ZERO,
            track_latency: None,
            ends_at: None,
            fail_initial: false,
            fail_at: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Delay every request, to mimic a slow backend
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Delay only the track request
    #[cfg(test)]
    pub fn with_track_latency(mut self, latency: Duration) -> Self {
        self.track_latency = Some(latency);
        self
    }

    /// Stop serving frames at `frame` while still reporting the full total
    #[cfg(test)]
    pub fn end_early_at(mut self, frame: usize) -> Self {
        self.ends_at = Some(frame);
        self
    }

    /// Fail the first telemetry page
    #[cfg(test)]
    pub fn fail_initial(mut self) -> Self {
        self.fail_initial = true;
        self
    }

    /// Fail the page that starts at `start_frame`
    #[cfg(test)]
    pub fn fail_at(mut self, start_frame: usize) -> Self {
        self.fail_at = Some(start_frame);
        self
    }

    /// Get all telemetry requests received so far (for verification)
    #[cfg(test)]
    pub fn take_requests(&self) -> Vec<PageRequest> {
        match self.requests.lock() {
            Ok(mut requests) => requests.drain(..).collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn total_laps(&self) -> u32 {
        let duration = self.total_frames as f64 / NOMINAL_FRAME_RATE;
        (duration / BASE_LAP_TIME).ceil() as u32
    }

    /// Generate the frame at `index`
    pub fn frame(&self, index: usize) -> Frame {
        let t = index as f64 / NOMINAL_FRAME_RATE;
        let lap_length = TAU * TRACK_RADIUS;

        let mut drivers: HashMap<String, DriverTelemetry> = HashMap::new();
        let mut order: Vec<(String, f64)> = Vec::new();

        for (i, (code, _)) in self.drivers.iter().enumerate() {
            let lap_time = BASE_LAP_TIME + i as f64 * 0.4;
            // staggered grid: each car starts a little behind the one ahead
            let laps = t / lap_time - i as f64 * 0.005;
            let rel_dist = laps.rem_euclid(1.0);
            let angle = rel_dist * TAU;
            let wobble = (angle * 3.0).sin();

            let speed = lap_length / lap_time * 3.6 + wobble * 40.0;
            let braking = wobble < -0.6;

            let telemetry = DriverTelemetry {
                x: TRACK_RADIUS * angle.cos(),
                y: TRACK_RADIUS * angle.sin(),
                dist: laps * lap_length,
                rel_dist,
                lap: (laps.floor() as i64 + 1).max(1) as u32,
                tyre: (i % 3) as i32,
                position: 0,
                speed,
                gear: (speed / 45.0).clamp(1.0, 8.0) as i32,
                drs: if wobble > 0.8 { 12 } else if wobble > 0.5 { 8 } else { 0 },
                throttle: if braking { 0.0 } else { 100.0 },
                // the backend reports brake as 0/1 for most sessions
                brake: if braking { 1.0 } else { 0.0 },
            };

            order.push((code.clone(), telemetry.dist));
            drivers.insert(code.clone(), telemetry);
        }

        order.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (rank, (code, _)) in order.iter().enumerate() {
            if let Some(driver) = drivers.get_mut(code) {
                driver.position = rank as u32 + 1;
            }
        }

        let leader_lap = order
            .first()
            .and_then(|(code, _)| drivers.get(code))
            .map(|d| d.lap)
            .unwrap_or(1);

        Frame {
            t,
            lap: leader_lap,
            drivers,
            weather: Some(Weather {
                track_temp: Some(38.0),
                air_temp: Some(24.0),
                humidity: Some(45.0),
                wind_speed: Some(1.2),
                wind_direction: Some(210.0),
                rain_state: Some("DRY".to_string()),
            }),
        }
    }

    fn driver_colors(&self) -> DriverColors {
        let mut colors = DriverColors::default();
        for (code, color) in &self.drivers {
            colors.insert(code, *color);
        }
        colors
    }

    fn outline(radius: f64) -> Vec<[f64; 2]> {
        (0..=OUTLINE_POINTS)
            .map(|i| {
                let angle = i as f64 / OUTLINE_POINTS as f64 * TAU;
                [radius * angle.cos(), radius * angle.sin()]
            })
            .collect()
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl TelemetrySource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_telemetry(
        &self,
        _session: SessionId,
        request: PageRequest,
    ) -> SourceResult<TelemetryPage> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.simulate_latency().await;

        let is_initial = request.start_frame == 0;
        if (is_initial && self.fail_initial) || self.fail_at == Some(request.start_frame) {
            return Err(SourceError::Unavailable(format!(
                "injected failure at frame {}",
                request.start_frame
            )));
        }

        let available = self.ends_at.unwrap_or(self.total_frames).min(self.total_frames);
        let start = request.start_frame.min(available);
        let end = (start + request.frame_count).min(available);

        Ok(TelemetryPage {
            frames: (start..end).map(|i| self.frame(i)).collect(),
            total_frames: self.total_frames,
            start_frame: start,
            has_more: end < available,
            driver_colors: self.driver_colors(),
            total_laps: self.total_laps(),
            track_statuses: vec![TrackStatus {
                status: "1".to_string(),
                start_time: 0.0,
                end_time: None,
            }],
        })
    }

    async fn fetch_track(&self, _session: SessionId) -> SourceResult<TrackGeometry> {
        match self.track_latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => self.simulate_latency().await,
        }

        let outer = TRACK_RADIUS + TRACK_HALF_WIDTH;
        Ok(TrackGeometry {
            inner: Self::outline(TRACK_RADIUS - TRACK_HALF_WIDTH),
            outer: Self::outline(outer),
            rotation: 0.0,
            bounds: TrackBounds {
                x_min: -outer,
                x_max: outer,
                y_min: -outer,
                y_max: outer,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SessionType;

    fn session() -> SessionId {
        SessionId::new(2024, 1, SessionType::Race)
    }

    fn request(start_frame: usize, frame_count: usize) -> PageRequest {
        PageRequest {
            start_frame,
            frame_count,
            force_refresh: false,
        }
    }

    #[tokio::test]
    async fn test_pages_slice_the_session() {
        let source = MockSource::new(2500);

        let page = source.fetch_telemetry(session(), request(0, 1000)).await.unwrap();
        assert_eq!(page.frames.len(), 1000);
        assert_eq!(page.start_frame, 0);
        assert!(page.has_more);

        let page = source.fetch_telemetry(session(), request(1000, 5000)).await.unwrap();
        assert_eq!(page.frames.len(), 1500);
        assert_eq!(page.start_frame, 1000);
        assert!(!page.has_more);

        assert_eq!(source.take_requests().len(), 2);
        assert!(source.take_requests().is_empty());
    }

    #[tokio::test]
    async fn test_injected_failures() {
        let source = MockSource::new(10_000).fail_at(1000);
        assert!(source.fetch_telemetry(session(), request(0, 1000)).await.is_ok());
        assert!(source.fetch_telemetry(session(), request(1000, 5000)).await.is_err());

        let source = MockSource::new(10_000).fail_initial();
        assert!(source.fetch_telemetry(session(), request(0, 1000)).await.is_err());
    }

    #[test]
    fn test_frames_rank_every_driver() {
        let source = MockSource::new(100_000);
        let frame = source.frame(25 * 60);

        assert_eq!(frame.drivers.len(), DEFAULT_DRIVERS.len());
        let mut positions: Vec<u32> = frame.drivers.values().map(|d| d.position).collect();
        positions.sort();
        assert_eq!(positions, (1..=DEFAULT_DRIVERS.len() as u32).collect::<Vec<_>>());
        assert!((frame.t - 60.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_track_fits_bounds() {
        let track = MockSource::new(10).fetch_track(session()).await.unwrap();
        assert_eq!(track.inner.len(), OUTLINE_POINTS + 1);
        for [x, y] in track.outer {
            assert!(x >= track.bounds.x_min - 1e-9 && x <= track.bounds.x_max + 1e-9);
            assert!(y >= track.bounds.y_min - 1e-9 && y <= track.bounds.y_max + 1e-9);
        }
    }
}
