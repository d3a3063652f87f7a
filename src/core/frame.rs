use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::core::track::Rgb;

/// One time-sample of every driver on track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frame {
    /// Seconds since session start
    pub t: f64,

    /// Leader's lap at this instant
    #[serde(deserialize_with = "lenient_uint")]
    pub lap: u32,

    /// Telemetry keyed by driver code (e.g. "VER")
    #[serde(default)]
    pub drivers: HashMap<String, DriverTelemetry>,

    /// Ambient conditions, advisory only
    #[serde(default)]
    pub weather: Option<Weather>,
}

impl Frame {
    /// Look up a driver by code
    pub fn driver(&self, code: &str) -> Option<&DriverTelemetry> {
        self.drivers.get(code)
    }

    /// Driver codes ordered by running position, ties broken by code
    pub fn standings(&self) -> Vec<(&str, &DriverTelemetry)> {
        let mut rows: Vec<(&str, &DriverTelemetry)> = self
            .drivers
            .iter()
            .map(|(code, data)| (code.as_str(), data))
            .collect();
        rows.sort_by(|(a_code, a), (b_code, b)| {
            a.position.cmp(&b.position).then_with(|| a_code.cmp(b_code))
        });
        rows
    }
}

/// Per-driver telemetry record within a frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverTelemetry {
    /// Track-local position
    pub x: f64,
    pub y: f64,

    /// Distance travelled since the start, metres
    pub dist: f64,

    /// Lap-relative distance, 0.0 to 1.0
    pub rel_dist: f64,

    #[serde(deserialize_with = "lenient_uint")]
    pub lap: u32,

    /// Tyre compound code, see [`TyreCompound`]
    #[serde(deserialize_with = "lenient_int")]
    pub tyre: i32,

    /// Running race position, 1-based
    #[serde(deserialize_with = "lenient_uint")]
    pub position: u32,

    /// km/h
    pub speed: f64,

    #[serde(deserialize_with = "lenient_int")]
    pub gear: i32,

    /// DRS code, see [`DrsStatus`]
    #[serde(deserialize_with = "lenient_int")]
    pub drs: i32,

    /// 0 to 100
    pub throttle: f64,

    /// Either 0 to 1 or 0 to 100 depending on the upstream source
    pub brake: f64,
}

impl DriverTelemetry {
    /// Brake pressure as a percentage.
    ///
    /// Upstream data mixes units: values above 1.0 are taken as already being
    /// a percentage, anything at or below 1.0 is a fraction and gets scaled.
    pub fn brake_percent(&self) -> f64 {
        if self.brake > 1.0 {
            self.brake
        } else {
            self.brake * 100.0
        }
    }

    pub fn throttle_percent(&self) -> f64 {
        self.throttle.clamp(0.0, 100.0)
    }

    pub fn tyre_compound(&self) -> TyreCompound {
        TyreCompound::from_code(self.tyre)
    }

    pub fn drs_status(&self) -> DrsStatus {
        DrsStatus::from_code(self.drs)
    }
}

/// Weather sample attached to a frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Weather {
    pub track_temp: Option<f64>,
    pub air_temp: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub rain_state: Option<String>,
}

/// Tyre compound in use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TyreCompound {
    Soft,
    Medium,
    Hard,
    Intermediate,
    Wet,
    Unknown,
}

impl TyreCompound {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => TyreCompound::Soft,
            1 => TyreCompound::Medium,
            2 => TyreCompound::Hard,
            3 => TyreCompound::Intermediate,
            4 => TyreCompound::Wet,
            _ => TyreCompound::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TyreCompound::Soft => "SOFT",
            TyreCompound::Medium => "MEDIUM",
            TyreCompound::Hard => "HARD",
            TyreCompound::Intermediate => "INTERMEDIATE",
            TyreCompound::Wet => "WET",
            TyreCompound::Unknown => "UNKNOWN",
        }
    }

    /// Single-letter badge used in the leaderboard
    pub fn badge(&self) -> &'static str {
        &self.name()[..1]
    }

    pub fn color(&self) -> Rgb {
        match self {
            TyreCompound::Soft => Rgb::new(255, 0, 0),
            TyreCompound::Medium => Rgb::new(255, 255, 0),
            TyreCompound::Hard => Rgb::new(255, 255, 255),
            TyreCompound::Intermediate => Rgb::new(0, 255, 0),
            TyreCompound::Wet => Rgb::new(0, 0, 255),
            TyreCompound::Unknown => Rgb::new(128, 128, 128),
        }
    }
}

/// Drag Reduction System state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrsStatus {
    Off,
    Available,
    Open,
}

impl DrsStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            10 | 12 | 14 => DrsStatus::Open,
            8 => DrsStatus::Available,
            _ => DrsStatus::Off,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DrsStatus::Off => "OFF",
            DrsStatus::Available => "AVAILABLE",
            DrsStatus::Open => "OPEN",
        }
    }
}

// The backend serialises some integer columns as floats (e.g. `3.0`).
fn lenient_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.round() as i32)
}

fn lenient_uint<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    Ok(value.max(0.0).round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry(brake: f64) -> DriverTelemetry {
        DriverTelemetry {
            brake,
            ..Default::default()
        }
    }

    #[test]
    fn test_brake_fraction_is_scaled() {
        assert_eq!(telemetry(0.0).brake_percent(), 0.0);
        assert_eq!(telemetry(0.5).brake_percent(), 50.0);
        assert_eq!(telemetry(1.0).brake_percent(), 100.0);
    }

    #[test]
    fn test_brake_percentage_passes_through() {
        assert_eq!(telemetry(1.5).brake_percent(), 1.5);
        assert_eq!(telemetry(80.0).brake_percent(), 80.0);
    }

    #[test]
    fn test_tyre_and_drs_codes() {
        assert_eq!(TyreCompound::from_code(1), TyreCompound::Medium);
        assert_eq!(TyreCompound::from_code(9), TyreCompound::Unknown);
        assert_eq!(TyreCompound::Intermediate.badge(), "I");

        assert_eq!(DrsStatus::from_code(12), DrsStatus::Open);
        assert_eq!(DrsStatus::from_code(8), DrsStatus::Available);
        assert_eq!(DrsStatus::from_code(0), DrsStatus::Off);
        assert_eq!(DrsStatus::from_code(9), DrsStatus::Off);
    }

    #[test]
    fn test_deserialize_frame_with_float_integers() {
        let json = r#"{
            "t": 12.4,
            "lap": 3.0,
            "drivers": {
                "VER": {"x": 1.0, "y": 2.0, "dist": 5000.0, "rel_dist": 0.2, "lap": 3,
                        "tyre": 1.0, "position": 1, "speed": 301.5, "gear": 8.0,
                        "drs": 12, "throttle": 100.0, "brake": 0.0},
                "HAM": {"x": 0.5, "y": 1.0, "position": 2.0}
            },
            "weather": {"air_temp": 24.1, "rain_state": "DRY"}
        }"#;

        let frame: Frame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.lap, 3);
        assert_eq!(frame.driver("VER").unwrap().gear, 8);
        assert_eq!(frame.driver("VER").unwrap().tyre_compound(), TyreCompound::Medium);
        assert_eq!(frame.driver("HAM").unwrap().speed, 0.0);
        assert!(frame.driver("LEC").is_none());
        assert_eq!(frame.weather.unwrap().rain_state.as_deref(), Some("DRY"));
    }

    #[test]
    fn test_standings_order_by_position() {
        let mut drivers = HashMap::new();
        for (code, pos) in [("NOR", 2), ("PIA", 1), ("SAI", 3)] {
            drivers.insert(
                code.to_string(),
                DriverTelemetry {
                    position: pos,
                    ..Default::default()
                },
            );
        }
        let frame = Frame {
            t: 0.0,
            lap: 1,
            drivers,
            weather: None,
        };

        let order: Vec<&str> = frame.standings().into_iter().map(|(c, _)| c).collect();
        assert_eq!(order, vec!["PIA", "NOR", "SAI"]);
    }
}
