use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Track outline for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackGeometry {
    /// Inner boundary, closed loop of [x, y]
    pub inner: Vec<[f64; 2]>,

    /// Outer boundary, closed loop of [x, y]
    pub outer: Vec<[f64; 2]>,

    /// Rotation hint in degrees, carried through unused
    #[serde(default)]
    pub rotation: f64,

    pub bounds: TrackBounds,
}

/// Axis-aligned bounding box of the track, in track units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl TrackBounds {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Uniform scale and offset that centres the bounds in a viewport
    pub fn fit(&self, width: f32, height: f32, padding: f32) -> TrackFit {
        let track_w = self.width();
        let track_h = self.height();

        let scale = if track_w > 0.0 && track_h > 0.0 {
            let scale_x = (width as f64 - padding as f64 * 2.0) / track_w;
            let scale_y = (height as f64 - padding as f64 * 2.0) / track_h;
            scale_x.min(scale_y).max(0.0)
        } else {
            1.0
        };

        TrackFit {
            scale,
            offset_x: (width as f64 - track_w * scale) / 2.0 - self.x_min * scale,
            offset_y: (height as f64 - track_h * scale) / 2.0 - self.y_min * scale,
        }
    }
}

/// Track-space to viewport-space mapping
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackFit {
    pub scale: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl TrackFit {
    pub fn apply(&self, x: f64, y: f64) -> [f32; 2] {
        [
            (x * self.scale + self.offset_x) as f32,
            (y * self.scale + self.offset_y) as f32,
        ]
    }
}

/// 8-bit RGB color, serialised as `[r, g, b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u8; 3]", into = "[u8; 3]")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Normalised RGBA for imgui
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha,
        ]
    }
}

impl From<[u8; 3]> for Rgb {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [u8; 3] {
    fn from(c: Rgb) -> Self {
        [c.r, c.g, c.b]
    }
}

/// Team livery per driver code
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverColors(HashMap<String, Rgb>);

impl DriverColors {
    /// Color for a driver, white when unknown
    pub fn get(&self, code: &str) -> Rgb {
        self.0.get(code).copied().unwrap_or(Rgb::WHITE)
    }

    pub fn insert(&mut self, code: &str, color: Rgb) {
        self.0.insert(code.to_string(), color);
    }
}

/// Track status event (green, yellow, safety car, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackStatus {
    /// Status code as reported by timing, e.g. "1" or "4"
    pub status: String,
    pub start_time: f64,
    #[serde(default)]
    pub end_time: Option<f64>,
}

impl TrackStatus {
    pub fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_time && self.end_time.map_or(true, |end| t < end)
    }

    pub fn label(&self) -> &str {
        match self.status.as_str() {
            "1" => "Green",
            "2" => "Yellow",
            "4" => "Safety Car",
            "5" => "Red Flag",
            "6" | "7" => "Virtual Safety Car",
            other => other,
        }
    }

    pub fn color(&self) -> Rgb {
        match self.status.as_str() {
            "2" => Rgb::new(255, 220, 0),
            "4" | "6" | "7" => Rgb::new(255, 150, 0),
            "5" => Rgb::new(230, 30, 30),
            _ => Rgb::new(40, 200, 80),
        }
    }
}

/// Latest status event active at `t`
pub fn active_status(statuses: &[TrackStatus], t: f64) -> Option<&TrackStatus> {
    statuses
        .iter()
        .filter(|s| s.is_active_at(t))
        .max_by(|a, b| a.start_time.total_cmp(&b.start_time))
}
