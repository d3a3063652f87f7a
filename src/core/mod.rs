pub mod format;
pub mod frame;
pub mod session;
pub mod track;

pub use frame::{DriverTelemetry, DrsStatus, Frame, TyreCompound, Weather};
pub use session::{SessionId, SessionType};
pub use track::{active_status, DriverColors, Rgb, TrackBounds, TrackFit, TrackGeometry, TrackStatus};
