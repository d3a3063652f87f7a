pub mod http;
pub mod loader;
pub mod mock;
pub mod telemetry_source;

pub use http::HttpSource;
pub use loader::{spawn_loader, LoadEvent, LoadUpdate, LoaderConfig, SessionTicket};
pub use mock::MockSource;
pub use telemetry_source::{PageRequest, SourceError, SourceResult, TelemetryPage, TelemetrySource};
