use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{DriverColors, Frame, SessionId, TrackGeometry, TrackStatus};
use crate::source::{PageRequest, SourceError, TelemetrySource};

/// Frames requested in the first page
pub const INITIAL_PAGE_FRAMES: usize = 1000;

/// Frames requested per background page
pub const BATCH_FRAMES: usize = 5000;

/// Pause between background pages so playback keeps the CPU
pub const BATCH_DELAY: Duration = Duration::from_millis(100);

/// Identifies which session (and which opening of it) an update belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTicket {
    pub session: SessionId,
    pub generation: u64,
}

/// Session-wide data delivered with the first page
#[derive(Debug, Clone)]
pub struct SessionMetadata {
    pub total_frames: usize,
    pub total_laps: u32,
    pub driver_colors: DriverColors,
    pub track_statuses: Vec<TrackStatus>,
}

#[derive(Debug)]
pub enum LoadEvent {
    Metadata(SessionMetadata),
    Frames { start: usize, frames: Vec<Frame> },
    Track(TrackGeometry),
    TrackFailed(String),
    /// First page failed, nothing to play
    InitialFailed(String),
    /// A background page failed, loading stops at `start`
    BatchFailed { start: usize, error: String },
    Finished,
}

/// Message from the loader task to the session
#[derive(Debug)]
pub struct LoadUpdate {
    pub ticket: SessionTicket,
    pub event: LoadEvent,
}

#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub initial_frames: usize,
    pub batch_frames: usize,
    pub batch_delay: Duration,
    pub force_refresh: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            initial_frames: INITIAL_PAGE_FRAMES,
            batch_frames: BATCH_FRAMES,
            batch_delay: BATCH_DELAY,
            force_refresh: false,
        }
    }
}

/// Spawn the progressive loader for a session on `runtime`
pub fn spawn_loader(
    runtime: &Handle,
    source: Arc<dyn TelemetrySource>,
    ticket: SessionTicket,
    config: LoaderConfig,
    tx: UnboundedSender<LoadUpdate>,
) -> JoinHandle<()> {
    runtime.spawn(run_loader(source, ticket, config, tx))
}

/// Fetch the track and page through the session's telemetry.
///
/// The two run side by side: frames are delivered as soon as each page
/// arrives, whatever the track request is doing. Stops early when the
/// receiving session is gone.
pub async fn run_loader(
    source: Arc<dyn TelemetrySource>,
    ticket: SessionTicket,
    config: LoaderConfig,
    tx: UnboundedSender<LoadUpdate>,
) {
    info!("Loading session {} from {}", ticket.session, source.name());

    tokio::join!(
        load_track(source.as_ref(), ticket, &tx),
        load_telemetry(source.as_ref(), ticket, &config, &tx)
    );
}

async fn load_track(
    source: &dyn TelemetrySource,
    ticket: SessionTicket,
    tx: &UnboundedSender<LoadUpdate>,
) {
    let session = ticket.session;
    let event = match source.fetch_track(session).await {
        Ok(geometry) => LoadEvent::Track(geometry),
        Err(e) => {
            warn!("Track geometry for {} unavailable: {}", session, e);
            LoadEvent::TrackFailed(e.to_string())
        }
    };
    if tx.send(LoadUpdate { ticket, event }).is_err() {
        debug!("Session {} closed before the track arrived", session);
    }
}

async fn load_telemetry(
    source: &dyn TelemetrySource,
    ticket: SessionTicket,
    config: &LoaderConfig,
    tx: &UnboundedSender<LoadUpdate>,
) {
    let session = ticket.session;
    let send = |event: LoadEvent| tx.send(LoadUpdate { ticket, event }).is_ok();

    let first_request = PageRequest {
        start_frame: 0,
        frame_count: config.initial_frames,
        force_refresh: config.force_refresh,
    };
    let first = match source.fetch_telemetry(session, first_request).await {
        Ok(page) => page,
        Err(e) => {
            error!("Failed to load session {}: {}", session, e);
            send(LoadEvent::InitialFailed(e.to_string()));
            return;
        }
    };

    let total = first.total_frames;
    let mut next = first.start_frame + first.frames.len();
    let mut has_more = first.has_more;
    info!(
        "Session {}: {} frames, {} laps, first page {}..{}",
        session, total, first.total_laps, first.start_frame, next
    );

    let metadata = SessionMetadata {
        total_frames: total,
        total_laps: first.total_laps,
        driver_colors: first.driver_colors,
        track_statuses: first.track_statuses,
    };
    if !send(LoadEvent::Metadata(metadata))
        || !send(LoadEvent::Frames {
            start: first.start_frame,
            frames: first.frames,
        })
    {
        debug!("Session {} closed before loading started", session);
        return;
    }

    while has_more && next < total {
        tokio::time::sleep(config.batch_delay).await;
        if tx.is_closed() {
            debug!("Session {} closed, stopping at frame {}", session, next);
            return;
        }

        debug!("Loading frames {} to {}", next, (next + config.batch_frames).min(total));
        let request = PageRequest {
            start_frame: next,
            frame_count: config.batch_frames,
            force_refresh: false,
        };

        let page = match source.fetch_telemetry(session, request).await {
            Ok(page) if page.frames.is_empty() => {
                Err(SourceError::EmptyPage { start: next, total })
            }
            other => other,
        };

        match page {
            Ok(page) => {
                let start = page.start_frame;
                next = start + page.frames.len();
                has_more = page.has_more;
                if !send(LoadEvent::Frames {
                    start,
                    frames: page.frames,
                }) {
                    return;
                }
            }
            Err(e) => {
                warn!("Loading {} halted at frame {}: {}", session, next, e);
                send(LoadEvent::BatchFailed {
                    start: next,
                    error: e.to_string(),
                });
                return;
            }
        }
    }

    if next < total {
        warn!("Source ended {} at frame {} of {}", session, next, total);
    } else {
        info!("All frames loaded for {}", session);
    }
    send(LoadEvent::Finished);
}
