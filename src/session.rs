//! Per-session playback context.
//!
//! A `SessionContext` owns the frame store, clock and selection for exactly one
//! opened session. Loader updates arrive over a channel and are applied on the
//! owning thread; every mutation publishes a fresh [`PlaybackSnapshot`] on a
//! `watch` channel for renderers. Opening another session means building a new
//! context; dropping the old one aborts its loader.

use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::{active_status, DriverColors, Frame, SessionId, TrackGeometry, TrackStatus};
use crate::playback::{EndBehavior, PlaybackCommand, PlaybackEngine};
use crate::source::{
    spawn_loader, LoadEvent, LoadUpdate, LoaderConfig, SessionTicket, TelemetrySource,
};

/// Progress of the session's data
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    /// Waiting for the first page
    Loading,
    /// First page in, more arriving in the background
    Streaming,
    Complete,
    /// Loading stopped short of the total; the loaded prefix stays playable
    Halted(String),
    /// The first page failed, nothing to play
    Failed(String),
}

/// Immutable view of playback state handed to renderers
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub ticket: SessionTicket,
    pub position: f64,
    pub frame_index: usize,
    pub paused: bool,
    pub speed: f64,
    pub total_frames: usize,
    pub loaded_frames: usize,
    pub loading_percent: f64,
    pub complete: bool,
    /// Frame under the playhead, `None` while not loaded
    pub frame: Option<Arc<Frame>>,
    pub selected: Option<String>,
    pub load_state: LoadState,
}

pub struct SessionContext {
    ticket: SessionTicket,
    engine: PlaybackEngine,
    driver_colors: DriverColors,
    track: Option<TrackGeometry>,
    total_laps: u32,
    track_statuses: Vec<TrackStatus>,
    load_state: LoadState,
    updates: mpsc::UnboundedReceiver<LoadUpdate>,
    loader: Option<JoinHandle<()>>,
    snapshots: watch::Sender<PlaybackSnapshot>,
}

impl SessionContext {
    /// Open a session and start loading it in the background
    pub fn open(
        ticket: SessionTicket,
        source: Arc<dyn TelemetrySource>,
        runtime: &Handle,
        loader_config: LoaderConfig,
        end_behavior: EndBehavior,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut context = Self::new(ticket, rx, end_behavior);
        context.loader = Some(spawn_loader(runtime, source, ticket, loader_config, tx));
        context
    }

    /// Context fed by an external update channel, without a loader task
    #[cfg(test)]
    pub fn with_channel(
        ticket: SessionTicket,
        end_behavior: EndBehavior,
    ) -> (Self, mpsc::UnboundedSender<LoadUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(ticket, rx, end_behavior), tx)
    }

    fn new(
        ticket: SessionTicket,
        updates: mpsc::UnboundedReceiver<LoadUpdate>,
        end_behavior: EndBehavior,
    ) -> Self {
        let engine = PlaybackEngine::with_end_behavior(end_behavior);
        let initial = Self::build_snapshot(ticket, &engine, &LoadState::Loading);
        let (snapshots, _) = watch::channel(initial);

        Self {
            ticket,
            engine,
            driver_colors: DriverColors::default(),
            track: None,
            total_laps: 0,
            track_statuses: Vec::new(),
            load_state: LoadState::Loading,
            updates,
            loader: None,
            snapshots,
        }
    }

    pub fn session(&self) -> SessionId {
        self.ticket.session
    }

    #[cfg(test)]
    pub fn engine(&self) -> &PlaybackEngine {
        &self.engine
    }

    #[cfg(test)]
    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn track(&self) -> Option<&TrackGeometry> {
        self.track.as_ref()
    }

    pub fn driver_colors(&self) -> &DriverColors {
        &self.driver_colors
    }

    pub fn total_laps(&self) -> u32 {
        self.total_laps
    }

    /// Track status in force at session time `t`
    pub fn status_at(&self, t: f64) -> Option<&TrackStatus> {
        active_status(&self.track_statuses, t)
    }

    /// Subscribe to snapshots published after each change
    pub fn subscribe(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.subscribe()
    }

    /// Latest published snapshot
    #[cfg(test)]
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Drain pending loader updates; returns how many were applied
    pub fn process_updates(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates.try_recv() {
            if self.apply_update(update) {
                applied += 1;
            }
        }

        if applied > 0 {
            self.publish();
        }
        applied
    }

    /// Advance the clock by `ticks` scheduler ticks, publishing only if it moved
    pub fn advance(&mut self, ticks: u32) {
        if ticks == 0 || self.engine.is_paused() {
            return;
        }

        let position = self.engine.position();
        self.engine.tick(ticks);
        if self.engine.position() != position || self.engine.is_paused() {
            self.publish();
        }
    }

    /// Apply a control command
    pub fn control(&mut self, command: PlaybackCommand) {
        debug!("Playback command {:?}", command);
        self.engine.apply(command);
        self.publish();
    }

    fn apply_update(&mut self, update: LoadUpdate) -> bool {
        if update.ticket != self.ticket {
            debug!(
                "Dropping update for {} (gen {}), active is {} (gen {})",
                update.ticket.session,
                update.ticket.generation,
                self.ticket.session,
                self.ticket.generation
            );
            return false;
        }

        match update.event {
            LoadEvent::Metadata(meta) => {
                self.engine.set_total_frames(meta.total_frames);
                self.total_laps = meta.total_laps;
                self.driver_colors = meta.driver_colors;
                self.track_statuses = meta.track_statuses;
            }
            LoadEvent::Frames { start, frames } => match self.engine.append_frames(start, frames) {
                Ok(_) => {
                    if self.engine.store().is_complete() {
                        self.load_state = LoadState::Complete;
                    } else if self.load_state == LoadState::Loading {
                        self.load_state = LoadState::Streaming;
                    }
                }
                Err(e) => {
                    error!("Rejected frame batch for {}: {}", self.ticket.session, e);
                    self.halt(e.to_string());
                }
            },
            LoadEvent::Track(geometry) => {
                self.track = Some(geometry);
            }
            LoadEvent::TrackFailed(e) => {
                warn!("Playing {} without track outline: {}", self.ticket.session, e);
            }
            LoadEvent::InitialFailed(e) => {
                self.load_state = LoadState::Failed(e);
            }
            LoadEvent::BatchFailed { start, error } => {
                warn!(
                    "Background loading stopped at frame {} for {}",
                    start, self.ticket.session
                );
                // paging already stopped; the track may still be on its way
                self.load_state = LoadState::Halted(error);
            }
            LoadEvent::Finished => {
                let store = self.engine.store();
                info!(
                    "Session {} ready: {}/{} frames",
                    self.ticket.session,
                    store.loaded_count(),
                    store.total_count()
                );
                if store.is_complete() || store.total_count() == 0 {
                    self.load_state = LoadState::Complete;
                } else if !matches!(self.load_state, LoadState::Halted(_) | LoadState::Failed(_)) {
                    self.load_state = LoadState::Halted(format!(
                        "source ended at {} of {} frames",
                        store.loaded_count(),
                        store.total_count()
                    ));
                }
            }
        }
        true
    }

    /// Stop the loader after a batch the store could not take
    fn halt(&mut self, reason: String) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        self.load_state = LoadState::Halted(reason);
    }

    fn publish(&self) {
        let snapshot = Self::build_snapshot(self.ticket, &self.engine, &self.load_state);
        self.snapshots.send_replace(snapshot);
    }

    fn build_snapshot(
        ticket: SessionTicket,
        engine: &PlaybackEngine,
        load_state: &LoadState,
    ) -> PlaybackSnapshot {
        let store = engine.store();
        PlaybackSnapshot {
            ticket,
            position: engine.position(),
            frame_index: engine.current_index(),
            paused: engine.is_paused(),
            speed: engine.speed(),
            total_frames: engine.total_frames(),
            loaded_frames: store.loaded_count(),
            loading_percent: store.progress_percent(),
            complete: store.is_complete(),
            frame: engine.current_frame().cloned(),
            selected: engine.selected_driver().map(str::to_string),
            load_state: load_state.clone(),
        }
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        if let Some(loader) = self.loader.take() {
            debug!("Cancelling loader for {}", self.ticket.session);
            loader.abort();
        }
    }
}
