mod config;
mod core;
mod playback;
mod session;
mod source;
mod ui;

use anyhow::{anyhow, Context as _, Result};
use clap::Parser;
use config::AppSettings;
use crate::core::{SessionId, SessionType};
use imgui::{Condition, Context, FontConfig, FontSource, StyleColor, Ui};
use imgui_winit_support::{HiDpiMode, WinitPlatform};
use playback::{PlaybackCommand, Ticker};
use session::{LoadState, PlaybackSnapshot, SessionContext};
use source::{HttpSource, LoaderConfig, MockSource, SessionTicket, TelemetrySource};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use ui::{
    ControlsBar, LeaderboardWindow, OpenRequest, SessionPicker, ShortcutAction, ShortcutManager,
    TelemetryPanel, TrackView,
};
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::ModifiersState;
use winit::window::WindowBuilder;

use glutin::display::GetGlDisplay;
use glutin::prelude::*;
use glutin_winit::{DisplayBuilder, GlWindow};
use glow::HasContext;
use raw_window_handle::HasRawWindowHandle;

use std::ffi::CString;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Length of the synthetic session used by `--demo`, 20 minutes at 25 Hz
const DEMO_FRAMES: usize = 25 * 60 * 20;

/// Per-request delay in demo mode, so progressive loading is visible
const DEMO_LATENCY: Duration = Duration::from_millis(250);

const SETTINGS_SAVE_INTERVAL: Duration = Duration::from_secs(30);

/// Replay a motorsport session from recorded telemetry
#[derive(Debug, Parser)]
#[command(name = "race-replay", version, about, long_about = None)]
struct Args {
    /// Play a built-in synthetic session instead of querying the backend
    #[arg(long)]
    demo: bool,

    /// Telemetry backend URL, overrides the saved setting
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Session to open at start-up, e.g. 2024/5/Q
    #[arg(value_name = "YEAR/ROUND/TYPE")]
    session: Option<SessionId>,
}

struct AppState {
    settings: AppSettings,
    runtime: Handle,
    source: Arc<dyn TelemetrySource>,
    session: Option<SessionContext>,
    snapshots: Option<watch::Receiver<PlaybackSnapshot>>,
    generation: u64,
    ticker: Ticker,
    last_tick: Instant,
    modifiers: ModifiersState,
    picker: SessionPicker,
    track_view: TrackView,
    leaderboard: LeaderboardWindow,
    telemetry: TelemetryPanel,
    controls: ControlsBar,
    shortcut_manager: ShortcutManager,
    // Window visibility
    show_track: bool,
    show_leaderboard: bool,
    show_telemetry: bool,
    show_controls: bool,
    show_shortcuts: bool,
}

impl AppState {
    fn new(settings: AppSettings, source: Arc<dyn TelemetrySource>, runtime: Handle) -> Self {
        Self {
            runtime,
            source,
            session: None,
            snapshots: None,
            generation: 0,
            ticker: Ticker::default(),
            last_tick: Instant::now(),
            modifiers: ModifiersState::empty(),
            picker: SessionPicker::new(settings.last_session()),
            track_view: TrackView::new(),
            leaderboard: LeaderboardWindow::new(),
            telemetry: TelemetryPanel::new(),
            controls: ControlsBar::new(),
            shortcut_manager: ShortcutManager::new(),
            show_track: settings.show_track,
            show_leaderboard: settings.show_leaderboard,
            show_telemetry: settings.show_telemetry,
            show_controls: settings.show_controls,
            show_shortcuts: settings.show_shortcuts,
            settings,
        }
    }

    fn save_settings(&mut self) {
        self.settings.show_track = self.show_track;
        self.settings.show_leaderboard = self.show_leaderboard;
        self.settings.show_telemetry = self.show_telemetry;
        self.settings.show_controls = self.show_controls;
        self.settings.show_shortcuts = self.show_shortcuts;

        if let Err(e) = self.settings.save() {
            warn!("Could not save settings: {:#}", e);
        }
    }

    /// Replace the current session; the old loader is cancelled on drop
    fn open_session(&mut self, request: OpenRequest) {
        self.generation += 1;
        let ticket = SessionTicket {
            session: request.session,
            generation: self.generation,
        };
        info!("Opening {} (generation {})", request.session.title(), self.generation);

        self.snapshots = None;
        self.session = None;

        let loader_config = LoaderConfig {
            force_refresh: request.force_refresh,
            ..LoaderConfig::default()
        };
        let context = SessionContext::open(
            ticket,
            self.source.clone(),
            &self.runtime,
            loader_config,
            self.settings.end_behavior,
        );
        self.snapshots = Some(context.subscribe());
        self.session = Some(context);

        self.ticker.reset();
        self.last_tick = Instant::now();
        self.picker.set_session(request.session);
        self.settings.remember_session(request.session);
    }

    /// Drain loader updates and advance playback by the ticks that are due
    fn update(&mut self) {
        let now = Instant::now();
        let ticks = self.ticker.due(now - self.last_tick);
        self.last_tick = now;

        if let Some(session) = self.session.as_mut() {
            session.process_updates();
            session.advance(ticks);
        }
    }

    fn control(&mut self, command: PlaybackCommand) {
        if let Some(session) = self.session.as_mut() {
            session.control(command);
        }
    }

    fn handle_shortcut(&mut self, action: ShortcutAction) {
        match action.command() {
            Some(command) => self.control(command),
            None => self.show_shortcuts = true,
        }
    }

    /// Latest snapshot of the current opening, if any
    fn snapshot(&self) -> Option<PlaybackSnapshot> {
        self.snapshots
            .as_ref()
            .map(|rx| rx.borrow().clone())
            .filter(|snapshot| snapshot.ticket.generation == self.generation)
    }

    fn window_title(&self) -> String {
        match &self.session {
            Some(session) => format!("Race Replay - {}", session.session().title()),
            None => "Race Replay".to_string(),
        }
    }

    /// Build the UI for one frame; returns false when the user asked to quit
    fn render(&mut self, ui: &Ui) -> bool {
        let mut keep_running = true;
        let snapshot = self.snapshot();

        ui.main_menu_bar(|| {
            ui.menu("File", || {
                if ui.menu_item("Open Session...") {
                    self.picker.show();
                }
                let current = self.session.as_ref().map(|s| s.session());
                if ui.menu_item_config("Reload (force refresh)").enabled(current.is_some()).build() {
                    if let Some(session) = current {
                        self.open_session(OpenRequest { session, force_refresh: true });
                    }
                }
                ui.separator();
                if ui.menu_item("Exit") {
                    keep_running = false;
                }
            });

            ui.menu("Playback", || {
                let paused = snapshot.as_ref().map_or(true, |s| s.paused);
                if ui.menu_item_config(if paused { "Play" } else { "Pause" }).shortcut("Space").build() {
                    self.control(PlaybackCommand::SetPaused(!paused));
                }
                if ui.menu_item_config("Restart").shortcut("0").build() {
                    self.control(PlaybackCommand::SeekTo(0));
                }
                if ui.menu_item("Reset") {
                    self.control(PlaybackCommand::Reset);
                }
                if ui.menu_item_config("Clear Selection").shortcut("Esc").build() {
                    self.control(PlaybackCommand::SelectDriver(None));
                }
                ui.separator();
                let speed = snapshot.as_ref().map_or(1.0, |s| s.speed);
                ui.text(format!("Speed: {}x", speed));
            });

            ui.menu("View", || {
                for (label, flag) in [
                    ("Track", &mut self.show_track),
                    ("Leaderboard", &mut self.show_leaderboard),
                    ("Driver Telemetry", &mut self.show_telemetry),
                    ("Playback", &mut self.show_controls),
                ] {
                    let _tok = if *flag {
                        Some(ui.push_style_color(StyleColor::Text, [0.0, 1.0, 0.0, 1.0]))
                    } else {
                        None
                    };
                    if ui.menu_item(label) {
                        *flag = !*flag;
                    }
                }
            });

            ui.menu("Help", || {
                if ui.menu_item_config("Keyboard Shortcuts").shortcut("?").build() {
                    self.show_shortcuts = true;
                }
            });

            if let Some(session) = &self.session {
                ui.separator();
                ui.text_disabled(format!("{} via {}", session.session().title(), self.source.name()));
            }
        });

        if let Some(request) = self.picker.render(ui, self.settings.last_opened) {
            self.open_session(request);
        }

        let snapshot = match snapshot {
            Some(snapshot) if self.session.is_some() => snapshot,
            _ => {
                ui.window("Welcome")
                    .size([360.0, 120.0], Condition::FirstUseEver)
                    .position([400.0, 60.0], Condition::FirstUseEver)
                    .build(|| {
                        ui.text("No session loaded");
                        if ui.button("Open Session...") {
                            self.picker.show();
                        }
                    });
                if self.show_shortcuts {
                    self.shortcut_manager.render_help(ui, &mut self.show_shortcuts);
                }
                return keep_running;
            }
        };
        let Some(session) = self.session.as_ref() else {
            return keep_running;
        };

        if let LoadState::Failed(reason) = &snapshot.load_state {
            ui.window("Load Failed")
                .size([420.0, 110.0], Condition::FirstUseEver)
                .position([400.0, 60.0], Condition::FirstUseEver)
                .build(|| {
                    ui.text_colored([1.0, 0.3, 0.3, 1.0], format!("Could not load {}", session.session().title()));
                    ui.text_wrapped(reason);
                    ui.text_disabled("Use File > Open Session to try again");
                });
        }

        let mut commands = Vec::new();
        let frame = snapshot.frame.as_deref();
        let selected = snapshot.selected.as_deref();

        if self.show_track {
            if let Some(code) = self.track_view.render(
                ui,
                &mut self.show_track,
                &snapshot,
                session.track(),
                session.driver_colors(),
                frame.and_then(|f| session.status_at(f.t)),
            ) {
                commands.push(PlaybackCommand::SelectDriver(Some(code)));
            }
        }

        if self.show_leaderboard {
            if let Some(code) = self.leaderboard.render(
                ui,
                &mut self.show_leaderboard,
                frame,
                session.driver_colors(),
                selected,
            ) {
                commands.push(PlaybackCommand::SelectDriver(Some(code)));
            }
        }

        if self.show_telemetry {
            self.telemetry.render(
                ui,
                &mut self.show_telemetry,
                frame,
                session.driver_colors(),
                selected,
            );
        }

        if self.show_controls {
            commands.extend(self.controls.render(
                ui,
                &mut self.show_controls,
                &snapshot,
                session.total_laps(),
            ));
        }

        if self.show_shortcuts {
            self.shortcut_manager.render_help(ui, &mut self.show_shortcuts);
        }

        for command in commands {
            self.control(command);
        }

        keep_running
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("race_replay=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> Result<()> {
    init_logging();

    let args = Args::parse();

    let mut settings = AppSettings::load();
    if let Some(url) = &args.api_url {
        settings.api_url = url.clone();
    }

    // Create tokio runtime for the loaders
    let runtime = Runtime::new().context("Failed to create Tokio runtime")?;

    let source: Arc<dyn TelemetrySource> = if args.demo {
        info!("Demo mode: synthetic session of {} frames", DEMO_FRAMES);
        Arc::new(MockSource::new(DEMO_FRAMES).with_latency(DEMO_LATENCY))
    } else {
        info!("Using backend at {}", settings.api_url);
        Arc::new(HttpSource::new(&settings.api_url, settings.request_timeout())?)
    };

    let initial = args.session.or(if args.demo {
        Some(SessionId::new(2024, 1, SessionType::Race))
    } else {
        None
    });

    let event_loop = EventLoop::new().context("Failed to create EventLoop")?;

    // Build the window and GL display using glutin-winit
    let (window, gl_config) = DisplayBuilder::new()
        .with_window_builder(Some(
            WindowBuilder::new()
                .with_title("Race Replay")
                .with_inner_size(winit::dpi::LogicalSize::new(1400.0, 900.0)),
        ))
        .build(&event_loop, glutin::config::ConfigTemplateBuilder::new(), |configs| {
            configs
                .reduce(|best, c| if c.num_samples() > best.num_samples() { c } else { best })
                .expect("display offered no GL configs")
        })
        .map_err(|e| anyhow!("Failed to create window and display: {}", e))?;

    let window = window.context("Failed to create window")?;
    let gl_display = gl_config.display();

    let context = unsafe {
        gl_display.create_context(
            &gl_config,
            &glutin::context::ContextAttributesBuilder::new().build(Some(window.raw_window_handle())),
        )
    }
    .context("Failed to create GL context")?;

    let attrs = window.build_surface_attributes(
        glutin::surface::SurfaceAttributesBuilder::<glutin::surface::WindowSurface>::new(),
    );
    let surface = unsafe { gl_display.create_window_surface(&gl_config, &attrs) }
        .context("Failed to create surface")?;
    let context = context
        .make_current(&surface)
        .context("Failed to make context current")?;

    let load_gl = |name: &str| -> *const std::ffi::c_void {
        match CString::new(name) {
            Ok(name) => gl_display.get_proc_address(&name) as *const _,
            Err(_) => std::ptr::null(),
        }
    };
    let gl = unsafe { glow::Context::from_loader_function(load_gl) };
    // Second handle on the same GL context, for clearing
    let gl_clear = unsafe { glow::Context::from_loader_function(load_gl) };

    let mut imgui = Context::create();
    imgui.set_log_filename(None::<std::path::PathBuf>);

    // Window layout lives next to the settings file
    match AppSettings::layout_path() {
        Some(ini_path) => {
            if let Some(parent) = ini_path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            imgui.set_ini_filename(Some(ini_path));
        }
        None => imgui.set_ini_filename(None::<std::path::PathBuf>),
    }

    imgui.io_mut().config_flags |= imgui::ConfigFlags::DOCKING_ENABLE;

    let hidpi_factor = window.scale_factor();
    let font_size = (14.0 * hidpi_factor) as f32;
    imgui.fonts().add_font(&[FontSource::DefaultFontData {
        config: Some(FontConfig {
            size_pixels: font_size,
            ..FontConfig::default()
        }),
    }]);
    imgui.io_mut().font_global_scale = (1.0 / hidpi_factor) as f32;

    let mut platform = WinitPlatform::init(&mut imgui);
    platform.attach_window(imgui.io_mut(), &window, HiDpiMode::Default);

    let mut renderer = imgui_glow_renderer::AutoRenderer::initialize(gl, &mut imgui)
        .map_err(|e| anyhow!("Failed to initialize renderer: {}", e))?;

    let mut state = AppState::new(settings, source, runtime.handle().clone());
    if let Some(session) = initial {
        state.open_session(OpenRequest { session, force_refresh: false });
    }

    let mut last_frame_time = Instant::now();
    let mut last_settings_save = Instant::now();
    let mut title = String::new();

    event_loop
        .run(move |event, window_target| {
            match &event {
                Event::NewEvents(_) => {
                    let now = Instant::now();
                    imgui.io_mut().update_delta_time(now - last_frame_time);
                    last_frame_time = now;
                }
                Event::AboutToWait => {
                    state.update();

                    if last_settings_save.elapsed() >= SETTINGS_SAVE_INTERVAL {
                        state.save_settings();
                        last_settings_save = Instant::now();
                    }

                    if let Err(e) = platform.prepare_frame(imgui.io_mut(), &window) {
                        error!("Failed to prepare frame: {}", e);
                        window_target.exit();
                        return;
                    }
                    window.request_redraw();
                }
                Event::WindowEvent { event: WindowEvent::ModifiersChanged(modifiers), .. } => {
                    state.modifiers = modifiers.state();
                }
                Event::WindowEvent { event: WindowEvent::KeyboardInput { event: key_event, .. }, .. } => {
                    if !imgui.io().want_capture_keyboard {
                        let m = state.modifiers;
                        if let Some(action) = state.shortcut_manager.process_event(
                            key_event,
                            m.control_key(),
                            m.shift_key(),
                            m.alt_key(),
                        ) {
                            state.handle_shortcut(action);
                        }
                    }
                }
                Event::WindowEvent { event: WindowEvent::Resized(size), .. } => {
                    if let (Some(w), Some(h)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
                        surface.resize(&context, w, h);
                    }
                }
                Event::WindowEvent { event: WindowEvent::RedrawRequested, .. } => {
                    let ui = imgui.new_frame();
                    let keep_running = state.render(ui);

                    platform.prepare_render(ui, &window);
                    let draw_data = imgui.render();

                    unsafe {
                        gl_clear.clear_color(0.1, 0.1, 0.1, 1.0);
                        gl_clear.clear(glow::COLOR_BUFFER_BIT);
                    }

                    if let Err(e) = renderer.render(draw_data) {
                        error!("Rendering failed: {}", e);
                        window_target.exit();
                        return;
                    }
                    if let Err(e) = surface.swap_buffers(&context) {
                        error!("Failed to swap buffers: {}", e);
                        window_target.exit();
                        return;
                    }

                    let new_title = state.window_title();
                    if new_title != title {
                        window.set_title(&new_title);
                        title = new_title;
                    }

                    if !keep_running {
                        state.save_settings();
                        window_target.exit();
                    }
                }
                Event::WindowEvent { event: WindowEvent::CloseRequested, .. } => {
                    state.save_settings();
                    window_target.exit();
                }
                _ => {}
            }

            platform.handle_event(imgui.io_mut(), &window, &event);
        })
        .map_err(|e| anyhow!("EventLoop error: {}", e))?;

    drop(runtime);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("race-replay").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_args() {
        let args = parse(&[]).unwrap();
        assert!(!args.demo);
        assert!(args.api_url.is_none());
        assert!(args.session.is_none());

        let args = parse(&["--demo", "--api-url", "http://host:9000", "2024/5/Q"]).unwrap();
        assert!(args.demo);
        assert_eq!(args.api_url.as_deref(), Some("http://host:9000"));
        assert_eq!(
            args.session,
            Some(SessionId::new(2024, 5, SessionType::Qualifying))
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse(&["--api-url"]).is_err());
        assert!(parse(&["--fast"]).is_err());
        assert!(parse(&["2024/x/R"]).is_err());
        assert!(parse(&["2024/1/R", "2024/2/R"]).is_err());
    }

    #[test]
    fn test_args_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
