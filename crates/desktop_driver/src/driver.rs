//! Public entry point
//!
//! A [`Driver`] is built from a [`RuntimeConfig`] and the collaborators it
//! talks to, then [`Driver::run`] takes over the calling thread, which becomes
//! the main thread, until the window closes.
//!
//! The driver can be cloned and used from any thread. Before `run`, accessors
//! read and write the configuration under a lock. Once running, they are sent
//! to the main thread through the executor. Settings that only make sense at
//! window creation fail with [`DriverError::AlreadyRunning`] afterwards;
//! queries that need a live window fail with [`DriverError::NotRunning`]
//! before.

use crate::config::{CursorMode, RuntimeConfig};
use crate::error::{DriverError, DriverResult};
use crate::frame::{FrameLoop, GameContext};
use crate::graphics::{GlPresenter, GraphicsBackend};
use crate::hooks::{AudioHooks, NoAudio};
use crate::icon::{IconImage, PendingIcons};
use crate::monitor::{self, DeviceScale};
use crate::platform::{MonitorInfo, Platform};
use crate::thread::{Executor, MainThread};
use crate::window::{slot, WindowPhase, WindowState};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// State shared between the façade, the main thread and the game thread
pub(crate) struct Shared {
    running: AtomicBool,
    pub(crate) config: RwLock<RuntimeConfig>,
    pub(crate) icons: PendingIcons,
    executor: RwLock<Option<Executor>>,
    pub(crate) graphics: Arc<dyn GraphicsBackend>,
    pub(crate) audio: Arc<dyn AudioHooks>,
    pub(crate) scale: Arc<dyn DeviceScale>,
    initial_monitor: Option<MonitorInfo>,
}

impl Shared {
    pub(crate) fn new(
        config: RuntimeConfig,
        graphics: Arc<dyn GraphicsBackend>,
        audio: Arc<dyn AudioHooks>,
        scale: Arc<dyn DeviceScale>,
        initial_monitor: Option<MonitorInfo>,
    ) -> Self {
        Self {
            running: AtomicBool::new(false),
            config: RwLock::new(config),
            icons: PendingIcons::default(),
            executor: RwLock::new(None),
            graphics,
            audio,
            scale,
            initial_monitor,
        }
    }

    pub(crate) fn runnable_on_unfocused(&self) -> bool {
        self.config.read().runnable_on_unfocused
    }

    fn executor(&self) -> Option<Executor> {
        self.executor.read().clone()
    }
}

/// Builder attaching collaborators to a [`Driver`]
pub struct DriverBuilder {
    config: RuntimeConfig,
    graphics: Option<Arc<dyn GraphicsBackend>>,
    audio: Arc<dyn AudioHooks>,
    scale: Option<Arc<dyn DeviceScale>>,
}

impl DriverBuilder {
    /// Start from a configuration
    pub fn new(config: RuntimeConfig) -> Self {
        Self {
            config,
            graphics: None,
            audio: Arc::new(NoAudio),
            scale: None,
        }
    }

    /// Graphics backend; a plain GL presenter by default
    #[must_use]
    pub fn graphics(mut self, graphics: Arc<dyn GraphicsBackend>) -> Self {
        self.graphics = Some(graphics);
        self
    }

    /// Audio hooks; nothing by default
    #[must_use]
    pub fn audio(mut self, audio: Arc<dyn AudioHooks>) -> Self {
        self.audio = audio;
        self
    }

    /// Device-scale provider; the platform's own by default
    #[must_use]
    pub fn device_scale(mut self, scale: Arc<dyn DeviceScale>) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Validate the configuration and snapshot the primary monitor
    pub fn build(self, platform: &mut dyn Platform) -> DriverResult<Driver> {
        self.config.validate()?;
        let initial_monitor = platform.primary_monitor();
        let scale = self.scale.unwrap_or_else(|| platform.device_scale());
        let graphics = self
            .graphics
            .unwrap_or_else(|| Arc::new(GlPresenter::new()));
        log::debug!(
            "Driver built for '{}' (legacy GL: {})",
            self.config.title,
            graphics.is_legacy_gl()
        );
        Ok(Driver {
            shared: Arc::new(Shared::new(
                self.config,
                graphics,
                self.audio,
                scale,
                initial_monitor,
            )),
        })
    }
}

/// Handle to the windowing driver
#[derive(Clone)]
pub struct Driver {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("running", &self.is_running())
            .field("config", &*self.shared.config.read())
            .finish_non_exhaustive()
    }
}

impl Driver {
    /// Whether the main loop is running
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Lifecycle phase of the window; [`WindowPhase::Unstarted`] before `run`
    pub fn phase(&self) -> WindowPhase {
        match self.live(|state| Ok(state.phase())) {
            Some(Ok(phase)) => phase,
            _ => WindowPhase::Unstarted,
        }
    }

    /// Run `f` on the main thread against the live window, if running
    fn live<R, F>(&self, f: F) -> Option<DriverResult<R>>
    where
        R: Send + 'static,
        F: FnOnce(&mut WindowState) -> DriverResult<R> + Send + 'static,
    {
        let executor = self.shared.executor()?;
        Some(slot::call(&executor, f))
    }

    /// Live value when running, configured value otherwise
    fn query<R, F>(&self, what: &str, f: F, configured: impl FnOnce(&RuntimeConfig) -> R) -> R
    where
        R: Send + 'static,
        F: FnOnce(&mut WindowState) -> R + Send + 'static,
    {
        match self.live(move |state| Ok(f(state))) {
            Some(Ok(value)) => value,
            Some(Err(err)) => {
                log::debug!("{} answered from the configuration: {}", what, err);
                configured(&*self.shared.config.read())
            }
            None => configured(&*self.shared.config.read()),
        }
    }

    /// Change a creation-time setting; fails once running
    fn configure(&self, what: &'static str, f: impl FnOnce(&mut RuntimeConfig)) -> DriverResult<()> {
        let mut config = self.shared.config.write();
        if self.is_running() {
            return Err(DriverError::AlreadyRunning(what));
        }
        f(&mut *config);
        Ok(())
    }

    /// Change a setting live when running, in the configuration otherwise
    ///
    /// `run` publishes the executor under the config lock, so a value written
    /// here is either seen by the window or applied to it live, never lost.
    fn adjust<F>(&self, live: F, configured: impl FnOnce(&mut RuntimeConfig)) -> DriverResult<()>
    where
        F: FnOnce(&mut WindowState) -> DriverResult<()> + Send + 'static,
    {
        let mut config = self.shared.config.write();
        let Some(executor) = self.shared.executor() else {
            configured(&mut *config);
            return Ok(());
        };
        // The main thread reads the configuration while serving the call.
        drop(config);
        slot::call(&executor, live)
    }

    /// Window title
    pub fn title(&self) -> String {
        self.query("title", |state| state.title().to_string(), |c| c.title.clone())
    }

    /// Set the window title
    pub fn set_title(&self, title: impl Into<String>) -> DriverResult<()> {
        let title = title.into();
        let queued = title.clone();
        self.adjust(
            move |state| {
                state.set_title(queued);
                Ok(())
            },
            |c| c.title = title,
        )
    }

    /// Whether the window is (or will start) fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.query("is_fullscreen", |state| state.is_fullscreen(), |c| c.fullscreen)
    }

    /// Enter or leave fullscreen
    pub fn set_fullscreen(&self, fullscreen: bool) -> DriverResult<()> {
        self.adjust(
            move |state| state.set_fullscreen(fullscreen),
            |c| c.fullscreen = fullscreen,
        )
    }

    /// Whether vsync is enabled
    pub fn is_vsync_enabled(&self) -> bool {
        self.query("is_vsync_enabled", |state| state.is_vsync_enabled(), |c| c.vsync)
    }

    /// Enable or disable vsync
    ///
    /// Until the first frame has rendered this only changes the initial value.
    pub fn set_vsync_enabled(&self, enabled: bool) -> DriverResult<()> {
        self.adjust(
            move |state| {
                state.set_vsync(enabled);
                Ok(())
            },
            |c| c.vsync = enabled,
        )
    }

    /// Whether the game keeps running while the window is unfocused
    pub fn is_runnable_on_unfocused(&self) -> bool {
        self.shared.runnable_on_unfocused()
    }

    /// Keep running (or pause) while the window is unfocused
    pub fn set_runnable_on_unfocused(&self, runnable: bool) {
        self.shared.config.write().runnable_on_unfocused = runnable;
    }

    /// Cursor mode
    pub fn cursor_mode(&self) -> CursorMode {
        self.query("cursor_mode", |state| state.cursor_mode(), |c| c.cursor_mode)
    }

    /// Show, hide or capture the cursor
    pub fn set_cursor_mode(&self, mode: CursorMode) -> DriverResult<()> {
        self.adjust(
            move |state| {
                state.set_cursor_mode(mode);
                Ok(())
            },
            |c| c.cursor_mode = mode,
        )
    }

    /// Video-mode size of the current monitor in logical pixels
    ///
    /// Before the loop starts this uses the primary monitor seen at build time.
    pub fn screen_size_in_fullscreen(&self) -> (i32, i32) {
        let fallback = |shared: &Shared| {
            shared.initial_monitor.as_ref().map_or((0, 0), |m| {
                let scale = shared.scale.scale_factor_at(m.x, m.y);
                (
                    monitor::from_native(f64::from(m.video_mode.width), scale) as i32,
                    monitor::from_native(f64::from(m.video_mode.height), scale) as i32,
                )
            })
        };
        match self.live(|state| Ok(state.screen_size_in_fullscreen())) {
            Some(Ok(size)) => size,
            _ => fallback(&self.shared),
        }
    }

    /// Scale factor of the monitor holding the window
    pub fn device_scale_factor(&self) -> f64 {
        match self.live(|state| Ok(state.device_scale_factor())) {
            Some(Ok(scale)) => scale,
            _ => self
                .shared
                .initial_monitor
                .as_ref()
                .map_or(1.0, |m| self.shared.scale.scale_factor_at(m.x, m.y)),
        }
    }

    /// Whether the window has input focus; `false` before the loop starts
    pub fn is_focused(&self) -> bool {
        matches!(self.live(|state| Ok(state.is_focused())), Some(Ok(true)))
    }

    /// Origin of the window's current monitor in virtual screen coordinates
    pub fn monitor_position(&self) -> DriverResult<(i32, i32)> {
        self.live(|state| Ok(state.monitor_position()))
            .unwrap_or(Err(DriverError::NotRunning("monitor_position")))
    }

    /// Window position as a logical offset from its monitor
    ///
    /// `None` before the loop starts if no position was configured.
    pub fn window_position(&self) -> Option<(i32, i32)> {
        self.query(
            "window_position",
            |state| Some(state.position()),
            |c| c.position,
        )
    }

    /// Initial window position as a logical offset from the monitor
    pub fn set_window_position(&self, x: i32, y: i32) -> DriverResult<()> {
        self.configure("set_window_position", |c| c.position = Some((x, y)))
    }

    /// Windowed size in logical pixels
    pub fn window_size(&self) -> (i32, i32) {
        self.query(
            "window_size",
            WindowState::windowed_size,
            |c| (c.width, c.height),
        )
    }

    /// Initial window size in logical pixels
    pub fn set_window_size(&self, width: i32, height: i32) -> DriverResult<()> {
        if width <= 0 || height <= 0 {
            return Err(crate::config::ConfigError::Invalid(format!(
                "window size must be positive, got {width}x{height}"
            ))
            .into());
        }
        self.configure("set_window_size", |c| {
            c.width = width;
            c.height = height;
        })
    }

    /// Whether the window has decorations
    pub fn is_decorated(&self) -> bool {
        self.query("is_decorated", |state| state.is_decorated(), |c| c.decorated)
    }

    /// Create the window with or without decorations
    pub fn set_decorated(&self, decorated: bool) -> DriverResult<()> {
        self.configure("set_decorated", |c| c.decorated = decorated)
    }

    /// Whether the user can resize the window
    pub fn is_resizable(&self) -> bool {
        self.query("is_resizable", |state| state.is_resizable(), |c| c.resizable)
    }

    /// Create the window user-resizable
    pub fn set_resizable(&self, resizable: bool) -> DriverResult<()> {
        self.configure("set_resizable", |c| c.resizable = resizable)
    }

    /// Whether the window is created always-on-top
    pub fn is_floating(&self) -> bool {
        self.shared.config.read().floating
    }

    /// Create the window always-on-top
    pub fn set_floating(&self, floating: bool) -> DriverResult<()> {
        self.configure("set_floating", |c| c.floating = floating)
    }

    /// Whether the window is maximized after creation
    pub fn is_maximized(&self) -> bool {
        self.shared.config.read().maximized
    }

    /// Maximize the window after creation
    pub fn set_maximized(&self, maximized: bool) -> DriverResult<()> {
        self.configure("set_maximized", |c| c.maximized = maximized)
    }

    /// Whether the window takes focus when first shown
    pub fn is_initially_focused(&self) -> bool {
        self.shared.config.read().focused
    }

    /// Take focus when the window is first shown
    pub fn set_initially_focused(&self, focused: bool) -> DriverResult<()> {
        self.configure("set_initially_focused", |c| c.focused = focused)
    }

    /// Whether the framebuffer is transparent
    pub fn is_screen_transparent(&self) -> bool {
        self.query(
            "is_screen_transparent",
            |state| state.is_transparent(),
            |c| c.transparent,
        )
    }

    /// Create the window with a transparent framebuffer
    pub fn set_screen_transparent(&self, transparent: bool) -> DriverResult<()> {
        self.configure("set_screen_transparent", |c| c.transparent = transparent)
    }

    /// Replace the window icon candidates
    ///
    /// The images are converted and applied by the next frame. An empty list
    /// restores the default icon.
    pub fn set_icon_images(&self, icons: Vec<Arc<dyn IconImage>>) {
        self.shared.icons.set(icons);
    }

    /// Open the window and run `game` until the window is closed
    ///
    /// The calling thread becomes the main thread: it owns the window and
    /// serves native calls, while `game` runs on a separate thread. Returns
    /// `Ok(())` when the user closed the window.
    pub fn run<P, G>(&self, platform: P, game: G) -> DriverResult<()>
    where
        P: Platform + 'static,
        G: GameContext,
    {
        let main = MainThread::new();
        {
            // Creation-time setters check the flag under this lock.
            let _config = self.shared.config.write();
            if self.shared.running.swap(true, Ordering::AcqRel) {
                return Err(DriverError::AlreadyRunning("run"));
            }
            *self.shared.executor.write() = Some(main.executor());
        }
        log::info!("Starting main loop");
        let result = self.run_on_main(main, Box::new(platform), game);
        *self.shared.executor.write() = None;
        self.shared.running.store(false, Ordering::Release);
        result
    }

    fn run_on_main<G: GameContext>(
        &self,
        main: MainThread,
        platform: Box<dyn Platform>,
        game: G,
    ) -> DriverResult<()> {
        let token = main.token();
        let mut state = WindowState::new(platform, Arc::clone(&self.shared));
        state.create()?;
        slot::install(token, state);

        let frame_loop = FrameLoop::new(main.executor(), Arc::clone(&self.shared), game);
        let spawned = thread::Builder::new()
            .name("game".into())
            .spawn(move || frame_loop.run());
        let game_thread = match spawned {
            Ok(handle) => handle,
            Err(err) => {
                if let Some(mut state) = slot::take(token) {
                    state.destroy();
                }
                return Err(DriverError::Spawn(err));
            }
        };

        let served = main.serve();
        log::debug!("Main thread served {} call(s)", served);
        let result = game_thread
            .join()
            .map_err(|_| DriverError::GameThreadPanicked)
            .and_then(|result| result);
        if let Some(mut state) = slot::take(token) {
            state.destroy();
        }
        result
    }
}
