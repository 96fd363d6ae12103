//! Live window state
//!
//! [`WindowState`] owns the platform and the monitor cache and tracks
//! everything the driver knows about the native window once the main loop has
//! started. It only ever exists on the main thread (see [`slot`]).
//!
//! Sizes are kept in native pixels. The logical size the game sees is derived
//! from them with the device scale of the monitor the window is on.

pub(crate) mod slot;
mod transition;

use crate::config::{CursorMode, RuntimeConfig};
use crate::driver::Shared;
use crate::error::{DriverError, DriverResult};
use crate::input::InputEvent;
use crate::monitor::{self, MonitorCache};
use crate::platform::{ClientApi, MonitorInfo, Platform, WindowEvent, WindowHints};
use image::RgbaImage;
use std::sync::Arc;

/// Width and height of the placeholder window created before the real size is applied
const INITIAL_WINDOW_SIZE: i32 = 16;

/// Where the window is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPhase {
    /// No native window yet
    Unstarted,
    /// Detached from any monitor
    Windowed,
    /// Assigned to a monitor
    Fullscreen,
    /// Between the two; size notifications are ignored
    Transitioning,
}

/// Main-thread state of the running driver
pub(crate) struct WindowState {
    platform: Box<dyn Platform>,
    monitors: MonitorCache,
    shared: Arc<Shared>,
    /// Creation-time settings, frozen when the loop starts
    config: RuntimeConfig,
    title: String,
    /// Re-applied when the window is recreated
    cursor_mode: CursorMode,
    /// Windowed size in native pixels; kept while fullscreen for the way back
    width: i32,
    height: i32,
    last_scale: f64,
    /// Windowed position saved on entering fullscreen
    saved_position: Option<(i32, i32)>,
    vsync: bool,
    vsync_inited: bool,
    pending_fullscreen: bool,
    to_change_size: bool,
    size_callback_registered: bool,
    position_set: bool,
    transitioning: bool,
    events: Vec<WindowEvent>,
    pub(crate) error: Option<DriverError>,
    pub(crate) audio_suspended: bool,
}

impl std::fmt::Debug for WindowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WindowState")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("phase", &self.phase())
            .field("vsync", &self.vsync)
            .finish_non_exhaustive()
    }
}

impl WindowState {
    /// Take ownership of the platform; no window is created yet
    pub(crate) fn new(mut platform: Box<dyn Platform>, shared: Arc<Shared>) -> Self {
        let mut monitors = MonitorCache::default();
        monitors.rebuild(platform.as_mut());
        let config = shared.config.read().clone();
        Self {
            platform,
            monitors,
            title: config.title.clone(),
            cursor_mode: config.cursor_mode,
            vsync: config.vsync,
            pending_fullscreen: config.fullscreen,
            config,
            shared,
            width: 0,
            height: 0,
            last_scale: 0.0,
            saved_position: None,
            vsync_inited: false,
            to_change_size: false,
            size_callback_registered: false,
            position_set: false,
            transitioning: false,
            events: Vec::new(),
            error: None,
            audio_suspended: false,
        }
    }

    pub(crate) const fn shared(&self) -> &Arc<Shared> {
        &self.shared
    }

    /// Create the native window and apply the initial geometry
    pub(crate) fn create(&mut self) -> DriverResult<()> {
        let graphics = Arc::clone(&self.shared.graphics);
        graphics.set_transparent(self.config.transparent);
        self.create_native_window()?;
        self.register_size_callback();

        let (width, height) = (self.config.width, self.config.height);
        let position = self.config.position;
        // X11 needs the size before the position; Windows the other way round.
        if cfg!(target_os = "windows") {
            self.apply_initial_position(position);
            self.apply_initial_size(width, height)?;
        } else {
            self.apply_initial_size(width, height)?;
            self.apply_initial_position(position);
        }

        if self.config.maximized {
            self.platform.maximize();
        }
        self.platform.set_title(&self.title);
        self.platform.show();
        if let Some(handle) = self.platform.native_handle() {
            graphics.bind_native_window(handle);
        }
        log::info!(
            "Window '{}' created at {}x{} native pixels",
            self.title,
            self.width,
            self.height
        );
        Ok(())
    }

    fn hints(&self) -> WindowHints {
        WindowHints {
            client_api: if self.shared.graphics.is_legacy_gl() {
                ClientApi::OpenGl
            } else {
                ClientApi::NoApi
            },
            decorated: self.config.decorated,
            transparent: self.config.transparent,
            resizable: self.config.resizable,
            floating: self.config.floating,
            focus_on_show: self.config.focused,
            // Wayland only maps windows that are visible at creation.
            visible: std::env::var_os("WAYLAND_DISPLAY").is_some(),
        }
    }

    /// Create a bare native window with the configured hints
    fn create_native_window(&mut self) -> DriverResult<()> {
        debug_assert!(!self.platform.has_window(), "native window already exists");
        let hints = self.hints();
        self.platform
            .create_window(INITIAL_WINDOW_SIZE, INITIAL_WINDOW_SIZE, &hints)?;
        if hints.client_api == ClientApi::OpenGl {
            self.platform.make_context_current();
        }
        self.platform.set_sticky_input(true);
        self.platform.set_cursor_mode(self.cursor_mode);
        self.platform.set_title(&self.title);
        log::debug!("Native window created with {:?}", hints);
        Ok(())
    }

    fn apply_initial_size(&mut self, width: i32, height: i32) -> DriverResult<()> {
        let width = self.to_native(f64::from(width));
        let height = self.to_native(f64::from(height));
        let fullscreen = self.is_fullscreen();
        self.set_window_size(width, height, fullscreen)
    }

    /// Place the window at a logical offset from its monitor, or center it
    fn apply_initial_position(&mut self, position: Option<(i32, i32)>) {
        let Some(monitor) = self.current_monitor() else {
            log::warn!("No monitor available; leaving the window where the OS put it");
            return;
        };
        let scale = self.device_scale_factor();
        let (x, y) = match position {
            Some((x, y)) => (
                monitor.x + monitor::to_native(f64::from(x), scale),
                monitor.y + monitor::to_native(f64::from(y), scale),
            ),
            None => {
                let width = monitor::to_native(f64::from(self.config.width), scale);
                let height = monitor::to_native(f64::from(self.config.height), scale);
                (
                    monitor.x + (monitor.video_mode.width - width) / 2,
                    monitor.y + (monitor.video_mode.height - height) / 2,
                )
            }
        };
        self.platform.set_window_pos(x, y);
        self.position_set = position.is_some();
    }

    /// Destroy the native window
    pub(crate) fn destroy(&mut self) {
        if self.platform.has_window() {
            self.platform.destroy_window();
            log::info!("Window '{}' destroyed", self.title);
        }
    }

    pub(crate) fn phase(&self) -> WindowPhase {
        if self.transitioning {
            WindowPhase::Transitioning
        } else if !self.platform.has_window() {
            WindowPhase::Unstarted
        } else if self.platform.window_monitor().is_some() {
            WindowPhase::Fullscreen
        } else {
            WindowPhase::Windowed
        }
    }

    /// Whether the window is assigned to a monitor
    pub(crate) fn is_fullscreen(&self) -> bool {
        self.platform.window_monitor().is_some()
    }

    /// Monitor the window currently belongs to
    pub(crate) fn current_monitor(&mut self) -> Option<MonitorInfo> {
        self.monitors.current_monitor(self.platform.as_mut())
    }

    /// Scale factor of the monitor holding the window
    pub(crate) fn device_scale_factor(&mut self) -> f64 {
        let scale = Arc::clone(&self.shared.scale);
        if self.position_set {
            let (x, y) = self.platform.window_pos();
            if let Some(m) = self.monitors.lookup_by_point(x, y) {
                return scale.scale_factor_at(m.x, m.y);
            }
        }
        self.current_monitor()
            .map_or(1.0, |m| scale.scale_factor_at(m.x, m.y))
    }

    pub(crate) fn to_native(&mut self, logical: f64) -> i32 {
        monitor::to_native(logical, self.device_scale_factor())
    }

    pub(crate) fn from_native(&mut self, native: i32) -> f64 {
        monitor::from_native(f64::from(native), self.device_scale_factor())
    }

    /// Size of the window as it is on screen, in native pixels
    pub(crate) fn native_size(&mut self) -> (i32, i32) {
        if self.is_fullscreen() {
            if let Some(m) = self.current_monitor() {
                return (m.video_mode.width, m.video_mode.height);
            }
        }
        self.platform.window_size()
    }

    /// Size of the window in logical pixels
    pub(crate) fn logical_size(&mut self) -> (f64, f64) {
        let (width, height) = self.native_size();
        (self.from_native(width), self.from_native(height))
    }

    /// Re-apply the tracked size and report the new logical size if it changed
    pub(crate) fn update_size(&mut self) -> DriverResult<Option<(f64, f64)>> {
        let fullscreen = self.is_fullscreen();
        self.set_window_size(self.width, self.height, fullscreen)?;
        if !self.to_change_size {
            return Ok(None);
        }
        self.to_change_size = false;
        Ok(Some(self.logical_size()))
    }

    /// Apply the first-frame fullscreen request, once
    pub(crate) fn apply_pending_fullscreen(&mut self) -> DriverResult<()> {
        if !std::mem::take(&mut self.pending_fullscreen) {
            return Ok(());
        }
        let (width, height) = self.platform.window_size();
        self.set_window_size(width, height, true)
    }

    pub(crate) fn set_fullscreen(&mut self, fullscreen: bool) -> DriverResult<()> {
        self.pending_fullscreen = false;
        if self.is_fullscreen() == fullscreen {
            return Ok(());
        }
        self.set_window_size(self.width, self.height, fullscreen)
    }

    /// Window position as a logical offset from its current monitor
    pub(crate) fn position(&mut self) -> (i32, i32) {
        let (x, y) = self
            .saved_position
            .filter(|_| self.is_fullscreen())
            .unwrap_or_else(|| self.platform.window_pos());
        let Some(monitor) = self.current_monitor() else {
            return (x, y);
        };
        let dx = self.from_native(x - monitor.x);
        let dy = self.from_native(y - monitor.y);
        (dx as i32, dy as i32)
    }

    /// Resize the windowed window to a logical size
    pub(crate) fn resize(&mut self, width: i32, height: i32) -> DriverResult<()> {
        let width = self.to_native(f64::from(width));
        let height = self.to_native(f64::from(height));
        let fullscreen = self.is_fullscreen();
        self.set_window_size(width, height, fullscreen)
    }

    /// Windowed size in logical pixels, even while fullscreen
    pub(crate) fn windowed_size(&mut self) -> (i32, i32) {
        let (width, height) = (self.width, self.height);
        (self.from_native(width) as i32, self.from_native(height) as i32)
    }

    /// Monitor video mode in logical pixels
    pub(crate) fn screen_size_in_fullscreen(&mut self) -> (i32, i32) {
        let Some(m) = self.current_monitor() else {
            return (0, 0);
        };
        let scale = self.shared.scale.scale_factor_at(m.x, m.y);
        (
            monitor::from_native(f64::from(m.video_mode.width), scale) as i32,
            monitor::from_native(f64::from(m.video_mode.height), scale) as i32,
        )
    }

    pub(crate) fn monitor_position(&mut self) -> (i32, i32) {
        self.current_monitor().map_or((0, 0), |m| (m.x, m.y))
    }

    pub(crate) fn title(&self) -> &str {
        &self.title
    }

    pub(crate) fn set_title(&mut self, title: String) {
        self.platform.set_title(&title);
        self.title = title;
    }

    /// Cursor mode as the platform reports it
    pub(crate) fn cursor_mode(&self) -> CursorMode {
        self.platform.cursor_mode()
    }

    pub(crate) fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.cursor_mode = mode;
        self.platform.set_cursor_mode(mode);
    }

    pub(crate) fn is_focused(&self) -> bool {
        self.platform.is_focused()
    }

    /// Focus as seen by the suspension and throttling paths
    ///
    /// Windows reports focus loss spuriously around fullscreen switches, so
    /// the window counts as focused there.
    pub(crate) fn has_effective_focus(&self) -> bool {
        cfg!(target_os = "windows") || self.platform.is_focused()
    }

    pub(crate) fn is_decorated(&self) -> bool {
        self.platform.is_decorated()
    }

    pub(crate) fn is_resizable(&self) -> bool {
        self.platform.is_resizable()
    }

    pub(crate) fn is_transparent(&self) -> bool {
        self.platform.is_transparent()
    }

    pub(crate) fn should_close(&self) -> bool {
        self.platform.should_close()
    }

    pub(crate) const fn is_vsync_enabled(&self) -> bool {
        self.vsync
    }

    /// Switch vsync; before the first frame only the initial value changes
    pub(crate) fn set_vsync(&mut self, enabled: bool) {
        self.vsync = enabled;
        if self.vsync_inited {
            self.update_vsync();
        } else {
            self.shared.config.write().vsync = enabled;
        }
    }

    /// Apply the initial vsync setting on the first frame
    pub(crate) fn init_vsync(&mut self) {
        if self.vsync_inited {
            return;
        }
        self.vsync = self.shared.config.read().vsync;
        self.vsync_inited = true;
        self.update_vsync();
    }

    fn update_vsync(&mut self) {
        if self.shared.graphics.is_legacy_gl() {
            self.platform.set_swap_interval(u32::from(self.vsync));
        }
        self.shared.graphics.set_vsync_enabled(self.vsync);
        log::debug!("Vsync {}", if self.vsync { "enabled" } else { "disabled" });
    }

    /// Present the back buffer when the backend relies on the driver for it
    pub(crate) fn swap_buffers(&mut self) {
        if self.shared.graphics.is_legacy_gl() {
            self.platform.swap_buffers();
        }
    }

    pub(crate) fn set_icons(&mut self, icons: Vec<RgbaImage>) {
        log::debug!("Applying {} window icon(s)", icons.len());
        self.platform.set_icon(icons);
    }

    /// Process OS events and collect what they produced
    pub(crate) fn poll_events(&mut self) {
        self.platform.poll_events();
        self.pull_events();
    }

    /// Drain platform events into the buffer
    ///
    /// Size notifications are dropped while the size callback is
    /// unregistered. Returns whether a framebuffer resize was seen.
    fn pull_events(&mut self) -> bool {
        if self.platform.take_monitor_change() {
            self.monitors.rebuild(self.platform.as_mut());
        }
        let mut resized = false;
        for event in self.platform.drain_events() {
            match event {
                WindowEvent::FramebufferSize(..) => resized = true,
                WindowEvent::Size(..) if !self.size_callback_registered => {}
                other => self.events.push(other),
            }
        }
        resized
    }

    fn register_size_callback(&mut self) {
        self.size_callback_registered = true;
    }

    fn unregister_size_callback(&mut self) {
        self.size_callback_registered = false;
    }

    /// Follow a size change made by the user dragging the window edges
    ///
    /// Returns whether the tracked size changed.
    pub(crate) fn apply_user_resizes(&mut self) -> DriverResult<bool> {
        let mut latest = None;
        self.events.retain(|event| match event {
            WindowEvent::Size(width, height) => {
                latest = Some((*width, *height));
                false
            }
            _ => true,
        });
        let Some((width, height)) = latest else {
            return Ok(false);
        };
        if !self.is_resizable() || self.is_fullscreen() {
            return Ok(false);
        }
        // Minimizing reports a zero size.
        if width == 0 && height == 0 {
            return Ok(false);
        }
        log::debug!("User resized the window to {}x{}", width, height);
        self.set_window_size(width, height, false)?;
        Ok(self.to_change_size)
    }

    /// Input gathered since the last frame, in arrival order
    pub(crate) fn take_input(&mut self) -> Vec<InputEvent> {
        let mut input = Vec::new();
        self.events.retain(|event| match event {
            WindowEvent::Input(e) => {
                input.push(e.clone());
                false
            }
            WindowEvent::Focus(_) | WindowEvent::Close => false,
            _ => true,
        });
        input
    }
}
