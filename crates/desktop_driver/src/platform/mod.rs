//! Native windowing abstraction
//!
//! [`Platform`] is the narrow contract between the driver and the operating
//! system's windowing layer: monitor enumeration, a single native window,
//! event polling and buffer presentation. Every method must be called on the
//! main thread; implementations are not `Send` and the driver keeps them in
//! main-thread-only storage.
//!
//! Backends:
//! - [`GlfwPlatform`]: the production implementation over GLFW
//! - `MockPlatform` (tests only): scriptable, records every call

mod glfw_backend;
#[cfg(test)]
pub(crate) mod mock;

pub use glfw_backend::GlfwPlatform;

use crate::config::CursorMode;
use crate::error::DriverResult;
use crate::input::InputEvent;
use crate::monitor::{DeviceScale, FixedScale};
use image::RgbaImage;
use std::sync::Arc;

/// Identifies a monitor within the platform's current enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitorId(pub usize);

/// Resolution and refresh rate of a monitor, in native pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMode {
    /// Width in native pixels
    pub width: i32,
    /// Height in native pixels
    pub height: i32,
    /// Refresh rate in Hz
    pub refresh_rate: u32,
}

/// Snapshot of one connected monitor
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    /// Platform handle
    pub id: MonitorId,
    /// Human readable name
    pub name: String,
    /// Left edge in virtual screen coordinates
    pub x: i32,
    /// Top edge in virtual screen coordinates
    pub y: i32,
    /// Current video mode
    pub video_mode: VideoMode,
    /// Content scale reported by the OS
    pub content_scale: f64,
}

impl MonitorInfo {
    /// Whether the point lies inside this monitor's rectangle
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        self.x <= x
            && x < self.x + self.video_mode.width
            && self.y <= y
            && y < self.y + self.video_mode.height
    }

    /// Area shared with the rectangle at `pos` with `size`, in native pixels
    pub fn overlap_area(&self, pos: (i32, i32), size: (i32, i32)) -> i64 {
        let left = self.x.max(pos.0);
        let right = (self.x + self.video_mode.width).min(pos.0 + size.0);
        let top = self.y.max(pos.1);
        let bottom = (self.y + self.video_mode.height).min(pos.1 + size.1);
        if right <= left || bottom <= top {
            return 0;
        }
        i64::from(right - left) * i64::from(bottom - top)
    }
}

/// Monitor covering most of the rectangle at `pos` with `size`
///
/// Ties go to the monitor enumerated first. `None` if the rectangle is on no
/// monitor at all.
pub(crate) fn largest_overlap(
    monitors: &[MonitorInfo],
    pos: (i32, i32),
    size: (i32, i32),
) -> Option<MonitorId> {
    let mut best: Option<(MonitorId, i64)> = None;
    for monitor in monitors {
        let area = monitor.overlap_area(pos, size);
        if area > 0 && best.map_or(true, |(_, most)| area > most) {
            best = Some((monitor.id, area));
        }
    }
    best.map(|(id, _)| id)
}

/// Which client API the window's context is created for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientApi {
    /// OpenGL 2.1 context
    OpenGl,
    /// No context; the graphics backend presents on its own
    NoApi,
}

/// Hints applied before creating the native window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHints {
    /// Context kind
    pub client_api: ClientApi,
    /// Window decorations
    pub decorated: bool,
    /// Transparent framebuffer
    pub transparent: bool,
    /// User resizable
    pub resizable: bool,
    /// Always on top
    pub floating: bool,
    /// Take focus when shown
    pub focus_on_show: bool,
    /// Create the window visible
    pub visible: bool,
}

/// Opaque native window handle handed to graphics backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeWindowHandle(pub usize);

/// Window-level events drained from the platform
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// Window size changed (screen coordinates)
    Size(i32, i32),
    /// Framebuffer size changed (native pixels)
    FramebufferSize(i32, i32),
    /// Focus gained or lost
    Focus(bool),
    /// Close requested
    Close,
    /// Keyboard, mouse or text input
    Input(InputEvent),
}

/// Main-thread-only access to the native windowing system
///
/// The platform owns at most one window. Window methods are no-ops (or
/// return neutral values) while no window exists.
pub trait Platform {
    /// Enumerate connected monitors
    fn monitors(&mut self) -> Vec<MonitorInfo>;

    /// The system's primary monitor
    fn primary_monitor(&mut self) -> Option<MonitorInfo>;

    /// Whether monitors were connected or disconnected since the last call
    fn take_monitor_change(&mut self) -> bool;

    /// Device-scale provider matching this platform
    fn device_scale(&self) -> Arc<dyn DeviceScale> {
        Arc::new(FixedScale(1.0))
    }

    /// Process pending OS events
    fn poll_events(&mut self);

    /// Take the window events gathered by the last polls
    fn drain_events(&mut self) -> Vec<WindowEvent>;

    /// Create the (single) native window
    fn create_window(&mut self, width: i32, height: i32, hints: &WindowHints) -> DriverResult<()>;

    /// Destroy the native window
    fn destroy_window(&mut self);

    /// Whether a native window exists
    fn has_window(&self) -> bool;

    /// Make the window's GL context current on this thread
    fn make_context_current(&mut self);

    /// Window position in screen coordinates
    fn window_pos(&self) -> (i32, i32);

    /// Move the window
    fn set_window_pos(&mut self, x: i32, y: i32);

    /// Window client size
    fn window_size(&self) -> (i32, i32);

    /// Request a new client size; the platform may apply it asynchronously
    fn set_window_size(&mut self, width: i32, height: i32);

    /// Monitor the window is assigned to in fullscreen, if any
    fn window_monitor(&self) -> Option<MonitorId>;

    /// Assign the window to a monitor (fullscreen) or detach it (windowed)
    fn set_window_monitor(
        &mut self,
        monitor: Option<MonitorId>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        refresh_rate: Option<u32>,
    );

    /// Ask the OS which monitor holds most of the window's bounds
    fn monitor_under_window(&mut self) -> Option<MonitorId>;

    /// Whether the close flag is set
    fn should_close(&self) -> bool;

    /// Whether the window has input focus
    fn is_focused(&self) -> bool;

    /// Whether the window has decorations
    fn is_decorated(&self) -> bool;

    /// Whether the window is user resizable
    fn is_resizable(&self) -> bool;

    /// Whether the framebuffer is transparent
    fn is_transparent(&self) -> bool;

    /// Current cursor mode
    fn cursor_mode(&self) -> CursorMode;

    /// Change the cursor mode
    fn set_cursor_mode(&mut self, mode: CursorMode);

    /// Keep key and mouse button presses until they are polled
    fn set_sticky_input(&mut self, sticky: bool);

    /// Set the window title
    fn set_title(&mut self, title: &str);

    /// Set the window icon candidates
    fn set_icon(&mut self, icons: Vec<RgbaImage>);

    /// Make the window visible
    fn show(&mut self);

    /// Maximize the window
    fn maximize(&mut self);

    /// Present the back buffer (GL contexts only)
    fn swap_buffers(&mut self);

    /// Set the GL swap interval
    fn set_swap_interval(&mut self, interval: u32);

    /// Raw handle for graphics backends
    fn native_handle(&self) -> Option<NativeWindowHandle>;
}
