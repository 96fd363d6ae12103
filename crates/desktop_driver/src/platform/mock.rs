//! Scriptable platform for tests
//!
//! All state sits behind an `Arc<Mutex<_>>` so a [`MockHandle`] can script
//! the platform from the game thread and inspect it after the loop ends,
//! while the [`MockPlatform`] itself stays on the main thread.

use super::{
    largest_overlap, ClientApi, MonitorId, MonitorInfo, NativeWindowHandle, Platform, VideoMode,
    WindowEvent, WindowHints,
};
use crate::config::CursorMode;
use crate::error::{DriverError, DriverResult};
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;

/// Calls recorded by the mock, in order
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    CreateWindow(i32, i32),
    DestroyWindow,
    SetPos(i32, i32),
    SetSize(i32, i32),
    SetMonitor(Option<MonitorId>, i32, i32),
    SwapBuffers,
    SwapInterval(u32),
    Show,
    Maximize,
    SetTitle(String),
    SetIcon(Vec<(u32, u32)>),
    MakeCurrent,
    PollEvents,
}

#[derive(Debug, Clone)]
pub(crate) struct MockWindow {
    pub pos: (i32, i32),
    pub size: (i32, i32),
    pub monitor: Option<MonitorId>,
    pub hints: WindowHints,
    pub cursor_mode: CursorMode,
    pub sticky: bool,
    pub focused: bool,
    pub title: String,
    pub visible: bool,
    pub maximized: bool,
}

#[derive(Debug, Default)]
pub(crate) struct MockState {
    pub monitors: Vec<MonitorInfo>,
    pub primary: usize,
    pub monitor_changed: bool,
    pub os_monitor: Option<MonitorId>,
    /// Answer the OS monitor query from the window bounds
    pub os_uses_bounds: bool,
    pub window: Option<MockWindow>,
    pub pending_events: Vec<WindowEvent>,
    pub ready_events: Vec<WindowEvent>,
    pub calls: Vec<Call>,
    /// Windows created so far; never reset, unlike `calls`
    pub windows_created: usize,
    pub polls: usize,
    pub close_after_polls: Option<usize>,
    pub close_requested: bool,
    pub refocus_at_poll: Option<usize>,
    pub fail_window_creation: bool,
    pub icons: Vec<RgbaImage>,
    /// Position pinned by tests; overrides the live window position
    pub pinned_pos: Option<(i32, i32)>,
}

impl MockState {
    fn window_mut(&mut self) -> Option<&mut MockWindow> {
        self.window.as_mut()
    }

    fn monitor(&self, id: MonitorId) -> Option<&MonitorInfo> {
        self.monitors.iter().find(|m| m.id == id)
    }
}

/// Cloneable, `Send` view of the mock state
#[derive(Debug, Clone, Default)]
pub(crate) struct MockHandle(pub Arc<Mutex<MockState>>);

impl MockHandle {
    pub fn set_monitors(&self, monitors: Vec<MonitorInfo>) {
        let mut state = self.0.lock();
        state.monitors = monitors;
        state.monitor_changed = true;
    }

    pub fn set_window_pos(&self, x: i32, y: i32) {
        let mut state = self.0.lock();
        state.pinned_pos = Some((x, y));
        if let Some(window) = state.window_mut() {
            window.pos = (x, y);
        }
    }

    pub fn set_os_monitor(&self, monitor: Option<MonitorId>) {
        self.0.lock().os_monitor = monitor;
    }

    pub fn set_assigned_monitor(&self, monitor: Option<MonitorId>) {
        let mut state = self.0.lock();
        if state.window.is_none() {
            state.window = Some(MockWindow::detached());
        }
        if let Some(window) = state.window_mut() {
            window.monitor = monitor;
        }
    }

    pub fn report_monitor_from_bounds(&self) {
        self.0.lock().os_uses_bounds = true;
    }

    pub fn close_after_polls(&self, polls: usize) {
        self.0.lock().close_after_polls = Some(polls);
    }

    pub fn request_close(&self) {
        self.0.lock().close_requested = true;
    }

    /// Drop focus now and give it back after `polls` more event polls
    pub fn lose_focus_for(&self, polls: usize) {
        let mut state = self.0.lock();
        let refocus = state.polls + polls;
        state.refocus_at_poll = Some(refocus);
        if let Some(window) = state.window_mut() {
            window.focused = false;
        }
    }

    pub fn push_event(&self, event: WindowEvent) {
        self.0.lock().pending_events.push(event);
    }

    pub fn fail_window_creation(&self) {
        self.0.lock().fail_window_creation = true;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.0.lock().calls.clear();
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn window(&self) -> Option<MockWindow> {
        self.0.lock().window.clone()
    }

    pub fn icons(&self) -> Vec<RgbaImage> {
        self.0.lock().icons.clone()
    }
}

impl MockWindow {
    fn detached() -> Self {
        Self {
            pos: (0, 0),
            size: (16, 16),
            monitor: None,
            hints: WindowHints {
                client_api: ClientApi::NoApi,
                decorated: true,
                transparent: false,
                resizable: false,
                floating: false,
                focus_on_show: true,
                visible: false,
            },
            cursor_mode: CursorMode::Visible,
            sticky: false,
            focused: true,
            title: String::new(),
            visible: false,
            maximized: false,
        }
    }
}

/// Platform double driven by a [`MockHandle`]
#[derive(Debug, Default)]
pub(crate) struct MockPlatform {
    state: MockHandle,
}

impl MockPlatform {
    /// One 1920x1080 monitor at the origin
    pub fn new() -> Self {
        Self::with_monitors(vec![MonitorInfo {
            id: MonitorId(0),
            name: "mock".into(),
            x: 0,
            y: 0,
            video_mode: VideoMode { width: 1920, height: 1080, refresh_rate: 60 },
            content_scale: 1.0,
        }])
    }

    pub fn with_monitors(monitors: Vec<MonitorInfo>) -> Self {
        let platform = Self::default();
        platform.state.0.lock().monitors = monitors;
        platform
    }

    pub fn handle(&self) -> MockHandle {
        self.state.clone()
    }

    fn record(&self, call: Call) {
        self.state.0.lock().calls.push(call);
    }

    fn with_window<R>(&self, default: R, f: impl FnOnce(&MockWindow) -> R) -> R {
        self.state.0.lock().window.as_ref().map_or(default, f)
    }

    fn with_window_mut(&self, f: impl FnOnce(&mut MockWindow, &mut Vec<WindowEvent>)) {
        let mut state = self.state.0.lock();
        let state = &mut *state;
        if let Some(window) = state.window.as_mut() {
            f(window, &mut state.pending_events);
        }
    }
}

impl Platform for MockPlatform {
    fn monitors(&mut self) -> Vec<MonitorInfo> {
        self.state.0.lock().monitors.clone()
    }

    fn primary_monitor(&mut self) -> Option<MonitorInfo> {
        let state = self.state.0.lock();
        state.monitors.get(state.primary).cloned()
    }

    fn take_monitor_change(&mut self) -> bool {
        std::mem::take(&mut self.state.0.lock().monitor_changed)
    }

    fn poll_events(&mut self) {
        let mut state = self.state.0.lock();
        state.polls += 1;
        state.calls.push(Call::PollEvents);
        let polls = state.polls;
        if state.refocus_at_poll.is_some_and(|at| polls >= at) {
            state.refocus_at_poll = None;
            if let Some(window) = state.window_mut() {
                window.focused = true;
            }
            state.pending_events.push(WindowEvent::Focus(true));
        }
        let pending = std::mem::take(&mut state.pending_events);
        state.ready_events.extend(pending);
    }

    fn drain_events(&mut self) -> Vec<WindowEvent> {
        std::mem::take(&mut self.state.0.lock().ready_events)
    }

    fn create_window(&mut self, width: i32, height: i32, hints: &WindowHints) -> DriverResult<()> {
        let mut state = self.state.0.lock();
        if state.fail_window_creation {
            return Err(DriverError::WindowCreation);
        }
        state.calls.push(Call::CreateWindow(width, height));
        state.windows_created += 1;
        let mut window = MockWindow::detached();
        window.size = (width, height);
        window.hints = *hints;
        window.focused = hints.focus_on_show;
        window.visible = hints.visible;
        if let Some(pos) = state.pinned_pos {
            window.pos = pos;
        }
        state.window = Some(window);
        Ok(())
    }

    fn destroy_window(&mut self) {
        let mut state = self.state.0.lock();
        state.calls.push(Call::DestroyWindow);
        state.window = None;
    }

    fn has_window(&self) -> bool {
        self.state.0.lock().window.is_some()
    }

    fn make_context_current(&mut self) {
        self.record(Call::MakeCurrent);
    }

    fn window_pos(&self) -> (i32, i32) {
        let state = self.state.0.lock();
        state
            .window
            .as_ref()
            .map(|w| w.pos)
            .or(state.pinned_pos)
            .unwrap_or((0, 0))
    }

    fn set_window_pos(&mut self, x: i32, y: i32) {
        self.record(Call::SetPos(x, y));
        self.state.0.lock().pinned_pos = None;
        self.with_window_mut(|window, _| window.pos = (x, y));
    }

    fn window_size(&self) -> (i32, i32) {
        self.with_window((0, 0), |w| w.size)
    }

    fn set_window_size(&mut self, width: i32, height: i32) {
        self.record(Call::SetSize(width, height));
        // Applied right away, acknowledged on the next poll.
        self.with_window_mut(|window, events| {
            window.size = (width, height);
            events.push(WindowEvent::Size(width, height));
            events.push(WindowEvent::FramebufferSize(width, height));
        });
    }

    fn window_monitor(&self) -> Option<MonitorId> {
        self.with_window(None, |w| w.monitor)
    }

    fn set_window_monitor(
        &mut self,
        monitor: Option<MonitorId>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        _refresh_rate: Option<u32>,
    ) {
        self.record(Call::SetMonitor(monitor, width, height));
        let origin = monitor.and_then(|id| {
            let state = self.state.0.lock();
            state.monitor(id).map(|m| (m.x, m.y))
        });
        self.with_window_mut(|window, events| {
            window.monitor = monitor;
            window.pos = origin.unwrap_or((x, y));
            window.size = (width, height);
            events.push(WindowEvent::Size(width, height));
            events.push(WindowEvent::FramebufferSize(width, height));
        });
    }

    fn monitor_under_window(&mut self) -> Option<MonitorId> {
        let state = self.state.0.lock();
        if state.os_monitor.is_some() || !state.os_uses_bounds {
            return state.os_monitor;
        }
        let window = state.window.as_ref()?;
        largest_overlap(&state.monitors, window.pos, window.size)
    }

    fn should_close(&self) -> bool {
        let state = self.state.0.lock();
        state.close_requested || state.close_after_polls.is_some_and(|n| state.polls >= n)
    }

    fn is_focused(&self) -> bool {
        self.with_window(false, |w| w.focused)
    }

    fn is_decorated(&self) -> bool {
        self.with_window(false, |w| w.hints.decorated)
    }

    fn is_resizable(&self) -> bool {
        self.with_window(false, |w| w.hints.resizable)
    }

    fn is_transparent(&self) -> bool {
        self.with_window(false, |w| w.hints.transparent)
    }

    fn cursor_mode(&self) -> CursorMode {
        self.with_window(CursorMode::Visible, |w| w.cursor_mode)
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        self.with_window_mut(|window, _| window.cursor_mode = mode);
    }

    fn set_sticky_input(&mut self, sticky: bool) {
        self.with_window_mut(|window, _| window.sticky = sticky);
    }

    fn set_title(&mut self, title: &str) {
        self.record(Call::SetTitle(title.to_string()));
        self.with_window_mut(|window, _| window.title = title.to_string());
    }

    fn set_icon(&mut self, icons: Vec<RgbaImage>) {
        self.record(Call::SetIcon(icons.iter().map(RgbaImage::dimensions).collect()));
        self.state.0.lock().icons = icons;
    }

    fn show(&mut self) {
        self.record(Call::Show);
        self.with_window_mut(|window, _| window.visible = true);
    }

    fn maximize(&mut self) {
        self.record(Call::Maximize);
        self.with_window_mut(|window, _| window.maximized = true);
    }

    fn swap_buffers(&mut self) {
        self.record(Call::SwapBuffers);
    }

    fn set_swap_interval(&mut self, interval: u32) {
        self.record(Call::SwapInterval(interval));
    }

    fn native_handle(&self) -> Option<NativeWindowHandle> {
        let state = self.state.0.lock();
        state
            .window
            .as_ref()
            .map(|_| NativeWindowHandle(state.windows_created))
    }
}
