//! GLFW implementation of [`Platform`]
//!
//! GLFW must be initialized and driven from the process's main thread. The
//! platform owns the `Glfw` instance, the single `PWindow` and its event
//! receiver; monitors are addressed by their index in the last enumeration.

use super::{
    largest_overlap, ClientApi, MonitorId, MonitorInfo, NativeWindowHandle, Platform, VideoMode,
    WindowEvent, WindowHints,
};
use crate::config::CursorMode;
use crate::error::{DriverError, DriverResult};
use crate::input::{ButtonAction, InputEvent};
use crate::monitor::{ContentScaleTable, DeviceScale};
use glfw::Context;
use image::RgbaImage;
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;

/// Native windowing through GLFW
pub struct GlfwPlatform {
    glfw: glfw::Glfw,
    window: Option<glfw::PWindow>,
    events: Option<glfw::GlfwReceiver<(f64, glfw::WindowEvent)>>,
    /// Last enumeration; index is the `MonitorId`
    known_monitors: Vec<MonitorInfo>,
    monitors_changed: Rc<Cell<bool>>,
    scale_table: Arc<ContentScaleTable>,
    transparent: bool,
}

impl GlfwPlatform {
    /// Initialize GLFW and start listening for monitor changes
    pub fn init() -> DriverResult<Self> {
        let mut glfw = glfw::init(glfw::log_errors)
            .map_err(|e| DriverError::PlatformInit(format!("{e:?}")))?;

        let monitors_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&monitors_changed);
        glfw.set_monitor_callback(move |_, _| flag.set(true));

        let mut platform = Self {
            glfw,
            window: None,
            events: None,
            known_monitors: Vec::new(),
            monitors_changed,
            scale_table: Arc::new(ContentScaleTable::new()),
            transparent: false,
        };
        let count = platform.monitors().len();
        log::info!("GLFW initialized with {} monitor(s)", count);
        Ok(platform)
    }

    fn monitor_id_at(&self, origin: (i32, i32)) -> Option<MonitorId> {
        self.known_monitors
            .iter()
            .position(|m| (m.x, m.y) == origin)
            .map(MonitorId)
    }
}

fn monitor_info(index: usize, monitor: &glfw::Monitor) -> Option<MonitorInfo> {
    let mode = monitor.get_video_mode()?;
    let (x, y) = monitor.get_pos();
    let (scale_x, _) = monitor.get_content_scale();
    Some(MonitorInfo {
        id: MonitorId(index),
        name: monitor.get_name().unwrap_or_default(),
        x,
        y,
        video_mode: VideoMode {
            width: mode.width as i32,
            height: mode.height as i32,
            refresh_rate: mode.refresh_rate,
        },
        content_scale: f64::from(scale_x),
    })
}

const fn button_action(action: glfw::Action) -> ButtonAction {
    match action {
        glfw::Action::Press => ButtonAction::Press,
        glfw::Action::Release => ButtonAction::Release,
        glfw::Action::Repeat => ButtonAction::Repeat,
    }
}

fn convert_event(event: glfw::WindowEvent) -> Option<WindowEvent> {
    let converted = match event {
        glfw::WindowEvent::Size(w, h) => WindowEvent::Size(w, h),
        glfw::WindowEvent::FramebufferSize(w, h) => WindowEvent::FramebufferSize(w, h),
        glfw::WindowEvent::Focus(focused) => WindowEvent::Focus(focused),
        glfw::WindowEvent::Close => WindowEvent::Close,
        glfw::WindowEvent::Key(key, scancode, action, mods) => WindowEvent::Input(InputEvent::Key {
            key: key as i32,
            scancode,
            action: button_action(action),
            modifiers: mods.bits(),
        }),
        glfw::WindowEvent::MouseButton(button, action, mods) => {
            WindowEvent::Input(InputEvent::MouseButton {
                button: button as i32,
                action: button_action(action),
                modifiers: mods.bits(),
            })
        }
        glfw::WindowEvent::CursorPos(x, y) => WindowEvent::Input(InputEvent::CursorPos { x, y }),
        glfw::WindowEvent::Scroll(dx, dy) => WindowEvent::Input(InputEvent::Scroll { dx, dy }),
        glfw::WindowEvent::Char(c) => WindowEvent::Input(InputEvent::Char(c)),
        _ => return None,
    };
    Some(converted)
}

impl Platform for GlfwPlatform {
    fn monitors(&mut self) -> Vec<MonitorInfo> {
        let infos: Vec<MonitorInfo> = self.glfw.with_connected_monitors(|_, monitors| {
            monitors
                .iter()
                .enumerate()
                .filter_map(|(i, m)| monitor_info(i, m))
                .collect()
        });
        self.scale_table.refresh(&infos);
        self.known_monitors = infos.clone();
        infos
    }

    fn primary_monitor(&mut self) -> Option<MonitorInfo> {
        let origin = self
            .glfw
            .with_primary_monitor(|_, monitor| monitor.map(|m| m.get_pos()))?;
        self.monitors().into_iter().find(|m| (m.x, m.y) == origin)
    }

    fn take_monitor_change(&mut self) -> bool {
        self.monitors_changed.replace(false)
    }

    fn device_scale(&self) -> Arc<dyn DeviceScale> {
        Arc::clone(&self.scale_table) as Arc<dyn DeviceScale>
    }

    fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    fn drain_events(&mut self) -> Vec<WindowEvent> {
        let Some(events) = self.events.as_ref() else {
            return Vec::new();
        };
        glfw::flush_messages(events)
            .filter_map(|(_, event)| convert_event(event))
            .collect()
    }

    fn create_window(&mut self, width: i32, height: i32, hints: &WindowHints) -> DriverResult<()> {
        self.glfw.default_window_hints();
        match hints.client_api {
            ClientApi::OpenGl => {
                self.glfw
                    .window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::OpenGl));
                self.glfw.window_hint(glfw::WindowHint::ContextVersion(2, 1));
            }
            ClientApi::NoApi => {
                self.glfw
                    .window_hint(glfw::WindowHint::ClientApi(glfw::ClientApiHint::NoApi));
            }
        }
        self.glfw.window_hint(glfw::WindowHint::Decorated(hints.decorated));
        self.glfw
            .window_hint(glfw::WindowHint::TransparentFramebuffer(hints.transparent));
        self.glfw.window_hint(glfw::WindowHint::Resizable(hints.resizable));
        self.glfw.window_hint(glfw::WindowHint::Floating(hints.floating));
        self.glfw.window_hint(glfw::WindowHint::FocusOnShow(hints.focus_on_show));
        self.glfw.window_hint(glfw::WindowHint::Visible(hints.visible));

        let (mut window, events) = self
            .glfw
            .create_window(
                width.max(1) as u32,
                height.max(1) as u32,
                "",
                glfw::WindowMode::Windowed,
            )
            .ok_or(DriverError::WindowCreation)?;
        window.set_all_polling(true);

        self.transparent = hints.transparent;
        self.window = Some(window);
        self.events = Some(events);
        Ok(())
    }

    fn destroy_window(&mut self) {
        // Dropping the PWindow destroys the native window.
        self.events = None;
        self.window = None;
    }

    fn has_window(&self) -> bool {
        self.window.is_some()
    }

    fn make_context_current(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.make_current();
        }
    }

    fn window_pos(&self) -> (i32, i32) {
        self.window.as_ref().map_or((0, 0), |w| w.get_pos())
    }

    fn set_window_pos(&mut self, x: i32, y: i32) {
        if let Some(window) = self.window.as_mut() {
            window.set_pos(x, y);
        }
    }

    fn window_size(&self) -> (i32, i32) {
        self.window.as_ref().map_or((0, 0), |w| w.get_size())
    }

    fn set_window_size(&mut self, width: i32, height: i32) {
        if let Some(window) = self.window.as_mut() {
            window.set_size(width, height);
        }
    }

    fn window_monitor(&self) -> Option<MonitorId> {
        let window = self.window.as_ref()?;
        let origin = window.with_window_mode(|mode| match mode {
            glfw::WindowMode::FullScreen(monitor) => Some(monitor.get_pos()),
            glfw::WindowMode::Windowed => None,
        })?;
        self.monitor_id_at(origin)
    }

    fn set_window_monitor(
        &mut self,
        monitor: Option<MonitorId>,
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        refresh_rate: Option<u32>,
    ) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let (width, height) = (width.max(1) as u32, height.max(1) as u32);
        let origin = monitor.and_then(|id| self.known_monitors.get(id.0).map(|m| (m.x, m.y)));
        let Some(origin) = origin else {
            window.set_monitor(glfw::WindowMode::Windowed, x, y, width, height, refresh_rate);
            return;
        };
        self.glfw.with_connected_monitors(|_, monitors| {
            match monitors.iter().find(|m| m.get_pos() == origin) {
                Some(m) => window.set_monitor(
                    glfw::WindowMode::FullScreen(m),
                    x,
                    y,
                    width,
                    height,
                    refresh_rate,
                ),
                None => log::warn!("Monitor at {:?} disappeared before fullscreen switch", origin),
            }
        });
    }

    fn monitor_under_window(&mut self) -> Option<MonitorId> {
        // GLFW has no direct query; the OS answer is the monitor with the most overlap.
        let window = self.window.as_ref()?;
        let (pos, size) = (window.get_pos(), window.get_size());
        largest_overlap(&self.known_monitors, pos, size)
    }

    fn should_close(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.should_close())
    }

    fn is_focused(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_focused())
    }

    fn is_decorated(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_decorated())
    }

    fn is_resizable(&self) -> bool {
        self.window.as_ref().is_some_and(|w| w.is_resizable())
    }

    fn is_transparent(&self) -> bool {
        self.window.is_some() && self.transparent
    }

    fn cursor_mode(&self) -> CursorMode {
        match self.window.as_ref().map(|w| w.get_cursor_mode()) {
            Some(glfw::CursorMode::Hidden) => CursorMode::Hidden,
            Some(glfw::CursorMode::Disabled) => CursorMode::Captured,
            _ => CursorMode::Visible,
        }
    }

    fn set_cursor_mode(&mut self, mode: CursorMode) {
        let mode = match mode {
            CursorMode::Visible => glfw::CursorMode::Normal,
            CursorMode::Hidden => glfw::CursorMode::Hidden,
            CursorMode::Captured => glfw::CursorMode::Disabled,
        };
        if let Some(window) = self.window.as_mut() {
            window.set_cursor_mode(mode);
        }
    }

    fn set_sticky_input(&mut self, sticky: bool) {
        if let Some(window) = self.window.as_mut() {
            window.set_sticky_keys(sticky);
            window.set_sticky_mouse_buttons(sticky);
        }
    }

    fn set_title(&mut self, title: &str) {
        if let Some(window) = self.window.as_mut() {
            window.set_title(title);
        }
    }

    fn set_icon(&mut self, icons: Vec<RgbaImage>) {
        let Some(window) = self.window.as_mut() else {
            return;
        };
        let images = icons
            .into_iter()
            .map(|icon| glfw::PixelImage {
                width: icon.width(),
                height: icon.height(),
                // GLFW reads the buffer as consecutive RGBA bytes.
                pixels: icon.pixels().map(|p| u32::from_ne_bytes(p.0)).collect(),
            })
            .collect();
        window.set_icon_from_pixels(images);
    }

    fn show(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.show();
        }
    }

    fn maximize(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.maximize();
        }
    }

    fn swap_buffers(&mut self) {
        if let Some(window) = self.window.as_mut() {
            window.swap_buffers();
        }
    }

    fn set_swap_interval(&mut self, interval: u32) {
        let interval = if interval == 0 {
            glfw::SwapInterval::None
        } else {
            glfw::SwapInterval::Sync(interval)
        };
        self.glfw.set_swap_interval(interval);
    }

    fn native_handle(&self) -> Option<NativeWindowHandle> {
        self.window
            .as_ref()
            .map(|w| NativeWindowHandle(w.window_ptr() as usize))
    }
}
