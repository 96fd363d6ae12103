//! Graphics backend contract
//!
//! The driver never draws. It tells the backend about transparency, vsync and
//! the native window, and asks whether presentation needs manual buffer swaps.

use crate::platform::NativeWindowHandle;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// What the driver needs from a graphics backend
pub trait GraphicsBackend: Send + Sync {
    /// Whether the backend renders through a GL context that needs manual swaps
    fn is_legacy_gl(&self) -> bool;

    /// Framebuffer transparency was configured
    fn set_transparent(&self, transparent: bool);

    /// Vsync was switched
    fn set_vsync_enabled(&self, enabled: bool);

    /// A native window was created (or recreated) for the backend to render into
    fn bind_native_window(&self, _handle: NativeWindowHandle) {}

    /// Whether leaving fullscreen requires destroying and recreating the window
    ///
    /// Detaching a window from its monitor leaves a stale image behind on
    /// backends that present on their own; a fresh window clears it. GL
    /// backends get away with a buffer swap.
    fn needs_window_recreation_on_monitor_change(&self) -> bool {
        !self.is_legacy_gl()
    }
}

/// A GL backend that only presents; drawing happens elsewhere
#[derive(Debug, Default)]
pub struct GlPresenter {
    transparent: AtomicBool,
    vsync: AtomicBool,
}

impl GlPresenter {
    /// Create a presenter
    pub fn new() -> Self {
        Self::default()
    }

    /// Last vsync setting pushed by the driver
    pub fn vsync_enabled(&self) -> bool {
        self.vsync.load(Ordering::Relaxed)
    }

    /// Last transparency setting pushed by the driver
    pub fn transparent(&self) -> bool {
        self.transparent.load(Ordering::Relaxed)
    }
}

impl GraphicsBackend for GlPresenter {
    fn is_legacy_gl(&self) -> bool {
        true
    }

    fn set_transparent(&self, transparent: bool) {
        self.transparent.store(transparent, Ordering::Relaxed);
    }

    fn set_vsync_enabled(&self, enabled: bool) {
        self.vsync.store(enabled, Ordering::Relaxed);
    }
}

/// A backend that manages its own presentation (e.g. Vulkan or Metal)
#[derive(Debug, Default)]
pub struct ExternalPresenter {
    window: Mutex<Option<NativeWindowHandle>>,
    vsync: AtomicBool,
}

impl ExternalPresenter {
    /// Create a presenter
    pub fn new() -> Self {
        Self::default()
    }

    /// Window most recently bound by the driver
    pub fn bound_window(&self) -> Option<NativeWindowHandle> {
        *self.window.lock()
    }

    /// Last vsync setting pushed by the driver
    pub fn vsync_enabled(&self) -> bool {
        self.vsync.load(Ordering::Relaxed)
    }
}

impl GraphicsBackend for ExternalPresenter {
    fn is_legacy_gl(&self) -> bool {
        false
    }

    fn set_transparent(&self, _transparent: bool) {}

    fn set_vsync_enabled(&self, enabled: bool) {
        self.vsync.store(enabled, Ordering::Relaxed);
    }

    fn bind_native_window(&self, handle: NativeWindowHandle) {
        log::debug!("Binding native window {:?}", handle);
        *self.window.lock() = Some(handle);
    }
}
