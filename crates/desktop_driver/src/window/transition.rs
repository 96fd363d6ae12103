//! Size and fullscreen transitions
//!
//! Every geometry change funnels through [`WindowState::set_window_size`]. The
//! size callback is unregistered for the duration so the driver's own resizes
//! are not mistaken for user resizes.

use super::WindowState;
use crate::error::{DriverError, DriverResult};

/// Smallest logical width of a decorated window; the title bar needs room for its buttons
const MIN_DECORATED_WIDTH: f64 = 126.0;

impl WindowState {
    /// Move the window to the given native size and fullscreen state
    ///
    /// A no-op when nothing (including the device scale) changed. The new
    /// logical size is picked up by the next [`WindowState::update_size`].
    pub(crate) fn set_window_size(
        &mut self,
        width: i32,
        height: i32,
        fullscreen: bool,
    ) -> DriverResult<()> {
        let scale = self.device_scale_factor();
        if self.width == width
            && self.height == height
            && self.is_fullscreen() == fullscreen
            && (self.last_scale - scale).abs() < f64::EPSILON
        {
            return Ok(());
        }
        let mut width = width.max(1);
        let height = height.max(1);
        self.last_scale = scale;

        // Clear the stale image before the window changes shape.
        self.swap_buffers();

        self.unregister_size_callback();
        self.transitioning = true;
        let result = if fullscreen {
            self.enter_fullscreen();
            Ok(())
        } else {
            self.enter_windowed(&mut width, height)
        };
        self.transitioning = false;
        self.pull_events();
        self.register_size_callback();
        result?;

        self.width = width;
        self.height = height;
        self.to_change_size = true;
        Ok(())
    }

    fn enter_fullscreen(&mut self) {
        if self.saved_position.is_none() {
            self.saved_position = Some(self.platform.window_pos());
        }
        let Some(monitor) = self.current_monitor() else {
            log::warn!("No monitor to go fullscreen on");
            return;
        };
        let mode = monitor.video_mode;
        self.platform.set_window_monitor(
            Some(monitor.id),
            0,
            0,
            mode.width,
            mode.height,
            Some(mode.refresh_rate),
        );
        if self.shared.graphics.is_legacy_gl() {
            // Let the mode switch settle before presenting into it.
            self.platform.poll_events();
            self.pull_events();
            self.swap_buffers();
        }
        log::info!(
            "Entered fullscreen on '{}' ({}x{} @ {} Hz)",
            monitor.name,
            mode.width,
            mode.height,
            mode.refresh_rate
        );
    }

    fn enter_windowed(&mut self, width: &mut i32, height: i32) -> DriverResult<()> {
        let min_width = if self.platform.is_decorated() {
            self.to_native(MIN_DECORATED_WIDTH)
        } else {
            1
        };
        *width = (*width).max(min_width);

        if self.platform.window_monitor().is_some() {
            if self.shared.graphics.needs_window_recreation_on_monitor_change() {
                self.recreate_window()?;
            } else {
                self.platform.set_window_monitor(None, 0, 0, *width, height, None);
                self.platform.poll_events();
                self.pull_events();
                self.swap_buffers();
            }
            log::info!("Left fullscreen");
        }

        if let Some((x, y)) = self.saved_position.take() {
            self.platform.set_window_pos(x, y);
            if cfg!(target_os = "macos") {
                // The first move after leaving fullscreen can be ignored.
                self.platform.set_window_pos(x + 1, y);
                self.platform.set_window_pos(x, y);
            }
        }

        if self.platform.window_size() != (*width, height) {
            self.resize_and_wait(*width, height);
        }

        // Leaving fullscreen can reset the title on some window managers.
        self.platform.set_title(&self.title);
        Ok(())
    }

    /// Replace the fullscreen window with a fresh windowed one
    fn recreate_window(&mut self) -> DriverResult<()> {
        self.platform.destroy_window();
        if let Err(err) = self.create_native_window() {
            log::error!("Failed to recreate the window: {}", err);
            self.error = Some(err);
            return Err(DriverError::WindowMissing);
        }
        self.platform.show();
        if let Some(handle) = self.platform.native_handle() {
            self.shared.graphics.bind_native_window(handle);
        }
        log::debug!("Window recreated after leaving fullscreen");
        Ok(())
    }

    /// Request a size and block until the platform reports the new framebuffer
    fn resize_and_wait(&mut self, width: i32, height: i32) {
        self.platform.set_window_size(width, height);
        let mut polls = 0_usize;
        loop {
            self.platform.poll_events();
            polls += 1;
            if self.pull_events() || self.platform.should_close() {
                break;
            }
        }
        log::debug!("Resize to {}x{} settled after {} poll(s)", width, height, polls);
    }
}
