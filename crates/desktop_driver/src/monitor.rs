//! Monitor cache and device-scale resolution
//!
//! The cache is a wholesale snapshot of the connected monitors. It is rebuilt
//! when the driver starts and after every hot-plug notification, and it lives
//! inside the main-thread window state, so it is never touched concurrently.
//!
//! Logical (device-independent) and native pixels are related by
//! `native = logical * scale`, truncated to whole pixels.

use crate::platform::{MonitorId, MonitorInfo, Platform};
use parking_lot::RwLock;

/// Maps a point in virtual screen coordinates to a DPI scale factor
pub trait DeviceScale: Send + Sync {
    /// Scale factor of the monitor at `(x, y)`
    fn scale_factor_at(&self, x: i32, y: i32) -> f64;
}

/// The same scale everywhere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScale(pub f64);

impl DeviceScale for FixedScale {
    fn scale_factor_at(&self, _x: i32, _y: i32) -> f64 {
        self.0
    }
}

/// Scale factors taken from the monitors' content scale
///
/// The platform refreshes the table whenever it enumerates monitors.
#[derive(Debug, Default)]
pub struct ContentScaleTable {
    entries: RwLock<Vec<MonitorInfo>>,
}

impl ContentScaleTable {
    /// Empty table; every lookup yields 1.0
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the table contents
    pub fn refresh(&self, monitors: &[MonitorInfo]) {
        *self.entries.write() = monitors.to_vec();
    }
}

impl DeviceScale for ContentScaleTable {
    fn scale_factor_at(&self, x: i32, y: i32) -> f64 {
        self.entries
            .read()
            .iter()
            .find(|m| m.contains(x, y))
            .map_or(1.0, |m| m.content_scale)
    }
}

/// Snapshot of all connected monitors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonitorCache {
    monitors: Vec<MonitorInfo>,
}

impl MonitorCache {
    /// Enumerate the monitors and replace the cache
    pub fn rebuild(&mut self, platform: &mut dyn Platform) {
        self.monitors = platform.monitors();
        log::debug!("Monitor cache rebuilt: {} monitor(s)", self.monitors.len());
    }

    /// All cached monitors in enumeration order
    pub fn monitors(&self) -> &[MonitorInfo] {
        &self.monitors
    }

    /// Cached monitor with the given handle
    pub fn get(&self, id: MonitorId) -> Option<&MonitorInfo> {
        self.monitors.iter().find(|m| m.id == id)
    }

    /// First monitor whose rectangle contains the point
    pub fn lookup_by_point(&self, x: i32, y: i32) -> Option<&MonitorInfo> {
        self.monitors.iter().find(|m| m.contains(x, y))
    }

    /// Monitor the window currently belongs to
    ///
    /// Tries, in order: the fullscreen assignment, the OS's own answer, the
    /// cached monitor under the window position and finally the primary
    /// monitor.
    pub fn current_monitor(&self, platform: &mut dyn Platform) -> Option<MonitorInfo> {
        if let Some(m) = platform.window_monitor().and_then(|id| self.get(id)) {
            return Some(m.clone());
        }
        // Position-based lookup is ambiguous when a window spans monitors.
        if let Some(m) = platform.monitor_under_window().and_then(|id| self.get(id)) {
            return Some(m.clone());
        }
        let (x, y) = platform.window_pos();
        if let Some(m) = self.lookup_by_point(x, y) {
            return Some(m.clone());
        }
        platform
            .primary_monitor()
            .or_else(|| self.monitors.first().cloned())
    }
}

/// Logical pixels to native pixels
pub fn to_native(logical: f64, scale: f64) -> i32 {
    (logical * scale).floor() as i32
}

/// Native pixels to logical pixels
pub fn from_native(native: f64, scale: f64) -> f64 {
    native / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;
    use crate::platform::VideoMode;

    fn monitor(id: usize, x: i32, width: i32, scale: f64) -> MonitorInfo {
        MonitorInfo {
            id: MonitorId(id),
            name: format!("monitor-{id}"),
            x,
            y: 0,
            video_mode: VideoMode { width, height: 1080, refresh_rate: 60 },
            content_scale: scale,
        }
    }

    fn dual_monitor_platform() -> MockPlatform {
        MockPlatform::with_monitors(vec![
            monitor(0, 0, 1920, 1.0),
            monitor(1, 1920, 2560, 2.0),
        ])
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut platform = dual_monitor_platform();
        let mut cache = MonitorCache::default();
        cache.rebuild(&mut platform);
        let first = cache.clone();
        cache.rebuild(&mut platform);
        assert_eq!(cache, first);
        assert_eq!(cache.monitors().len(), 2);
    }

    #[test]
    fn test_rebuild_replaces_wholesale() {
        let mut platform = dual_monitor_platform();
        let mut cache = MonitorCache::default();
        cache.rebuild(&mut platform);
        platform.handle().set_monitors(vec![monitor(0, 0, 1280, 1.0)]);
        cache.rebuild(&mut platform);
        assert_eq!(cache.monitors().len(), 1);
        assert_eq!(cache.monitors()[0].video_mode.width, 1280);
    }

    #[test]
    fn test_lookup_by_point() {
        let mut platform = dual_monitor_platform();
        let mut cache = MonitorCache::default();
        cache.rebuild(&mut platform);
        assert_eq!(cache.lookup_by_point(10, 10).map(|m| m.id), Some(MonitorId(0)));
        assert_eq!(cache.lookup_by_point(1920, 10).map(|m| m.id), Some(MonitorId(1)));
        assert!(cache.lookup_by_point(-5, 10).is_none());
        assert!(cache.lookup_by_point(10, 2000).is_none());
    }

    #[test]
    fn test_current_monitor_fallback_order() {
        let mut platform = dual_monitor_platform();
        let mut cache = MonitorCache::default();
        cache.rebuild(&mut platform);
        let handle = platform.handle();

        // No window position on any monitor: primary
        handle.set_window_pos(-10_000, -10_000);
        assert_eq!(cache.current_monitor(&mut platform).map(|m| m.id), Some(MonitorId(0)));

        // Cached lookup by position
        handle.set_window_pos(2000, 100);
        assert_eq!(cache.current_monitor(&mut platform).map(|m| m.id), Some(MonitorId(1)));

        // OS answer beats the position
        handle.set_os_monitor(Some(MonitorId(0)));
        assert_eq!(cache.current_monitor(&mut platform).map(|m| m.id), Some(MonitorId(0)));

        // Fullscreen assignment beats everything
        handle.set_assigned_monitor(Some(MonitorId(1)));
        assert_eq!(cache.current_monitor(&mut platform).map(|m| m.id), Some(MonitorId(1)));
    }

    #[test]
    fn test_content_scale_table() {
        let table = ContentScaleTable::new();
        assert!((table.scale_factor_at(0, 0) - 1.0).abs() < f64::EPSILON);
        table.refresh(&[monitor(0, 0, 1920, 1.0), monitor(1, 1920, 2560, 2.0)]);
        assert!((table.scale_factor_at(2000, 10) - 2.0).abs() < f64::EPSILON);
        assert!((table.scale_factor_at(5, 10) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_logical_native_round_trip_within_one_pixel() {
        for scale in [1.0, 1.25, 1.5, 1.75, 2.0, 3.0] {
            for native in [1, 17, 333, 640, 1079, 2560] {
                let logical = from_native(f64::from(native), scale);
                let back = to_native(logical, scale);
                assert!((back - native).abs() <= 1, "scale {scale} native {native} -> {back}");
            }
        }
    }

    #[test]
    fn test_to_native_truncates() {
        assert_eq!(to_native(126.0, 1.5), 189);
        assert_eq!(to_native(101.0, 1.25), 126);
        assert_eq!(to_native(0.9, 1.0), 0);
    }
}
