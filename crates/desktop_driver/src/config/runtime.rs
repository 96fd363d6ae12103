//! Pre-start window configuration
//!
//! A [`RuntimeConfig`] is a plain value built before the main loop starts.
//! The driver keeps one copy behind a reader/writer lock so that pre-start
//! setters on [`crate::Driver`] can still adjust it, and freezes it into the
//! live window state exactly once, when the window is created.

use super::{Config, ConfigError};
use serde::{Deserialize, Serialize};

/// Cursor visibility and capture mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Normal, visible cursor
    #[default]
    Visible,
    /// Cursor hidden while over the window
    Hidden,
    /// Cursor hidden and locked to the window
    Captured,
}

/// Window options applied when the native window is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Window title
    pub title: String,
    /// Whether vsync is requested
    pub vsync: bool,
    /// Whether the window starts in fullscreen
    pub fullscreen: bool,
    /// Initial cursor mode
    pub cursor_mode: CursorMode,
    /// Whether the window has decorations
    pub decorated: bool,
    /// Whether the user can resize the window
    pub resizable: bool,
    /// Whether the window stays on top of others
    pub floating: bool,
    /// Whether the window starts maximized
    pub maximized: bool,
    /// Whether the window takes focus when shown
    pub focused: bool,
    /// Window position relative to its monitor in logical pixels; `None` centers it
    pub position: Option<(i32, i32)>,
    /// Window width in logical pixels
    pub width: i32,
    /// Window height in logical pixels
    pub height: i32,
    /// Whether the framebuffer is transparent
    pub transparent: bool,
    /// Whether the loop keeps running while the window is unfocused
    pub runnable_on_unfocused: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            vsync: true,
            fullscreen: false,
            cursor_mode: CursorMode::Visible,
            decorated: true,
            resizable: false,
            floating: false,
            maximized: false,
            focused: true,
            position: None,
            width: 640,
            height: 480,
            transparent: false,
            runnable_on_unfocused: true,
        }
    }
}

impl Config for RuntimeConfig {}

impl RuntimeConfig {
    /// Create a configuration with the given title and default options
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the window title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the window size in logical pixels
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set the window position in logical pixels, relative to the monitor
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    /// Start in fullscreen
    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    /// Enable or disable vsync
    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    /// Set the initial cursor mode
    pub fn with_cursor_mode(mut self, mode: CursorMode) -> Self {
        self.cursor_mode = mode;
        self
    }

    /// Show or hide window decorations
    pub fn with_decorated(mut self, decorated: bool) -> Self {
        self.decorated = decorated;
        self
    }

    /// Allow user resizing
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Keep the window above others
    pub fn with_floating(mut self, floating: bool) -> Self {
        self.floating = floating;
        self
    }

    /// Start maximized
    pub fn with_maximized(mut self, maximized: bool) -> Self {
        self.maximized = maximized;
        self
    }

    /// Focus the window when it is shown
    pub fn with_focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Request a transparent framebuffer
    pub fn with_transparent(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// Keep running while unfocused
    pub fn with_runnable_on_unfocused(mut self, runnable: bool) -> Self {
        self.runnable_on_unfocused = runnable;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_driver_expectations() {
        let config = RuntimeConfig::default();
        assert!(config.vsync);
        assert!(config.decorated);
        assert!(config.focused);
        assert!(config.runnable_on_unfocused);
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.position, None);
        assert_eq!(config.cursor_mode, CursorMode::Visible);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: RuntimeConfig = toml::from_str(
            "title = \"Game\"\nwidth = 320\ncursor_mode = \"captured\"\n",
        )
        .unwrap();
        assert_eq!(config.title, "Game");
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 480);
        assert_eq!(config.cursor_mode, CursorMode::Captured);
    }

    #[test]
    fn test_unknown_cursor_mode_is_rejected() {
        let result: Result<RuntimeConfig, _> = toml::from_str("cursor_mode = \"sideways\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_ron_file_round_trip() {
        let path = std::env::temp_dir().join(format!("desktop_driver_cfg_{}.ron", std::process::id()));
        let path = path.to_string_lossy().into_owned();
        let config = RuntimeConfig::new("Saved").with_position(10, 20).with_resizable(true);
        config.save_to_file(&path).unwrap();
        let loaded = RuntimeConfig::load_from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = RuntimeConfig::default().save_to_file("config.json").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_validate_rejects_empty_window() {
        assert!(RuntimeConfig::default().with_size(0, 10).validate().is_err());
        assert!(RuntimeConfig::default().validate().is_ok());
    }
}
