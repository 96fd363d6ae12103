//! Logging utilities and structured logging support

pub use log::{debug, error, info, trace, warn};

use env_logger::Builder;
use log::LevelFilter;

/// Log target used by the frame loop
pub const FRAME_TARGET: &str = "desktop_driver::frame";

/// Logger settings
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Level for the frame loop target, which is chatty at `Trace`
    pub frame_level: LevelFilter,
    /// Level for everything else
    pub default_level: LevelFilter,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            frame_level: LevelFilter::Info,
            default_level: LevelFilter::Info,
        }
    }
}

/// Initialize the logging system from `RUST_LOG`
pub fn init() {
    env_logger::init();
}

/// Initialize the logging system with explicit filters
///
/// `RUST_LOG` still wins for any target it names.
pub fn init_with_config(config: &LoggerConfig) {
    let mut builder = Builder::new();
    builder
        .filter(Some(FRAME_TARGET), config.frame_level)
        .filter(None, config.default_level)
        .parse_default_env();
    // A second init (e.g. from tests) keeps the first logger.
    let _ = builder.try_init();
}
