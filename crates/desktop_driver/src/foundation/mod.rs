//! Foundation module - Core utilities shared by the driver
//!
//! - Logging setup
//! - Frame pacing helpers

pub mod logging;
pub mod time;
