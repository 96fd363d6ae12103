//! # Desktop Driver
//!
//! Desktop windowing and main-loop driver for 2D game runtimes, built on GLFW.
//!
//! ## Features
//!
//! - **Main-thread executor**: run native window calls on the one thread allowed to make them
//! - **Monitors and DPI**: monitor cache with hot-plug rebuilds and per-monitor scale factors
//! - **Window state machine**: windowed and fullscreen transitions that restore geometry
//! - **Frame loop**: layout and update callbacks, buffer swaps, unfocused throttling
//! - **Thread-aware façade**: one [`Driver`] handle usable from any thread, before and after start
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use desktop_driver::prelude::*;
//!
//! struct Game;
//!
//! impl GameContext for Game {
//!     fn layout(&mut self, _width: f64, _height: f64) {}
//!
//!     fn update(&mut self) -> Result<(), UpdateError> {
//!         Ok(())
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut platform = GlfwPlatform::init()?;
//!     let driver = DriverBuilder::new(RuntimeConfig::new("Hello")).build(&mut platform)?;
//!     driver.run(platform, Game)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod graphics;
pub mod hooks;
pub mod icon;
pub mod input;
pub mod monitor;
pub mod platform;
pub mod thread;

mod driver;
mod error;
mod frame;
mod window;

pub use driver::{Driver, DriverBuilder};
pub use error::{DriverError, DriverResult, UpdateError};
pub use frame::GameContext;
pub use window::WindowPhase;

/// Common imports for driver users
pub mod prelude {
    pub use crate::{
        config::{Config, CursorMode, RuntimeConfig},
        graphics::{ExternalPresenter, GlPresenter, GraphicsBackend},
        hooks::{AudioHooks, NoAudio},
        icon::IconImage,
        input::{ButtonAction, InputEvent},
        monitor::{DeviceScale, FixedScale},
        platform::{GlfwPlatform, Platform},
        Driver, DriverBuilder, DriverError, DriverResult, GameContext, UpdateError,
        WindowPhase,
    };
}
