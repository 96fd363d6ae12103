//! Driver error types
//!
//! Termination of the main loop because the user closed the window is not an
//! error: [`crate::Driver::run`] returns `Ok(())` for it. Everything in this
//! module describes a genuine failure or a misuse of the driver API.

use crate::config::ConfigError;
use crate::thread::ThreadError;
use thiserror::Error;

/// Failure reported by a game context's per-frame update
#[derive(Error, Debug)]
pub enum UpdateError {
    /// Custom game error
    #[error("Game update error: {0}")]
    Custom(String),

    /// Any other error raised by game code
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors raised by the window driver
#[derive(Error, Debug)]
pub enum DriverError {
    /// The windowing subsystem failed to start
    #[error("Platform initialization failed: {0}")]
    PlatformInit(String),

    /// The platform returned no window on creation
    #[error("Window creation failed")]
    WindowCreation,

    /// A method that requires a running main loop was called before `run`
    #[error("{0} can't be called before the main loop starts")]
    NotRunning(&'static str),

    /// A method that is only valid before `run` was called afterwards
    #[error("{0} can't be called after the main loop starts")]
    AlreadyRunning(&'static str),

    /// The game context's update failed; the loop stops with this error
    #[error("Game context failed: {0}")]
    Update(#[source] UpdateError),

    /// The main-thread executor could not run a submitted operation
    #[error(transparent)]
    Thread(#[from] ThreadError),

    /// Main-thread state was touched from another thread
    #[error("Window state can only be accessed on the main thread")]
    NotMainThread,

    /// The native window does not exist (not created yet, or already destroyed)
    #[error("Native window is not available")]
    WindowMissing,

    /// Window state was requested while an operation on it is still running
    #[error("Window state is already in use by the running operation")]
    Reentrant,

    /// The game-logic thread could not be started
    #[error("Failed to spawn the game thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The game-logic thread panicked
    #[error("Game thread panicked")]
    GameThreadPanicked,

    /// Configuration could not be loaded or is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Lets game code use `?` on driver calls made from `update`
impl From<DriverError> for UpdateError {
    fn from(err: DriverError) -> Self {
        Self::Other(Box::new(err))
    }
}

/// Result alias used across the driver
pub type DriverResult<T> = Result<T, DriverError>;
