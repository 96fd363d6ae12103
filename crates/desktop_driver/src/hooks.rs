//! Audio suspend/resume hooks

/// Called by the frame loop when the game pauses for lack of focus
pub trait AudioHooks: Send + Sync {
    /// The window lost focus and the loop is suspending
    fn suspend(&self);

    /// The loop is running again
    fn resume(&self);
}

/// No audio to pause
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAudio;

impl AudioHooks for NoAudio {
    fn suspend(&self) {}

    fn resume(&self) {}
}
