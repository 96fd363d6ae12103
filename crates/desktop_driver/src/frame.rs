//! The frame loop
//!
//! Each frame is split between two threads. The main thread handles window
//! bookkeeping in a single executor call ([`WindowState::begin_frame`]): the
//! close check, first-frame setup, size tracking, event polling and the
//! focus suspension. The game thread then runs layout, input delivery and
//! update, applies pending icons, asks for a buffer swap and throttles when
//! the window is unfocused.

use crate::driver::Shared;
use crate::error::{DriverError, DriverResult, UpdateError};
use crate::foundation::logging::FRAME_TARGET;
use crate::foundation::time::{FrameThrottle, UNFOCUSED_FRAME_BUDGET};
use crate::icon;
use crate::input::InputEvent;
use crate::thread::Executor;
use crate::window::{slot, WindowState};
use std::sync::Arc;
use std::time::Instant;

/// The game driven by the loop
///
/// Runs on the game thread, never on the main thread.
pub trait GameContext: Send + 'static {
    /// The logical size of the window changed
    fn layout(&mut self, width: f64, height: f64);

    /// Advance the game by one frame
    fn update(&mut self) -> Result<(), UpdateError>;

    /// Input received since the previous frame, in arrival order
    fn handle_input(&mut self, _events: &[InputEvent]) {}
}

/// Outcome of the main-thread part of a frame
#[derive(Debug)]
pub(crate) enum FrameStep {
    /// The window was closed; the loop ends normally
    Closed,
    /// Run the game part of the frame
    Continue(FrameInput),
}

/// What the game part of a frame needs from the main thread
#[derive(Debug, Default)]
pub(crate) struct FrameInput {
    pub layout: Option<(f64, f64)>,
    pub input: Vec<InputEvent>,
    pub unfocused: bool,
}

impl WindowState {
    /// Main-thread part of a frame
    pub(crate) fn begin_frame(&mut self) -> DriverResult<FrameStep> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        // A failure recorded while handling the frame is the real cause.
        self.frame_events().map_err(|err| self.error.take().unwrap_or(err))
    }

    fn frame_events(&mut self) -> DriverResult<FrameStep> {
        if self.should_close() {
            return Ok(FrameStep::Closed);
        }
        let unfocused = !self.has_effective_focus();

        self.apply_pending_fullscreen()?;
        self.init_vsync();
        let mut layout = self.update_size()?;

        self.poll_events();
        self.suspend_while_unfocused();

        if self.apply_user_resizes()? {
            layout = self.update_size()?.or(layout);
        }
        Ok(FrameStep::Continue(FrameInput {
            layout,
            input: self.take_input(),
            unfocused,
        }))
    }

    /// Hold the loop while the window is unfocused and may not run unfocused
    fn suspend_while_unfocused(&mut self) {
        let shared = Arc::clone(self.shared());
        while !shared.runnable_on_unfocused() && !self.has_effective_focus() && !self.should_close()
        {
            if !self.audio_suspended {
                log::info!("Window lost focus; suspending");
                shared.audio.suspend();
                self.audio_suspended = true;
            }
            std::thread::sleep(UNFOCUSED_FRAME_BUDGET);
            self.poll_events();
        }
        if std::mem::take(&mut self.audio_suspended) {
            log::info!("Resuming");
            shared.audio.resume();
        }
    }
}

struct QuitOnDrop(Executor);

impl Drop for QuitOnDrop {
    fn drop(&mut self) {
        self.0.quit();
    }
}

/// Game-thread side of the loop
pub(crate) struct FrameLoop<G> {
    executor: Executor,
    shared: Arc<Shared>,
    game: G,
    throttle: FrameThrottle,
    frames: u64,
}

impl<G: GameContext> FrameLoop<G> {
    pub(crate) fn new(executor: Executor, shared: Arc<Shared>, game: G) -> Self {
        Self {
            executor,
            shared,
            game,
            throttle: FrameThrottle::default(),
            frames: 0,
        }
    }

    /// Run frames until the window closes or something fails
    ///
    /// Always stops the main thread's executor on the way out, panics included.
    pub(crate) fn run(mut self) -> DriverResult<()> {
        let _quit = QuitOnDrop(self.executor.clone());
        let result = self.run_frames();
        match &result {
            Ok(()) => log::info!("Main loop ended after {} frame(s): window closed", self.frames),
            Err(err) => log::error!("Main loop ended after {} frame(s): {}", self.frames, err),
        }
        result
    }

    fn run_frames(&mut self) -> DriverResult<()> {
        loop {
            let frame = match slot::call(&self.executor, WindowState::begin_frame)? {
                FrameStep::Closed => return Ok(()),
                FrameStep::Continue(frame) => frame,
            };

            let started = Instant::now();
            if let Some((width, height)) = frame.layout {
                log::debug!(target: FRAME_TARGET, "Layout {}x{}", width, height);
                self.game.layout(width, height);
            }
            if !frame.input.is_empty() {
                self.game.handle_input(&frame.input);
            }
            self.game.update().map_err(DriverError::Update)?;
            self.apply_pending_icons()?;
            if self.shared.graphics.is_legacy_gl() {
                slot::call(&self.executor, |state| {
                    state.swap_buffers();
                    Ok(())
                })?;
            }
            if frame.unfocused {
                // Swapping can return immediately while unfocused.
                self.throttle.sleep_remaining(started.elapsed());
            }

            self.frames += 1;
            log::trace!(target: FRAME_TARGET, "Frame {} done in {:?}", self.frames, started.elapsed());
        }
    }

    /// Convert the pending icon set here and apply it on the main thread
    fn apply_pending_icons(&self) -> DriverResult<()> {
        let Some(icons) = self.shared.icons.take() else {
            return Ok(());
        };
        let converted = icon::convert_all(&icons);
        slot::call(&self.executor, move |state| {
            state.set_icons(converted);
            Ok(())
        })
    }
}
