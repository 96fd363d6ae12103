//! Frame pacing utilities

use std::time::{Duration, Instant};

/// Target frame period used while the window is unfocused
pub const UNFOCUSED_FRAME_BUDGET: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// Simple stopwatch for measuring elapsed time
#[derive(Debug)]
pub struct Stopwatch {
    start_time: Option<Instant>,
    elapsed: Duration,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a new stopped stopwatch
    pub const fn new() -> Self {
        Self {
            start_time: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Create a new stopwatch and start it immediately
    pub fn start_new() -> Self {
        let mut stopwatch = Self::new();
        stopwatch.start();
        stopwatch
    }

    /// Start the stopwatch
    pub fn start(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Stop the stopwatch and accumulate elapsed time
    pub fn stop(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed += start.elapsed();
            self.start_time = None;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        let current_elapsed = self
            .start_time
            .map_or(Duration::ZERO, |start| start.elapsed());
        self.elapsed + current_elapsed
    }

    /// Check if the stopwatch is currently running
    pub const fn is_running(&self) -> bool {
        self.start_time.is_some()
    }
}

/// Sleeps away whatever is left of a fixed frame budget
#[derive(Debug, Clone, Copy)]
pub struct FrameThrottle {
    budget: Duration,
}

impl Default for FrameThrottle {
    fn default() -> Self {
        Self::new(UNFOCUSED_FRAME_BUDGET)
    }
}

impl FrameThrottle {
    /// Create a throttle with the given budget per frame
    pub const fn new(budget: Duration) -> Self {
        Self { budget }
    }

    /// Frame budget
    pub const fn budget(&self) -> Duration {
        self.budget
    }

    /// Time left in the budget after `spent`, if any
    pub fn remaining(&self, spent: Duration) -> Option<Duration> {
        self.budget.checked_sub(spent).filter(|d| !d.is_zero())
    }

    /// Sleep for the rest of the budget; returns the time slept
    pub fn sleep_remaining(&self, spent: Duration) -> Duration {
        match self.remaining(spent) {
            Some(wait) => {
                std::thread::sleep(wait);
                wait
            }
            None => Duration::ZERO,
        }
    }
}
