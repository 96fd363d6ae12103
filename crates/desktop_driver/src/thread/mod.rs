//! Main-thread executor
//!
//! Native windowing and GL context calls must all happen on one OS thread.
//! [`MainThread`] is created on that thread and serves submitted work until it
//! is told to quit; [`Executor`] is the cloneable, `Send + Sync` handle other
//! threads use to run a closure there and block for its result.
//!
//! Calling [`Executor::call`] from the main thread itself runs the closure
//! inline, so nested calls never wait on themselves.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread::{self, ThreadId};
use thiserror::Error;

/// Executor errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadError {
    /// The main thread stopped serving calls
    #[error("Main thread is no longer serving calls")]
    Terminated,

    /// The submitted operation panicked on the main thread
    #[error("Operation panicked on the main thread")]
    Panicked,
}

type Job = Box<dyn FnOnce() + Send>;

enum Task {
    Run(Job),
    Quit,
}

/// Proof that the holder is running on the main thread
///
/// The token is neither `Send` nor `Sync`, so it cannot leave the thread that
/// obtained it.
#[derive(Debug, Clone, Copy)]
pub struct MainThreadToken {
    _not_send: PhantomData<*const ()>,
}

impl MainThreadToken {
    const fn new() -> Self {
        Self { _not_send: PhantomData }
    }
}

/// Handle for submitting work to the main thread
#[derive(Clone)]
pub struct Executor {
    sender: mpsc::Sender<Task>,
    main_thread: ThreadId,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("main_thread", &self.main_thread)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Run `work` on the main thread and wait for its result
    ///
    /// Submissions from different threads never interleave: the main thread
    /// runs one of them to completion before taking the next.
    pub fn call<R, F>(&self, work: F) -> Result<R, ThreadError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if self.is_main_thread() {
            return Ok(work());
        }

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(work))
                .map_err(|_| ThreadError::Panicked);
            // The caller is blocked on the reply; it only goes away if it panicked.
            let _ = reply_tx.send(result);
        });
        self.sender
            .send(Task::Run(job))
            .map_err(|_| ThreadError::Terminated)?;
        reply_rx.recv().map_err(|_| ThreadError::Terminated)?
    }

    /// Whether the current thread is the main thread
    pub fn is_main_thread(&self) -> bool {
        thread::current().id() == self.main_thread
    }

    /// A main-thread token, if called on the main thread
    pub fn token(&self) -> Option<MainThreadToken> {
        self.is_main_thread().then(MainThreadToken::new)
    }

    /// Ask the main thread to stop serving once the queued work is done
    pub fn quit(&self) {
        // Already stopped is fine.
        let _ = self.sender.send(Task::Quit);
    }
}

/// The serving side of the executor, pinned to the thread that created it
pub struct MainThread {
    receiver: mpsc::Receiver<Task>,
    executor: Executor,
    _not_send: PhantomData<*const ()>,
}

impl Default for MainThread {
    fn default() -> Self {
        Self::new()
    }
}

impl MainThread {
    /// Bind the executor to the calling thread
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            executor: Executor {
                sender,
                main_thread: thread::current().id(),
            },
            _not_send: PhantomData,
        }
    }

    /// Handle for other threads
    pub fn executor(&self) -> Executor {
        self.executor.clone()
    }

    /// Token for main-thread-only APIs
    pub const fn token(&self) -> MainThreadToken {
        MainThreadToken::new()
    }

    /// Run submitted work until [`Executor::quit`] is called
    ///
    /// Consumes the serving side, so calls made after it returns fail with
    /// [`ThreadError::Terminated`] instead of blocking forever. Returns the
    /// number of operations executed.
    pub fn serve(self) -> usize {
        let mut executed = 0;
        while let Ok(task) = self.receiver.recv() {
            match task {
                Task::Run(job) => {
                    job();
                    executed += 1;
                }
                Task::Quit => break,
            }
        }
        log::debug!("Main thread stopped after {} calls", executed);
        executed
    }
}
