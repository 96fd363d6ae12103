//! Main-thread storage for the live window state
//!
//! The state holds the platform, which must never leave the main thread. It is
//! kept in a thread-local slot instead of behind a lock: other threads see an
//! empty slot and have to go through the executor.

use super::WindowState;
use crate::error::{DriverError, DriverResult};
use crate::thread::{Executor, MainThreadToken};
use std::cell::RefCell;

thread_local! {
    static SLOT: RefCell<Option<WindowState>> = const { RefCell::new(None) };
}

/// Put the live state in this thread's slot
pub(crate) fn install(_token: MainThreadToken, state: WindowState) {
    SLOT.with(|slot| *slot.borrow_mut() = Some(state));
}

/// Remove the live state from this thread's slot
pub(crate) fn take(_token: MainThreadToken) -> Option<WindowState> {
    SLOT.with(|slot| slot.borrow_mut().take())
}

/// Run `f` against the live state
pub(crate) fn with<R>(
    _token: MainThreadToken,
    f: impl FnOnce(&mut WindowState) -> DriverResult<R>,
) -> DriverResult<R> {
    SLOT.with(|slot| {
        let mut slot = slot.try_borrow_mut().map_err(|_| DriverError::Reentrant)?;
        let state = slot.as_mut().ok_or(DriverError::WindowMissing)?;
        f(state)
    })
}

/// Run `f` against the live state on the main thread, from any thread
pub(crate) fn call<R, F>(executor: &Executor, f: F) -> DriverResult<R>
where
    R: Send + 'static,
    F: FnOnce(&mut WindowState) -> DriverResult<R> + Send + 'static,
{
    let main = executor.clone();
    executor.call(move || {
        let token = main.token().ok_or(DriverError::NotMainThread)?;
        with(token, f)
    })?
}
