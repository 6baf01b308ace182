//! Optimistic mutation protocol shared by the note and folder stores
//!
//! 1. `apply` mutates local state and returns an undo token (or fails
//!    validation, in which case nothing else happens)
//! 2. the remote call runs with no lock held
//! 3. `commit` reconciles local state with the server's answer, or
//!    `rollback` consumes the undo token to restore the previous state

use parking_lot::RwLock;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::RemoteError;

/// Run one optimistic mutation against `state`
///
/// The remote future is only created after `apply` succeeded, so a
/// rejected mutation never reaches the server.
pub async fn run<S, U, T, E, F, Fut>(
    state: &RwLock<S>,
    apply: impl FnOnce(&mut S) -> Result<U, E>,
    remote: F,
    commit: impl FnOnce(&mut S, &T),
    rollback: impl FnOnce(&mut S, U),
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, RemoteError>>,
    E: From<RemoteError>,
{
    let undo = {
        let mut guard = state.write();
        apply(&mut *guard)?
    };

    match remote().await {
        Ok(value) => {
            let mut guard = state.write();
            commit(&mut *guard, &value);
            Ok(value)
        }
        Err(err) => {
            let mut guard = state.write();
            rollback(&mut *guard, undo);
            Err(err.into())
        }
    }
}

/// Counts an operation as in flight for as long as it is alive
pub(crate) struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    pub(crate) fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}
