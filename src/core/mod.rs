//! In-memory authoritative catalog store and index helpers.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Helper index aliases.
pub mod indices;
/// Authoritative catalog tables.
pub mod store;

/// Locks `mutex`, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
