pub mod feedback;
pub mod scheme;
pub mod session;
pub mod training;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::backend::{BackendClient, BackendError};
use crate::db::AppState;

/// Lock a piece of shared command state, tolerating poison.
/// Nothing held in `AppState` can be left half-updated by a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The backend client, or an error naming the missing setting
pub(crate) fn require_backend(state: &AppState) -> Result<&BackendClient, BackendError> {
  state
    .backend
    .as_ref()
    .ok_or_else(|| BackendError::MissingConfig("COACH_API_URL".to_string()))
}
