//! Application-level error returned by Tauri commands
//!
//! Every failure in this crate is an expected, recoverable condition, so each
//! module reports its own `thiserror` enum and commands fold them into
//! `AppError`, which reaches the frontend as a plain message.

use serde::Serialize;

use crate::backend::BackendError;
use crate::feedback::FeedbackError;
use crate::scheme::SchemeError;
use crate::session::SessionError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error(transparent)]
  Scheme(#[from] SchemeError),

  #[error(transparent)]
  Session(#[from] SessionError),

  #[error(transparent)]
  Feedback(#[from] FeedbackError),

  #[error(transparent)]
  Backend(#[from] BackendError),

  #[error("Database error: {0}")]
  Database(String),

  #[error("{0} not found")]
  NotFound(String),
}

impl From<sqlx::Error> for AppError {
  fn from(e: sqlx::Error) -> Self {
    AppError::Database(e.to_string())
  }
}

impl Serialize for AppError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}
