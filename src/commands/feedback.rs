use crate::commands::{lock, session::drop_session};
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::feedback::{FeedbackDraft, FeedbackError, FeedbackRecord, Photo, SessionClosed, MAX_PHOTOS};
use crate::models::FeedbackLogEntry;
use crate::session::SessionSummary;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

/// What the feedback sheet shows. Photo bytes stay on the Rust side.
#[derive(Debug, Serialize)]
pub struct FeedbackView {
  pub session: SessionSummary,
  pub note: String,
  pub photo_names: Vec<String>,
  pub remaining_slots: usize,
}

impl From<&FeedbackDraft> for FeedbackView {
  fn from(draft: &FeedbackDraft) -> Self {
    Self {
      session: draft.summary().clone(),
      note: draft.note().to_string(),
      photo_names: draft.photos().iter().map(|p| p.file_name.clone()).collect(),
      remaining_slots: MAX_PHOTOS.saturating_sub(draft.photos().len()),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct SubmitResult {
  pub closed: SessionClosed,
  /// False when the backend could not be reached; the record is kept locally
  pub delivered: bool,
}

fn with_draft<T>(
  state: &AppState,
  f: impl FnOnce(&mut FeedbackDraft) -> Result<T, FeedbackError>,
) -> Result<T, AppError> {
  let mut pending = lock(&state.feedback);
  let draft = pending.as_mut().ok_or(FeedbackError::NoFeedbackPending)?;
  Ok(f(draft)?)
}

fn take_draft(state: &AppState) -> Result<FeedbackDraft, FeedbackError> {
  lock(&state.feedback)
    .take()
    .ok_or(FeedbackError::NoFeedbackPending)
}

/// ---------------------------------------------------------------------------
/// Draft Editing
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_feedback(state: State<'_, Arc<AppState>>) -> Result<FeedbackView, AppError> {
  with_draft(&state, |draft| Ok(FeedbackView::from(&*draft)))
}

#[tauri::command]
pub async fn set_feedback_note(
  state: State<'_, Arc<AppState>>,
  note: String,
) -> Result<FeedbackView, AppError> {
  with_draft(&state, |draft| {
    draft.set_note(note);
    Ok(FeedbackView::from(&*draft))
  })
}

/// Attach a photo; returns the new photo count
#[tauri::command]
pub async fn attach_feedback_photo(
  state: State<'_, Arc<AppState>>,
  file_name: String,
  content_type: String,
  bytes: Vec<u8>,
) -> Result<usize, AppError> {
  let photo = Photo {
    file_name,
    content_type,
    bytes,
  };
  with_draft(&state, |draft| draft.attach_photo(photo))
}

/// Remove a photo by position; returns the remaining count
#[tauri::command]
pub async fn remove_feedback_photo(
  state: State<'_, Arc<AppState>>,
  index: usize,
) -> Result<usize, AppError> {
  with_draft(&state, |draft| {
    draft.remove_photo(index)?;
    Ok(draft.photos().len())
  })
}

/// ---------------------------------------------------------------------------
/// Submit / Skip
/// ---------------------------------------------------------------------------

/// Send the feedback and close the session.
///
/// A delivery failure does not keep the session open: the record is logged
/// locally as undelivered and the session closes anyway.
#[tauri::command]
pub async fn submit_feedback(state: State<'_, Arc<AppState>>) -> Result<SubmitResult, AppError> {
  let (record, closed) = take_draft(&state)?.submit();
  drop_session(&state);

  let delivered = match &state.backend {
    Some(backend) => match backend.submit_feedback(&record).await {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(training_id = record.session.training_id, error = %e, "Feedback delivery failed");
        false
      }
    },
    None => {
      tracing::warn!("No coaching backend configured, feedback kept locally");
      false
    }
  };

  let id = record_feedback(&state.db, &record, delivered).await?;
  tracing::info!(
    id,
    training_id = record.session.training_id,
    photos = record.photos.len(),
    delivered,
    "Feedback submitted"
  );

  Ok(SubmitResult { closed, delivered })
}

#[tauri::command]
pub async fn skip_feedback(state: State<'_, Arc<AppState>>) -> Result<SessionClosed, AppError> {
  let closed = take_draft(&state)?.skip();
  drop_session(&state);
  tracing::info!("Feedback skipped");
  Ok(closed)
}

/// ---------------------------------------------------------------------------
/// Feedback Log
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_feedback_log(
  state: State<'_, Arc<AppState>>,
  student_id: Option<i64>,
) -> Result<Vec<FeedbackLogEntry>, AppError> {
  let entries = sqlx::query_as::<_, FeedbackLogEntry>(
    r#"
    SELECT * FROM feedback_log
    WHERE ?1 IS NULL OR student_id = ?1
    ORDER BY id DESC
    LIMIT 100
    "#,
  )
  .bind(student_id)
  .fetch_all(&state.db)
  .await?;

  Ok(entries)
}

async fn record_feedback(
  db: &DbPool,
  record: &FeedbackRecord,
  delivered: bool,
) -> Result<i64, AppError> {
  let result = sqlx::query(
    r#"
    INSERT INTO feedback_log (training_id, student_id, trainer_id, note, photo_count, delivered)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
    "#,
  )
  .bind(record.session.training_id)
  .bind(record.student_id)
  .bind(record.trainer_id)
  .bind(&record.note)
  .bind(record.photos.len() as i64)
  .bind(delivered)
  .execute(db)
  .await?;

  Ok(result.last_insert_rowid())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
