use crate::commands::lock;
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::feedback::FeedbackDraft;
use crate::host::SessionHost;
use crate::models::AttendanceRecord;
use crate::preset::{load_training, load_training_exercises};
use crate::session::{
  AttendanceEntry, ExerciseId, Outcome, SessionError, SessionEvent, SessionOwner, SessionView,
  WorkoutSession,
};
use std::sync::Arc;
use tauri::State;

/// Route one event to the open session and return the refreshed view
fn dispatch(state: &AppState, event: SessionEvent) -> Result<(Outcome, SessionView), AppError> {
  let mut current = lock(&state.session);
  let host = current.as_mut().ok_or(SessionError::NoSession)?;
  let outcome = host.dispatch(event)?;
  Ok((outcome, host.view()))
}

/// Tear down the open session, cancelling its ticker.
/// Called when the workout view goes away.
pub(crate) fn drop_session(state: &AppState) {
  if let Some(host) = lock(&state.session).take() {
    tracing::debug!(training_id = host.view().training_id, "Session closed");
  }
}

/// ---------------------------------------------------------------------------
/// Session Lifecycle
/// ---------------------------------------------------------------------------

/// Open an idle session over a stored training's exercises.
/// Any session already open is discarded along with its ticker.
#[tauri::command]
pub async fn open_session(
  state: State<'_, Arc<AppState>>,
  training_id: i64,
  student_id: i64,
  trainer_id: i64,
) -> Result<SessionView, AppError> {
  load_training(&state.db, training_id).await?;
  let exercise_ids: Vec<ExerciseId> = load_training_exercises(&state.db, training_id)
    .await?
    .iter()
    .map(|item| item.exercise.id)
    .collect();

  let owner = SessionOwner {
    student_id,
    trainer_id,
  };
  let host = SessionHost::new(WorkoutSession::new(training_id, &exercise_ids, owner));
  let view = host.view();

  if let Some(previous) = lock(&state.session).replace(host) {
    tracing::info!(training_id = previous.view().training_id, "Replacing open session");
  }
  if lock(&state.feedback).take().is_some() {
    tracing::warn!("Discarding unsent feedback for the previous session");
  }

  tracing::info!(training_id, exercises = exercise_ids.len(), "Session opened");
  Ok(view)
}

#[tauri::command]
pub async fn start_session(state: State<'_, Arc<AppState>>) -> Result<SessionView, AppError> {
  let (outcome, view) = dispatch(&state, SessionEvent::Start)?;
  if outcome == Outcome::Changed {
    tracing::info!(training_id = view.training_id, "Session started");
  }
  Ok(view)
}

#[tauri::command]
pub async fn toggle_exercise(
  state: State<'_, Arc<AppState>>,
  exercise_id: ExerciseId,
) -> Result<SessionView, AppError> {
  let (_, view) = dispatch(&state, SessionEvent::Toggle(exercise_id))?;
  Ok(view)
}

/// Finish the open session.
///
/// The first finish reports attendance to the backend in the background,
/// records it locally and opens the feedback draft. Neither attendance write
/// can fail the command: the session is already finished by then. Finishing
/// again is a no-op.
#[tauri::command]
pub async fn finish_session(state: State<'_, Arc<AppState>>) -> Result<SessionView, AppError> {
  let (outcome, view) = dispatch(&state, SessionEvent::Finish)?;

  let Outcome::Finished(summary) = outcome else {
    return Ok(view);
  };

  let entry = summary.attendance();
  *lock(&state.feedback) = Some(FeedbackDraft::from_summary(summary));

  if let Some(backend) = state.backend.clone() {
    let entry = entry.clone();
    tauri::async_runtime::spawn(async move {
      if let Err(e) = backend.log_attendance(&entry).await {
        tracing::warn!(training_id = entry.training_id, error = %e, "Failed to report attendance");
      }
    });
  }

  match record_attendance(&state.db, &entry).await {
    Ok(id) => tracing::info!(
      id,
      training_id = entry.training_id,
      duration_seconds = entry.duration_seconds,
      completed = entry.completed_count,
      "Session finished"
    ),
    Err(e) => tracing::warn!(
      training_id = entry.training_id,
      error = %e,
      "Session finished but attendance was not stored locally"
    ),
  }

  Ok(view)
}

#[tauri::command]
pub async fn get_session(state: State<'_, Arc<AppState>>) -> Result<SessionView, AppError> {
  let view = lock(&state.session).as_ref().map(SessionHost::view);
  view.ok_or_else(|| SessionError::NoSession.into())
}

/// The workout screen was left; stop the ticker and forget the session
#[tauri::command]
pub async fn close_session(state: State<'_, Arc<AppState>>) -> Result<(), AppError> {
  drop_session(&state);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Attendance Log
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_attendance_log(
  state: State<'_, Arc<AppState>>,
  student_id: Option<i64>,
) -> Result<Vec<AttendanceRecord>, AppError> {
  let records = sqlx::query_as::<_, AttendanceRecord>(
    r#"
    SELECT * FROM attendance_log
    WHERE ?1 IS NULL OR student_id = ?1
    ORDER BY session_date DESC, id DESC
    LIMIT 100
    "#,
  )
  .bind(student_id)
  .fetch_all(&state.db)
  .await?;

  Ok(records)
}

async fn record_attendance(db: &DbPool, entry: &AttendanceEntry) -> Result<i64, AppError> {
  let result = sqlx::query(
    r#"
    INSERT INTO attendance_log (
      training_id, student_id, trainer_id, session_date, day_name,
      duration_seconds, completed_count, exercise_count
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
  )
  .bind(entry.training_id)
  .bind(entry.student_id)
  .bind(entry.trainer_id)
  .bind(entry.date)
  .bind(&entry.day_name)
  .bind(entry.duration_seconds as i64)
  .bind(entry.completed_count as i64)
  .bind(entry.exercise_count as i64)
  .execute(db)
  .await?;

  Ok(result.last_insert_rowid())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
