use crate::commands::require_backend;
use crate::db::{AppState, DbPool};
use crate::error::AppError;
use crate::models::{ExerciseInfo, Training};
use crate::preset::{
  load_training, load_training_exercises, save_training_snapshot, EffectiveScheme,
};
use crate::scheme::SchemeError;
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

/// One exercise as the workout screen shows it
#[derive(Debug, Serialize)]
pub struct ExerciseDetail {
  pub exercise: ExerciseInfo,
  pub position: i64,
  /// True when this training overrides the library preset
  pub customized: bool,
  pub effective: EffectiveScheme,
  /// Formatted scheme, `None` when there is no scheme or it is incomplete
  pub summary: Option<String>,
  pub issue: Option<SchemeError>,
}

#[derive(Debug, Serialize)]
pub struct TrainingDetail {
  pub training: Training,
  pub exercises: Vec<ExerciseDetail>,
}

/// ---------------------------------------------------------------------------
/// Sync Training from Backend
/// ---------------------------------------------------------------------------

/// Fetch a training with its presets and overrides and replace the local copy
#[tauri::command]
pub async fn sync_training(
  state: State<'_, Arc<AppState>>,
  training_id: i64,
) -> Result<TrainingDetail, AppError> {
  let backend = require_backend(&state)?;
  let snapshot = backend.fetch_training(training_id).await?;

  if snapshot.id != training_id {
    tracing::warn!(requested = training_id, received = snapshot.id, "Backend returned a different training");
  }

  save_training_snapshot(&state.db, &snapshot).await?;
  tracing::info!(
    training_id = snapshot.id,
    exercises = snapshot.exercises.len(),
    "Training synced"
  );

  load_training_detail(&state.db, snapshot.id).await
}

/// ---------------------------------------------------------------------------
/// Training Detail
/// ---------------------------------------------------------------------------

#[tauri::command]
pub async fn get_training_detail(
  state: State<'_, Arc<AppState>>,
  training_id: i64,
) -> Result<TrainingDetail, AppError> {
  load_training_detail(&state.db, training_id).await
}

pub(crate) async fn load_training_detail(
  pool: &DbPool,
  training_id: i64,
) -> Result<TrainingDetail, AppError> {
  let training = load_training(pool, training_id).await?;
  let exercises = load_training_exercises(pool, training_id)
    .await?
    .into_iter()
    .map(|item| {
      let effective = item.effective();
      let summary = effective.scheme().ok().flatten().map(|s| s.format());
      ExerciseDetail {
        customized: !item.overrides.is_empty(),
        issue: effective.issue(),
        exercise: item.exercise,
        position: item.position,
        effective,
        summary,
      }
    })
    .collect();

  Ok(TrainingDetail {
    training,
    exercises,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
