use serde::{Deserialize, Serialize};

use crate::preset::{resolve, EffectiveScheme, ExercisePreset, PresetOverride};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Training {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
}

/// Display metadata for an exercise in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExerciseInfo {
  pub id: i64,
  pub name: String,
  pub muscle_group: Option<String>,
  pub equipment: Option<String>,
}

/// One exercise of a training: the library preset plus the per-training override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingExercise {
  pub exercise: ExerciseInfo,
  pub position: i64,
  #[serde(default)]
  pub preset: ExercisePreset,
  #[serde(rename = "override", default)]
  pub overrides: PresetOverride,
}

impl TrainingExercise {
  pub fn effective(&self) -> EffectiveScheme {
    resolve(&self.preset, &self.overrides)
  }
}

/// A training as delivered by the backend, exercises in prescribed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSnapshot {
  pub id: i64,
  pub name: String,
  pub description: Option<String>,
  pub exercises: Vec<TrainingExercise>,
}

impl TrainingSnapshot {
  pub fn exercise_ids(&self) -> Vec<i64> {
    self.exercises.iter().map(|e| e.exercise.id).collect()
  }
}
