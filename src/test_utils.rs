//! Test utilities and helpers for integration and unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Time helpers

use crate::feedback::{FeedbackRecord, Photo};
use crate::models::{ExerciseInfo, TrainingExercise, TrainingSnapshot};
use crate::preset::{save_training_snapshot, ExercisePreset, PresetOverride};
use crate::scheme::{RepType, SchemeFields};
use crate::session::{AttendanceEntry, SessionOwner, SessionSummary, WorkoutSession};
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use sqlx::SqlitePool;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// Store the mock training and return it
pub async fn seed_test_training(pool: &SqlitePool) -> TrainingSnapshot {
  let snapshot = mock_training_snapshot();
  save_training_snapshot(pool, &snapshot)
    .await
    .expect("Failed to seed training");
  snapshot
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub const TEST_OWNER: SessionOwner = SessionOwner {
  student_id: 7,
  trainer_id: 2,
};

fn exercise(id: i64, name: &str, muscle_group: Option<&str>) -> ExerciseInfo {
  ExerciseInfo {
    id,
    name: name.to_string(),
    muscle_group: muscle_group.map(str::to_string),
    equipment: None,
  }
}

/// Training 30 with four exercises:
/// - 11 bench press: complete reps-load preset, override changes reps
/// - 12 intervals: running with only rest
/// - 13 squat: preset gives load, override gives set/reps, rest is missing
/// - 14 mobility: no scheme at all
pub fn mock_training_snapshot() -> TrainingSnapshot {
  TrainingSnapshot {
    id: 30,
    name: "Upper / conditioning".to_string(),
    description: Some("Week 3".to_string()),
    exercises: vec![
      TrainingExercise {
        exercise: exercise(11, "Bench press", Some("chest")),
        position: 0,
        preset: ExercisePreset {
          rep_type: Some(RepType::RepsLoad),
          fields: SchemeFields {
            set: Some(3.0),
            reps: Some(12.0),
            load: Some(50.0),
            rest: Some(60.0),
            ..Default::default()
          },
        },
        overrides: PresetOverride {
          rep_type: None,
          fields: SchemeFields {
            reps: Some(10.0),
            ..Default::default()
          },
        },
      },
      TrainingExercise {
        exercise: exercise(12, "Treadmill intervals", None),
        position: 1,
        preset: ExercisePreset {
          rep_type: Some(RepType::Running),
          fields: SchemeFields {
            rest: Some(90.0),
            ..Default::default()
          },
        },
        overrides: PresetOverride::default(),
      },
      TrainingExercise {
        exercise: exercise(13, "Back squat", Some("legs")),
        position: 2,
        preset: ExercisePreset {
          rep_type: Some(RepType::RepsLoad),
          fields: SchemeFields {
            load: Some(40.0),
            ..Default::default()
          },
        },
        overrides: PresetOverride {
          rep_type: None,
          fields: SchemeFields {
            set: Some(4.0),
            reps: Some(10.0),
            ..Default::default()
          },
        },
      },
      TrainingExercise {
        exercise: exercise(14, "Hip mobility", None),
        position: 3,
        preset: ExercisePreset::default(),
        overrides: PresetOverride::default(),
      },
    ],
  }
}

/// A finished session over the mock training with exercise 11 done
pub fn mock_finished_session() -> WorkoutSession {
  let snapshot = mock_training_snapshot();
  let mut session = WorkoutSession::new(snapshot.id, &snapshot.exercise_ids(), TEST_OWNER);
  session.start();
  session.toggle(11);
  session.finish().expect("Session should finish");
  session
}

pub fn mock_session_summary() -> SessionSummary {
  let started_at = monday_evening();
  SessionSummary {
    training_id: 30,
    owner: TEST_OWNER,
    started_at,
    finished_at: started_at + Duration::minutes(30),
    elapsed_seconds: 1800,
    exercise_count: 4,
    completed: vec![11, 12],
    progress_percent: 50,
  }
}

pub fn mock_attendance_entry() -> AttendanceEntry {
  mock_session_summary().attendance_in(&Utc)
}

pub fn mock_photo(n: usize) -> Photo {
  Photo {
    file_name: format!("photo_{}.jpg", n),
    content_type: "image/jpeg".to_string(),
    bytes: b"jpeg".to_vec(),
  }
}

pub fn mock_feedback_record(note: &str, photo_count: usize) -> FeedbackRecord {
  FeedbackRecord {
    student_id: TEST_OWNER.student_id,
    trainer_id: TEST_OWNER.trainer_id,
    note: note.to_string(),
    photos: (1..=photo_count).map(mock_photo).collect(),
    session: mock_session_summary(),
  }
}

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// 2024-03-04 18:00 UTC, a Monday
pub fn monday_evening() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap()
}

pub fn monday_date() -> NaiveDate {
  NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> = sqlx::query_as(
      "SELECT name FROM sqlite_master WHERE type='table' AND name IN ('trainings', 'exercises', 'training_exercises', 'attendance_log', 'feedback_log')"
    )
    .fetch_all(&pool)
    .await
    .expect("Failed to query tables");

    assert_eq!(tables.len(), 5, "Expected 5 tables, got {}", tables.len());

    teardown_test_db(pool).await;
  }

  #[tokio::test]
  async fn test_seed_training_inserts_links() {
    let pool = setup_test_db().await;
    seed_test_training(&pool).await;

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM training_exercises WHERE training_id = 30")
      .fetch_one(&pool)
      .await
      .expect("Failed to count links");
    assert_eq!(count, 4);

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let session = mock_finished_session();
    assert!(session.summary().is_ok());

    let entry = mock_attendance_entry();
    assert_eq!(entry.date, monday_date());
    assert_eq!(entry.day_name, "Monday");

    let record = mock_feedback_record("note", 2);
    assert_eq!(record.photos.len(), 2);
  }
}
