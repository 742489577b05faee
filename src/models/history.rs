use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A finished session as recorded in the local attendance log
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AttendanceRecord {
  pub id: i64,
  pub training_id: i64,
  pub student_id: i64,
  pub trainer_id: i64,
  pub session_date: NaiveDate,
  pub day_name: String,
  pub duration_seconds: i64,
  pub completed_count: i64,
  pub exercise_count: i64,
  pub created_at: Option<DateTime<Utc>>,
}

/// Feedback kept locally after submission; `delivered` tells whether the
/// backend accepted it
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedbackLogEntry {
  pub id: i64,
  pub training_id: i64,
  pub student_id: i64,
  pub trainer_id: i64,
  pub note: String,
  pub photo_count: i64,
  pub delivered: bool,
  pub created_at: Option<DateTime<Utc>>,
}
