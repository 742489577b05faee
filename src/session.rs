//! Workout Session State Machine
//!
//! Tracks one student working through a training's exercise list:
//! - Idle: created when the workout screen opens
//! - Active: clock running, exercises can be checked off
//! - Finished: terminal, hands over to feedback capture
//!
//! Every change goes through `WorkoutSession::apply`. Events that are not
//! legal in the current state are ignored rather than reported, because
//! duplicate taps are normal UI noise. The one exception is finishing a
//! session that never started, which only a programming error can produce.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Local, NaiveDate, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type TrainingId = i64;
pub type ExerciseId = i64;

// ---------------------------------------------------------------------------
/// Session Owner: who the session belongs to
// ---------------------------------------------------------------------------

/// Passed explicitly to every session; there are no fallback ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOwner {
    pub student_id: i64,
    pub trainer_id: i64,
}

// ---------------------------------------------------------------------------
/// Status / Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
    Finished,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "exercise_id", rename_all = "snake_case")]
pub enum SessionEvent {
    Start,
    /// One second of the external clock
    Tick,
    Toggle(ExerciseId),
    Finish,
}

/// What an event did to the session
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Changed,
    Ignored,
    Finished(SessionSummary),
}

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SessionError {
    #[error("Workout session has not been started")]
    NotStarted,

    #[error("Workout session is not finished yet")]
    NotFinished,

    #[error("No workout session is open")]
    NoSession,
}

// ---------------------------------------------------------------------------
/// Workout Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WorkoutSession {
    training_id: TrainingId,
    owner: SessionOwner,
    exercise_ids: Vec<ExerciseId>,
    status: SessionStatus,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    elapsed_seconds: u64,
    completed: BTreeSet<ExerciseId>,
}

impl WorkoutSession {
    /// Create an idle session over a snapshot of the training's exercises.
    /// Duplicate ids are dropped, first occurrence wins.
    pub fn new(training_id: TrainingId, exercise_ids: &[ExerciseId], owner: SessionOwner) -> Self {
        let mut seen = BTreeSet::new();
        let exercise_ids = exercise_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();

        Self {
            training_id,
            owner,
            exercise_ids,
            status: SessionStatus::Idle,
            started_at: None,
            finished_at: None,
            elapsed_seconds: 0,
            completed: BTreeSet::new(),
        }
    }

    /// The single transition function
    pub fn apply(
        &mut self,
        event: SessionEvent,
        now: DateTime<Utc>,
    ) -> Result<Outcome, SessionError> {
        use SessionEvent::*;
        use SessionStatus::*;

        match (self.status, event) {
            (Idle, Start) => {
                self.status = Active;
                self.started_at = Some(now);
                self.elapsed_seconds = 0;
                self.completed.clear();
                Ok(Outcome::Changed)
            }
            (Active, Tick) => {
                self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
                Ok(Outcome::Changed)
            }
            (Active, Toggle(id)) => {
                if !self.exercise_ids.contains(&id) {
                    return Ok(Outcome::Ignored);
                }
                if !self.completed.remove(&id) {
                    self.completed.insert(id);
                }
                Ok(Outcome::Changed)
            }
            (Active, Finish) => {
                self.status = Finished;
                self.finished_at = Some(now);
                Ok(Outcome::Finished(self.build_summary(now)))
            }
            (Idle, Finish) => Err(SessionError::NotStarted),
            _ => Ok(Outcome::Ignored),
        }
    }

    pub fn start(&mut self) -> Outcome {
        // Start never errors
        self.apply(SessionEvent::Start, Utc::now())
            .unwrap_or(Outcome::Ignored)
    }

    pub fn tick(&mut self) -> Outcome {
        self.apply(SessionEvent::Tick, Utc::now())
            .unwrap_or(Outcome::Ignored)
    }

    pub fn toggle(&mut self, exercise_id: ExerciseId) -> Outcome {
        self.apply(SessionEvent::Toggle(exercise_id), Utc::now())
            .unwrap_or(Outcome::Ignored)
    }

    pub fn finish(&mut self) -> Result<Outcome, SessionError> {
        self.apply(SessionEvent::Finish, Utc::now())
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn exercise_ids(&self) -> &[ExerciseId] {
        &self.exercise_ids
    }

    pub fn completed(&self) -> &BTreeSet<ExerciseId> {
        &self.completed
    }

    #[cfg(test)]
    pub fn is_completed(&self, exercise_id: ExerciseId) -> bool {
        self.completed.contains(&exercise_id)
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Completed share of the exercise list, floored. Always computed from
    /// current state, never cached.
    pub fn progress_percent(&self) -> u8 {
        if self.exercise_ids.is_empty() {
            return 0;
        }
        let done = self
            .exercise_ids
            .iter()
            .filter(|id| self.completed.contains(id))
            .count();
        (100 * done / self.exercise_ids.len()) as u8
    }

    /// `MM:SS`, or `H:MM:SS` once past an hour
    pub fn elapsed_label(&self) -> String {
        let secs = self.elapsed_seconds;
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if h > 0 {
            format!("{}:{:02}:{:02}", h, m, s)
        } else {
            format!("{:02}:{:02}", m, s)
        }
    }

    /// Summary of a finished session
    pub fn summary(&self) -> Result<SessionSummary, SessionError> {
        match (self.status, self.finished_at) {
            (SessionStatus::Finished, Some(finished_at)) => Ok(self.build_summary(finished_at)),
            _ => Err(SessionError::NotFinished),
        }
    }

    fn build_summary(&self, finished_at: DateTime<Utc>) -> SessionSummary {
        SessionSummary {
            training_id: self.training_id,
            owner: self.owner,
            started_at: self.started_at.unwrap_or(finished_at),
            finished_at,
            elapsed_seconds: self.elapsed_seconds,
            exercise_count: self.exercise_ids.len(),
            completed: self.completed.iter().copied().collect(),
            progress_percent: self.progress_percent(),
        }
    }
}

// ---------------------------------------------------------------------------
/// Session Summary: what a finished session hands to feedback and attendance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub training_id: TrainingId,
    pub owner: SessionOwner,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_seconds: u64,
    pub exercise_count: usize,
    pub completed: Vec<ExerciseId>,
    pub progress_percent: u8,
}

impl SessionSummary {
    /// Attendance entry dated in the device's local time zone
    pub fn attendance(&self) -> AttendanceEntry {
        self.attendance_in(&Local)
    }

    pub fn attendance_in<Tz: TimeZone>(&self, tz: &Tz) -> AttendanceEntry {
        let date = self.started_at.with_timezone(tz).date_naive();
        AttendanceEntry {
            training_id: self.training_id,
            student_id: self.owner.student_id,
            trainer_id: self.owner.trainer_id,
            date,
            day_name: day_name(date.weekday()).to_string(),
            duration_seconds: self.elapsed_seconds,
            completed_count: self.completed.len(),
            exercise_count: self.exercise_count,
        }
    }
}

/// "A session happened" record for the attendance/points collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub training_id: TrainingId,
    pub student_id: i64,
    pub trainer_id: i64,
    pub date: NaiveDate,
    pub day_name: String,
    pub duration_seconds: u64,
    pub completed_count: usize,
    pub exercise_count: usize,
}

fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ---------------------------------------------------------------------------
/// Session View: what the frontend renders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub training_id: TrainingId,
    pub status: SessionStatus,
    pub exercise_ids: Vec<ExerciseId>,
    pub completed: Vec<ExerciseId>,
    pub elapsed_seconds: u64,
    pub elapsed_label: String,
    pub progress_percent: u8,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl From<&WorkoutSession> for SessionView {
    fn from(session: &WorkoutSession) -> Self {
        Self {
            training_id: session.training_id,
            status: session.status,
            exercise_ids: session.exercise_ids().to_vec(),
            completed: session.completed().iter().copied().collect(),
            elapsed_seconds: session.elapsed_seconds(),
            elapsed_label: session.elapsed_label(),
            progress_percent: session.progress_percent(),
            started_at: session.started_at(),
            finished_at: session.finished_at,
        }
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const OWNER: SessionOwner = SessionOwner {
        student_id: 7,
        trainer_id: 2,
    };

    fn session(ids: &[ExerciseId]) -> WorkoutSession {
        WorkoutSession::new(30, ids, OWNER)
    }

    fn active(ids: &[ExerciseId]) -> WorkoutSession {
        let mut s = session(ids);
        assert_eq!(s.start(), Outcome::Changed);
        s
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session(&[1, 2, 3]);
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.started_at(), None);
        assert_eq!(s.elapsed_seconds(), 0);
        assert_eq!(s.progress_percent(), 0);
    }

    #[test]
    fn test_scenario_three_exercises_two_done() {
        let mut s = session(&[1, 2, 3]);
        s.start();
        s.toggle(1);
        s.toggle(2);
        assert_eq!(s.progress_percent(), 66);

        let outcome = s.finish().unwrap();
        assert_eq!(s.status(), SessionStatus::Finished);
        assert_eq!(s.completed().iter().copied().collect::<Vec<_>>(), vec![1, 2]);

        match outcome {
            Outcome::Finished(summary) => {
                assert_eq!(summary.completed, vec![1, 2]);
                assert_eq!(summary.progress_percent, 66);
                assert_eq!(summary.exercise_count, 3);
            }
            other => panic!("Expected Finished outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_start_records_time_and_resets() {
        let mut s = session(&[1, 2]);
        let now = Utc::now();
        s.apply(SessionEvent::Start, now).unwrap();
        assert_eq!(s.status(), SessionStatus::Active);
        assert_eq!(s.started_at(), Some(now));
        assert_eq!(s.elapsed_seconds(), 0);
        assert!(s.completed().is_empty());
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut s = active(&[1, 2, 3]);
        s.toggle(3);
        let before = s.completed().clone();

        for id in [1, 2, 3, 99] {
            s.toggle(id);
            s.toggle(id);
            assert_eq!(s.completed(), &before, "double toggle of {} changed state", id);
        }
    }

    #[test]
    fn test_toggle_unknown_exercise_ignored() {
        let mut s = active(&[1, 2]);
        assert_eq!(s.toggle(42), Outcome::Ignored);
        assert!(s.completed().is_empty());
    }

    #[test]
    fn test_toggle_outside_active_ignored() {
        let mut s = session(&[1, 2]);
        assert_eq!(s.toggle(1), Outcome::Ignored);
        assert!(s.completed().is_empty());

        s.start();
        s.toggle(1);
        s.finish().unwrap();
        assert_eq!(s.toggle(2), Outcome::Ignored);
        assert_eq!(s.toggle(1), Outcome::Ignored);
        assert!(s.is_completed(1));
        assert!(!s.is_completed(2));
    }

    #[test]
    fn test_finish_from_idle_rejected() {
        let mut s = session(&[1]);
        assert_eq!(s.finish(), Err(SessionError::NotStarted));
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.summary(), Err(SessionError::NotFinished));
    }

    #[test]
    fn test_duplicate_taps_are_noops() {
        let mut s = active(&[1]);
        let started = s.started_at();
        assert_eq!(s.start(), Outcome::Ignored);
        assert_eq!(s.started_at(), started);

        s.finish().unwrap();
        assert_eq!(s.finish(), Ok(Outcome::Ignored));
        assert_eq!(s.start(), Outcome::Ignored);
        assert_eq!(s.status(), SessionStatus::Finished);
    }

    #[test]
    fn test_tick_only_advances_while_active() {
        let mut s = session(&[1]);
        assert_eq!(s.tick(), Outcome::Ignored);
        assert_eq!(s.elapsed_seconds(), 0);

        s.start();
        for _ in 0..5 {
            s.tick();
        }
        assert_eq!(s.elapsed_seconds(), 5);

        s.finish().unwrap();
        s.tick();
        assert_eq!(s.elapsed_seconds(), 5);
    }

    #[test]
    fn test_empty_exercise_list_progress_is_zero() {
        let mut s = active(&[]);
        assert_eq!(s.progress_percent(), 0);
        s.toggle(1);
        assert_eq!(s.progress_percent(), 0);
    }

    #[test]
    fn test_progress_bounds_over_all_subsets() {
        let ids = [1, 2, 3, 4, 5, 6, 7];
        for mask in 0u32..(1 << ids.len()) {
            let mut s = active(&ids);
            for (bit, id) in ids.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    s.toggle(*id);
                }
            }
            let expected = 100 * mask.count_ones() as usize / ids.len();
            assert_eq!(s.progress_percent() as usize, expected);
            assert!(s.progress_percent() <= 100);
        }
    }

    #[test]
    fn test_all_done_is_hundred() {
        let mut s = active(&[4, 5]);
        s.toggle(4);
        s.toggle(5);
        assert_eq!(s.progress_percent(), 100);
    }

    #[test]
    fn test_duplicate_ids_are_collapsed() {
        let mut s = active(&[1, 1, 2]);
        assert_eq!(s.exercise_ids(), &[1, 2]);
        s.toggle(1);
        s.toggle(2);
        assert_eq!(s.progress_percent(), 100);
    }

    #[test]
    fn test_snapshot_independent_of_source_list() {
        let mut ids = vec![1, 2, 3];
        let s = session(&ids);
        ids.push(4);
        assert_eq!(s.exercise_ids(), &[1, 2, 3]);
    }

    #[test]
    fn test_elapsed_label() {
        let mut s = active(&[1]);
        for _ in 0..75 {
            s.tick();
        }
        assert_eq!(s.elapsed_label(), "01:15");

        for _ in 0..3600 {
            s.tick();
        }
        assert_eq!(s.elapsed_label(), "1:01:15");
    }

    #[test]
    fn test_attendance_from_summary() {
        let mut s = session(&[1, 2, 3]);
        // 2024-03-04 was a Monday
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 18, 0, 0).unwrap();
        s.apply(SessionEvent::Start, start).unwrap();
        s.toggle(2);
        for _ in 0..1800 {
            s.tick();
        }
        s.apply(SessionEvent::Finish, start + Duration::minutes(30)).unwrap();

        let entry = s.summary().unwrap().attendance_in(&Utc);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(entry.day_name, "Monday");
        assert_eq!(entry.duration_seconds, 1800);
        assert_eq!(entry.completed_count, 1);
        assert_eq!(entry.exercise_count, 3);
        assert_eq!(entry.student_id, 7);
        assert_eq!(entry.trainer_id, 2);
    }

    #[test]
    fn test_view_reflects_state() {
        let mut s = active(&[1, 2]);
        s.toggle(2);
        s.tick();
        let view = SessionView::from(&s);
        assert_eq!(view.status, SessionStatus::Active);
        assert_eq!(view.completed, vec![2]);
        assert_eq!(view.progress_percent, 50);
        assert_eq!(view.elapsed_label, "00:01");
        assert_eq!(view.finished_at, None);
    }

    #[test]
    fn test_event_json_shape() {
        let toggle: SessionEvent =
            serde_json::from_str(r#"{"type":"toggle","exercise_id":4}"#).unwrap();
        assert_eq!(toggle, SessionEvent::Toggle(4));
        let start: SessionEvent = serde_json::from_str(r#"{"type":"start"}"#).unwrap();
        assert_eq!(start, SessionEvent::Start);
    }
}
