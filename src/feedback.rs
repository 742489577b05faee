//! Post-session feedback
//!
//! Once a session finishes the student may leave a note and up to five
//! photos for their trainer, or skip. Submitting and skipping both close the
//! session lifecycle; delivering the record is the backend client's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::{SessionError, SessionOwner, SessionSummary, WorkoutSession};

/// Attachment cap carried over from the session-completion flow
pub const MAX_PHOTOS: usize = 5;

#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum FeedbackError {
  #[error("At most {limit} photos can be attached")]
  AttachmentLimitExceeded { limit: usize },

  #[error("No photo at position {0}")]
  PhotoNotFound(usize),

  #[error("No feedback is pending")]
  NoFeedbackPending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
  pub file_name: String,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

/// What gets handed to the feedback endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackRecord {
  pub student_id: i64,
  pub trainer_id: i64,
  pub note: String,
  pub photos: Vec<Photo>,
  pub session: SessionSummary,
}

/// How the feedback step ended. Either way the session is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionClosed {
  Submitted,
  Skipped,
}

/// Feedback being composed for one finished session
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackDraft {
  owner: SessionOwner,
  summary: SessionSummary,
  note: String,
  photos: Vec<Photo>,
}

impl FeedbackDraft {
  /// Only a finished session can collect feedback
  pub fn from_session(session: &WorkoutSession) -> Result<Self, SessionError> {
    let summary = session.summary()?;
    Ok(Self::from_summary(summary))
  }

  /// Only for the summary carried by `Outcome::Finished`, which is what the
  /// finish command hands over
  pub(crate) fn from_summary(summary: SessionSummary) -> Self {
    Self {
      owner: summary.owner,
      summary,
      note: String::new(),
      photos: Vec::new(),
    }
  }

  pub fn summary(&self) -> &SessionSummary {
    &self.summary
  }

  pub fn note(&self) -> &str {
    &self.note
  }

  pub fn photos(&self) -> &[Photo] {
    &self.photos
  }

  /// Notes are optional, blank is fine
  pub fn set_note(&mut self, note: impl Into<String>) {
    self.note = note.into();
  }

  /// Returns the new photo count
  pub fn attach_photo(&mut self, photo: Photo) -> Result<usize, FeedbackError> {
    if self.photos.len() >= MAX_PHOTOS {
      return Err(FeedbackError::AttachmentLimitExceeded { limit: MAX_PHOTOS });
    }
    self.photos.push(photo);
    Ok(self.photos.len())
  }

  pub fn remove_photo(&mut self, index: usize) -> Result<Photo, FeedbackError> {
    if index >= self.photos.len() {
      return Err(FeedbackError::PhotoNotFound(index));
    }
    Ok(self.photos.remove(index))
  }

  /// Build a record from a note and photos in one go
  pub fn capture(&self, note: &str, photos: Vec<Photo>) -> Result<FeedbackRecord, FeedbackError> {
    if photos.len() > MAX_PHOTOS {
      return Err(FeedbackError::AttachmentLimitExceeded { limit: MAX_PHOTOS });
    }
    Ok(self.record(note, photos))
  }

  pub fn submit(mut self) -> (FeedbackRecord, SessionClosed) {
    let photos = std::mem::take(&mut self.photos);
    let record = self.record(&self.note, photos);
    (record, SessionClosed::Submitted)
  }

  pub fn skip(self) -> SessionClosed {
    SessionClosed::Skipped
  }

  fn record(&self, note: &str, photos: Vec<Photo>) -> FeedbackRecord {
    FeedbackRecord {
      student_id: self.owner.student_id,
      trainer_id: self.owner.trainer_id,
      note: note.trim().to_string(),
      photos,
      session: self.summary.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn finished_session() -> WorkoutSession {
    let owner = SessionOwner {
      student_id: 12,
      trainer_id: 3,
    };
    let mut session = WorkoutSession::new(5, &[1, 2], owner);
    session.start();
    session.toggle(1);
    session.finish().unwrap();
    session
  }

  fn photo(n: usize) -> Photo {
    Photo {
      file_name: format!("photo_{}.jpg", n),
      content_type: "image/jpeg".to_string(),
      bytes: vec![n as u8; 4],
    }
  }

  #[test]
  fn test_requires_finished_session() {
    let owner = SessionOwner {
      student_id: 1,
      trainer_id: 1,
    };
    let mut session = WorkoutSession::new(5, &[1], owner);
    assert_eq!(
      FeedbackDraft::from_session(&session),
      Err(SessionError::NotFinished)
    );

    session.start();
    assert_eq!(
      FeedbackDraft::from_session(&session),
      Err(SessionError::NotFinished)
    );
  }

  #[test]
  fn test_sixth_photo_rejected() {
    let mut draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    for n in 0..MAX_PHOTOS {
      assert_eq!(draft.attach_photo(photo(n)), Ok(n + 1));
    }
    let before = draft.photos().to_vec();

    assert_eq!(
      draft.attach_photo(photo(99)),
      Err(FeedbackError::AttachmentLimitExceeded { limit: 5 })
    );
    assert_eq!(draft.photos(), before.as_slice());
  }

  #[test]
  fn test_removing_frees_a_slot() {
    let mut draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    for n in 0..MAX_PHOTOS {
      draft.attach_photo(photo(n)).unwrap();
    }
    let removed = draft.remove_photo(0).unwrap();
    assert_eq!(removed.file_name, "photo_0.jpg");
    assert!(draft.attach_photo(photo(6)).is_ok());
    assert_eq!(draft.remove_photo(10), Err(FeedbackError::PhotoNotFound(10)));
  }

  #[test]
  fn test_submit_carries_owner_and_summary() {
    let mut draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    draft.set_note("  Felt strong today ");
    draft.attach_photo(photo(1)).unwrap();

    let (record, closed) = draft.submit();
    assert_eq!(closed, SessionClosed::Submitted);
    assert_eq!(record.student_id, 12);
    assert_eq!(record.trainer_id, 3);
    assert_eq!(record.note, "Felt strong today");
    assert_eq!(record.photos.len(), 1);
    assert_eq!(record.session.completed, vec![1]);
  }

  #[test]
  fn test_blank_note_is_accepted() {
    let draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    let (record, _) = draft.submit();
    assert_eq!(record.note, "");
  }

  #[test]
  fn test_capture_enforces_cap() {
    let draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    let five: Vec<Photo> = (0..5).map(photo).collect();
    let record = draft.capture(" ok ", five).unwrap();
    assert_eq!(record.note, "ok");
    assert_eq!(record.photos.len(), 5);

    let six: Vec<Photo> = (0..6).map(photo).collect();
    assert_eq!(
      draft.capture("ok", six),
      Err(FeedbackError::AttachmentLimitExceeded { limit: 5 })
    );
  }

  #[test]
  fn test_skip_closes_session() {
    let draft = FeedbackDraft::from_session(&finished_session()).unwrap();
    assert_eq!(draft.skip(), SessionClosed::Skipped);
  }
}
