//! Coaching backend client
//!
//! The REST collaborators this app talks to: the training directory, the
//! feedback endpoint and the attendance log. Calls are single attempts; a
//! failure is reported to the caller and nothing is retried here.

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Serialize;
use std::env;
use std::time::Duration;
use url::Url;

use crate::feedback::FeedbackRecord;
use crate::models::TrainingSnapshot;
use crate::session::AttendanceEntry;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

const API_URL_VAR: &str = "COACH_API_URL";
const API_TIMEOUT_VAR: &str = "COACH_API_TIMEOUT_SECS";
const DEFAULT_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone)]
pub struct BackendConfig {
  pub base_url: Url,
  pub timeout: Duration,
}

impl BackendConfig {
  pub fn from_env() -> Result<Self, BackendError> {
    let base_url =
      env::var(API_URL_VAR).map_err(|_| BackendError::MissingConfig(API_URL_VAR.into()))?;

    let timeout_secs = match env::var(API_TIMEOUT_VAR) {
      Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
        BackendError::InvalidConfig(format!("{} must be a whole number of seconds", API_TIMEOUT_VAR))
      })?,
      Err(_) => DEFAULT_TIMEOUT_SECS,
    };

    Self::new(&base_url, Duration::from_secs(timeout_secs))
  }

  /// The base URL always ends with `/` so endpoint paths join under it
  pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
    let mut url =
      Url::parse(base_url.trim()).map_err(|e| BackendError::InvalidUrl(e.to_string()))?;
    if !url.path().ends_with('/') {
      let path = format!("{}/", url.path());
      url.set_path(&path);
    }

    Ok(Self {
      base_url: url,
      timeout,
    })
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid configuration: {0}")]
  InvalidConfig(String),

  #[error("Invalid backend URL: {0}")]
  InvalidUrl(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Backend returned {status}: {body}")]
  Api { status: u16, body: String },

  #[error("Parse error: {0}")]
  Parse(String),
}

impl Serialize for BackendError {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    serializer.serialize_str(&self.to_string())
  }
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BackendClient {
  http: Client,
  config: BackendConfig,
}

impl BackendClient {
  pub fn new(config: BackendConfig) -> Result<Self, BackendError> {
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  pub fn from_env() -> Result<Self, BackendError> {
    Self::new(BackendConfig::from_env()?)
  }

  pub fn base_url(&self) -> &Url {
    &self.config.base_url
  }

  fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
    self
      .config
      .base_url
      .join(path)
      .map_err(|e| BackendError::InvalidUrl(e.to_string()))
  }

  /// Fetch a training with its ordered exercises, presets and overrides
  pub async fn fetch_training(&self, training_id: i64) -> Result<TrainingSnapshot, BackendError> {
    let url = self.endpoint(&format!("trainings/{}", training_id))?;
    let response = check_status(self.http.get(url).send().await?).await?;

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
      tracing::warn!(training_id, error = %e, "Unparseable training payload");
      BackendError::Parse(format!("Failed to parse training {}: {}", training_id, e))
    })
  }

  /// Deliver a feedback record (note plus photo blobs)
  pub async fn submit_feedback(&self, record: &FeedbackRecord) -> Result<(), BackendError> {
    let session_json =
      serde_json::to_string(&record.session).map_err(|e| BackendError::Parse(e.to_string()))?;

    let mut form = Form::new()
      .text("student_id", record.student_id.to_string())
      .text("trainer_id", record.trainer_id.to_string())
      .text("note", record.note.clone())
      .text("session", session_json);

    for photo in &record.photos {
      let part = Part::bytes(photo.bytes.clone())
        .file_name(photo.file_name.clone())
        .mime_str(&photo.content_type)?;
      form = form.part("photos", part);
    }

    let url = self.endpoint("feedback")?;
    check_status(self.http.post(url).multipart(form).send().await?).await?;
    Ok(())
  }

  /// Record that a session happened
  pub async fn log_attendance(&self, entry: &AttendanceEntry) -> Result<(), BackendError> {
    let url = self.endpoint("attendance")?;
    check_status(self.http.post(url).json(entry).send().await?).await?;
    Ok(())
  }
}

async fn check_status(response: Response) -> Result<Response, BackendError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  let body = response.text().await.unwrap_or_default();
  Err(BackendError::Api {
    status: status.as_u16(),
    body,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
