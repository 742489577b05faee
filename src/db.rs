use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tauri::Manager;

use crate::backend::BackendClient;
use crate::feedback::FeedbackDraft;
use crate::host::SessionHost;

pub type DbPool = SqlitePool;

/// Application state shared by all commands
///
/// At most one workout session is open at a time; it belongs to the workout
/// screen currently shown. The feedback draft exists only between a finished
/// session and its submit/skip.
pub struct AppState {
  pub db: DbPool,
  /// `None` when no backend URL is configured (offline)
  pub backend: Option<BackendClient>,
  pub session: Mutex<Option<SessionHost>>,
  pub feedback: Mutex<Option<FeedbackDraft>>,
}

impl AppState {
  pub fn new(db: DbPool, backend: Option<BackendClient>) -> Self {
    Self {
      db,
      backend,
      session: Mutex::new(None),
      feedback: Mutex::new(None),
    }
  }
}

/// Get the path to the database file
/// Stored in the platform app data dir as coach-session.db
fn get_db_path<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<PathBuf, Box<dyn std::error::Error>> {
  let data_dir = app
    .path()
    .app_data_dir()
    .map_err(|e| format!("Failed to get app data dir: {}", e))?;

  // Create directory if it doesn't exist
  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("coach-session.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db<R: tauri::Runtime>(app: &tauri::AppHandle<R>) -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path(app)?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!(path = %db_path.display(), "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
