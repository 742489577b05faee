mod backend;
mod commands;
mod db;
mod error;
mod feedback;
mod host;
mod models;
mod preset;
mod scheme;
mod session;

#[cfg(test)]
mod test_utils;

use db::AppState;
use std::sync::Arc;
use tauri::Manager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "coach_session_lib=info".into()),
    )
    .with(tracing_subscriber::fmt::layer())
    .init();

  tauri::Builder::default()
    .setup(|app| {
      let backend = match backend::BackendClient::from_env() {
        Ok(client) => {
          tracing::info!(url = %client.base_url(), "Coaching backend configured");
          Some(client)
        }
        Err(e) => {
          tracing::warn!(error = %e, "Coaching backend unavailable, running offline");
          None
        }
      };

      let app_handle = app.handle().clone();
      tauri::async_runtime::block_on(async move {
        match db::initialize_db(&app_handle).await {
          Ok(pool) => {
            let state = Arc::new(AppState::new(pool, backend));
            app_handle.manage(state);
            tracing::info!("Database ready");
          }
          Err(e) => {
            tracing::error!(error = %e, "Failed to initialize database");
          }
        }
      });
      Ok(())
    })
    .on_window_event(|window, event| {
      // Tearing down the workout view must not leave a ticker running
      if let tauri::WindowEvent::Destroyed = event {
        if let Some(state) = window.try_state::<Arc<AppState>>() {
          commands::session::drop_session(&state);
        }
      }
    })
    .invoke_handler(tauri::generate_handler![
      // Scheme commands
      commands::scheme::get_rep_types,
      commands::scheme::get_required_fields,
      commands::scheme::validate_scheme,
      commands::scheme::format_scheme,
      commands::scheme::resolve_exercise_scheme,
      // Training commands
      commands::training::sync_training,
      commands::training::get_training_detail,
      // Session commands
      commands::session::open_session,
      commands::session::start_session,
      commands::session::toggle_exercise,
      commands::session::finish_session,
      commands::session::get_session,
      commands::session::close_session,
      commands::session::get_attendance_log,
      // Feedback commands
      commands::feedback::get_feedback,
      commands::feedback::set_feedback_note,
      commands::feedback::attach_feedback_photo,
      commands::feedback::remove_feedback_photo,
      commands::feedback::submit_feedback,
      commands::feedback::skip_feedback,
      commands::feedback::get_feedback_log,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}
