use crate::db::AppState;
use crate::error::AppError;
use crate::preset::load_training_exercise;
use crate::scheme::{RepType, RepetitionScheme, SchemeDraft, SchemeError, SchemeField};
use serde::Serialize;
use std::sync::Arc;
use tauri::State;

/// ---------------------------------------------------------------------------
/// Scheme Catalogue
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RepTypeInfo {
  pub rep_type: RepType,
  pub label: &'static str,
  /// Form order
  pub fields: Vec<SchemeField>,
  pub required: &'static [SchemeField],
  pub optional: &'static [SchemeField],
}

/// All repetition types with their field tables, for building the editor form
#[tauri::command]
pub fn get_rep_types() -> Vec<RepTypeInfo> {
  RepType::ALL
    .iter()
    .map(|rep_type| RepTypeInfo {
      rep_type: *rep_type,
      label: rep_type.label(),
      fields: rep_type.fields(),
      required: rep_type.required_fields(),
      optional: rep_type.optional_fields(),
    })
    .collect()
}

#[tauri::command]
pub fn get_required_fields(rep_type: RepType) -> Vec<SchemeField> {
  rep_type.required_fields().to_vec()
}

/// ---------------------------------------------------------------------------
/// Validation and Formatting
/// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SchemeCheck {
  pub valid: bool,
  pub missing_fields: Vec<SchemeField>,
  pub issue: Option<SchemeError>,
  /// Display string, present only when the draft is valid
  pub summary: Option<String>,
}

/// Check a draft from the editor without rejecting it
#[tauri::command]
pub fn validate_scheme(draft: SchemeDraft) -> SchemeCheck {
  match draft.validate() {
    Ok(scheme) => SchemeCheck {
      valid: true,
      missing_fields: Vec::new(),
      issue: None,
      summary: Some(scheme.format()),
    },
    Err(issue) => SchemeCheck {
      valid: false,
      missing_fields: draft.missing_fields(),
      issue: Some(issue),
      summary: None,
    },
  }
}

/// Render a scheme for display; incomplete schemes are refused
#[tauri::command]
pub fn format_scheme(scheme: RepetitionScheme) -> Result<String, AppError> {
  scheme.validate()?;
  Ok(scheme.format())
}

/// ---------------------------------------------------------------------------
/// Preset Resolution
/// ---------------------------------------------------------------------------

/// Effective scheme for one exercise of a stored training.
///
/// Returns `None` when neither the preset nor the override names a type.
#[tauri::command]
pub async fn resolve_exercise_scheme(
  state: State<'_, Arc<AppState>>,
  training_id: i64,
  exercise_id: i64,
) -> Result<Option<RepetitionScheme>, AppError> {
  let exercise = load_training_exercise(&state.db, training_id, exercise_id).await?;
  let scheme = exercise.effective().scheme().map_err(|e| {
    tracing::debug!(training_id, exercise_id, error = %e, "Effective scheme is incomplete");
    e
  })?;
  Ok(scheme)
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
