//! Exercise presets and per-training overrides
//!
//! Each exercise in the library carries a default repetition scheme (the
//! preset). When the exercise is assigned to a training the trainer may
//! customize any of its fields (the override). The scheme shown to the
//! student is merged field by field: override value if present, else preset
//! value, else absent.
//!
//! Incomplete merges are normal while a trainer is still authoring, so a
//! missing required field comes back as a `SchemeError`, never a panic.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{query::Query, Row, Sqlite, SqlitePool};

use crate::error::AppError;
use crate::models::{ExerciseInfo, Training, TrainingExercise, TrainingSnapshot};
use crate::scheme::{RepType, RepetitionScheme, SchemeDraft, SchemeError, SchemeFields};

// ---------------------------------------------------------------------------
/// Preset / Override
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExercisePreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rep_type: Option<RepType>,
    #[serde(flatten)]
    pub fields: SchemeFields,
}

/// Per-training customization; same shape as the preset it overrides
pub type PresetOverride = ExercisePreset;

impl ExercisePreset {
    pub fn is_empty(&self) -> bool {
        self.rep_type.is_none() && self.fields == SchemeFields::default()
    }
}

// ---------------------------------------------------------------------------
/// Effective Scheme: result of merging override over preset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectiveScheme {
    pub rep_type: Option<RepType>,
    #[serde(flatten)]
    pub fields: SchemeFields,
}

impl EffectiveScheme {
    /// The draft to validate, `None` when neither side names a type
    pub fn draft(&self) -> Option<SchemeDraft> {
        self.rep_type
            .map(|rep_type| SchemeDraft::new(rep_type, self.fields.clone()))
    }

    /// Re-validate the merged fields against the resolved type.
    ///
    /// `Ok(None)` means the exercise prescribes no scheme, which is valid.
    pub fn scheme(&self) -> Result<Option<RepetitionScheme>, SchemeError> {
        self.draft().map(|draft| draft.validate()).transpose()
    }

    /// Validation problem to show in the editor, if any
    pub fn issue(&self) -> Option<SchemeError> {
        self.scheme().err()
    }

    pub fn as_preset(&self) -> ExercisePreset {
        ExercisePreset {
            rep_type: self.rep_type,
            fields: self.fields.clone(),
        }
    }
}

/// Merge an override over a preset. Every field resolves independently.
pub fn resolve(preset: &ExercisePreset, overrides: &PresetOverride) -> EffectiveScheme {
    let (o, p) = (&overrides.fields, &preset.fields);

    EffectiveScheme {
        rep_type: overrides.rep_type.or(preset.rep_type),
        fields: SchemeFields {
            set: o.set.or(p.set),
            reps: o.reps.or(p.reps),
            load: o.load.or(p.load),
            time: o.time.or(p.time),
            rest: o.rest.or(p.rest),
            cadence: pick_text(&o.cadence, &p.cadence),
            notes: pick_text(&o.notes, &p.notes),
            speed: o.speed.or(p.speed),
            distance: o.distance.or(p.distance),
            pace: o.pace.or(p.pace),
            incline: o.incline.or(p.incline),
        },
    }
}

/// A blank override text does not hide the preset's text
fn pick_text(overrides: &Option<String>, preset: &Option<String>) -> Option<String> {
    overrides
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .or(preset.as_ref())
        .cloned()
}

// ---------------------------------------------------------------------------
// Database Operations
// ---------------------------------------------------------------------------

const PRESET_COLUMNS: [&str; 11] = [
    "set", "reps", "load", "time", "rest", "cadence", "notes", "speed", "distance", "pace",
    "incline",
];

fn preset_from_row(row: &SqliteRow, prefix: &str) -> Result<ExercisePreset, AppError> {
    let col = |name: &str| format!("{}_{}", prefix, name);
    let num = |name: &str| row.try_get::<Option<f64>, _>(col(name).as_str());
    let text = |name: &str| row.try_get::<Option<String>, _>(col(name).as_str());

    let rep_type = text("rep_type")?
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<RepType>())
        .transpose()?;

    Ok(ExercisePreset {
        rep_type,
        fields: SchemeFields {
            set: num("set")?,
            reps: num("reps")?,
            load: num("load")?,
            time: num("time")?,
            rest: num("rest")?,
            cadence: text("cadence")?,
            notes: text("notes")?,
            speed: num("speed")?,
            distance: num("distance")?,
            pace: num("pace")?,
            incline: num("incline")?,
        },
    })
}

fn training_exercise_from_row(row: &SqliteRow) -> Result<TrainingExercise, AppError> {
    Ok(TrainingExercise {
        exercise: ExerciseInfo {
            id: row.try_get("exercise_id")?,
            name: row.try_get("name")?,
            muscle_group: row.try_get("muscle_group")?,
            equipment: row.try_get("equipment")?,
        },
        position: row.try_get("position")?,
        preset: preset_from_row(row, "preset")?,
        overrides: preset_from_row(row, "override")?,
    })
}

fn bind_preset<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    preset: &ExercisePreset,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    let f = &preset.fields;
    query
        .bind(preset.rep_type.map(|t| t.as_str()))
        .bind(f.set)
        .bind(f.reps)
        .bind(f.load)
        .bind(f.time)
        .bind(f.rest)
        .bind(f.cadence.clone())
        .bind(f.notes.clone())
        .bind(f.speed)
        .bind(f.distance)
        .bind(f.pace)
        .bind(f.incline)
}

/// Load a training header
pub async fn load_training(pool: &SqlitePool, training_id: i64) -> Result<Training, AppError> {
    sqlx::query_as::<_, Training>("SELECT id, name, description FROM trainings WHERE id = ?1")
        .bind(training_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("training {}", training_id)))
}

/// Load a training's exercises in prescribed order
pub async fn load_training_exercises(
    pool: &SqlitePool,
    training_id: i64,
) -> Result<Vec<TrainingExercise>, AppError> {
    let rows = sqlx::query(
        r#"
        SELECT te.*, e.name, e.muscle_group, e.equipment
        FROM training_exercises te
        JOIN exercises e ON e.id = te.exercise_id
        WHERE te.training_id = ?1
        ORDER BY te.position, te.exercise_id
        "#,
    )
    .bind(training_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(training_exercise_from_row).collect()
}

/// Load the preset/override pair for one exercise of a training
pub async fn load_training_exercise(
    pool: &SqlitePool,
    training_id: i64,
    exercise_id: i64,
) -> Result<TrainingExercise, AppError> {
    let row = sqlx::query(
        r#"
        SELECT te.*, e.name, e.muscle_group, e.equipment
        FROM training_exercises te
        JOIN exercises e ON e.id = te.exercise_id
        WHERE te.training_id = ?1 AND te.exercise_id = ?2
        "#,
    )
    .bind(training_id)
    .bind(exercise_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| {
        AppError::NotFound(format!(
            "exercise {} in training {}",
            exercise_id, training_id
        ))
    })?;

    training_exercise_from_row(&row)
}

/// Replace the stored copy of a training with a fresh snapshot
pub async fn save_training_snapshot(
    pool: &SqlitePool,
    snapshot: &TrainingSnapshot,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO trainings (id, name, description, synced_at)
        VALUES (?1, ?2, ?3, CURRENT_TIMESTAMP)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            description = excluded.description,
            synced_at = excluded.synced_at
        "#,
    )
    .bind(snapshot.id)
    .bind(&snapshot.name)
    .bind(&snapshot.description)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM training_exercises WHERE training_id = ?1")
        .bind(snapshot.id)
        .execute(&mut *tx)
        .await?;

    let preset_cols: Vec<String> = std::iter::once("rep_type")
        .chain(PRESET_COLUMNS)
        .map(|c| format!("preset_{}", c))
        .collect();
    let override_cols: Vec<String> = std::iter::once("rep_type")
        .chain(PRESET_COLUMNS)
        .map(|c| format!("override_{}", c))
        .collect();
    let placeholders = vec!["?"; 3 + preset_cols.len() + override_cols.len()].join(", ");
    let insert_link = format!(
        "INSERT INTO training_exercises (training_id, exercise_id, position, {}, {}) VALUES ({})",
        preset_cols.join(", "),
        override_cols.join(", "),
        placeholders
    );

    for item in &snapshot.exercises {
        let exercise = &item.exercise;
        sqlx::query(
            r#"
            INSERT INTO exercises (id, name, muscle_group, equipment)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                muscle_group = excluded.muscle_group,
                equipment = excluded.equipment
            "#,
        )
        .bind(exercise.id)
        .bind(&exercise.name)
        .bind(&exercise.muscle_group)
        .bind(&exercise.equipment)
        .execute(&mut *tx)
        .await?;

        let query = sqlx::query(&insert_link)
            .bind(snapshot.id)
            .bind(exercise.id)
            .bind(item.position);
        let query = bind_preset(query, &item.preset);
        let query = bind_preset(query, &item.overrides);
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;
    Ok(())
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
