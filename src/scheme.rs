//! Repetition schemes
//!
//! A repetition scheme describes how one prescribed set of an exercise is
//! measured. The shape depends on the modality:
//! - strength work (sets, reps, load, rest)
//! - timed holds and cadence patterns
//! - free-text notes
//! - running intervals and incline treadmill work
//!
//! Forms submit a loose `SchemeDraft` (a tag plus optional fields). A draft only
//! becomes a `RepetitionScheme` once every field its tag requires is present
//! and well-formed. Missing numbers are never coerced to zero.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
/// Rep Type: which modality a scheme describes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepType {
    RepsLoad,
    RepsLoadTime,
    CompleteSet,
    RepsTime,
    Cadence,
    Notes,
    Running,
    TimeIncline,
}

impl RepType {
    pub const ALL: [RepType; 8] = [
        RepType::RepsLoad,
        RepType::RepsLoadTime,
        RepType::CompleteSet,
        RepType::RepsTime,
        RepType::Cadence,
        RepType::Notes,
        RepType::Running,
        RepType::TimeIncline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RepType::RepsLoad => "reps-load",
            RepType::RepsLoadTime => "reps-load-time",
            RepType::CompleteSet => "complete-set",
            RepType::RepsTime => "reps-time",
            RepType::Cadence => "cadence",
            RepType::Notes => "notes",
            RepType::Running => "running",
            RepType::TimeIncline => "time-incline",
        }
    }

    /// Name shown in the exercise editor's type picker
    pub fn label(&self) -> &'static str {
        match self {
            RepType::RepsLoad => "Sets, reps & load",
            RepType::RepsLoadTime => "Reps, load & time",
            RepType::CompleteSet => "Complete set",
            RepType::RepsTime => "Sets, reps & time",
            RepType::Cadence => "Cadence",
            RepType::Notes => "Notes",
            RepType::Running => "Running",
            RepType::TimeIncline => "Time & incline",
        }
    }

    /// Fields that must be present and well-formed for this type.
    ///
    /// The order is the order fields appear in the form, and the order in
    /// which validation reports the first missing one.
    pub fn required_fields(&self) -> &'static [SchemeField] {
        use SchemeField::*;
        match self {
            RepType::RepsLoad => &[Set, Reps, Load, Rest],
            RepType::RepsLoadTime => &[Reps, Load, Time],
            RepType::CompleteSet => &[Set, Reps, Load, Time, Rest],
            RepType::RepsTime => &[Set, Reps, Time, Rest],
            RepType::Cadence => &[Cadence],
            RepType::Notes => &[Notes],
            RepType::Running => &[Rest],
            RepType::TimeIncline => &[Time, Incline, Rest],
        }
    }

    /// Fields the form offers but does not insist on
    pub fn optional_fields(&self) -> &'static [SchemeField] {
        use SchemeField::*;
        match self {
            RepType::Running => &[Speed, Distance, Time, Pace],
            RepType::RepsLoad
            | RepType::RepsLoadTime
            | RepType::CompleteSet
            | RepType::RepsTime
            | RepType::Cadence
            | RepType::Notes
            | RepType::TimeIncline => &[],
        }
    }

    #[cfg(test)]
    pub fn is_required(&self, field: SchemeField) -> bool {
        self.required_fields().contains(&field)
    }

    /// Every field the form shows for this type, required first
    pub fn fields(&self) -> Vec<SchemeField> {
        self.required_fields()
            .iter()
            .chain(self.optional_fields())
            .copied()
            .collect()
    }
}

impl std::fmt::Display for RepType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RepType {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RepType::ALL
            .iter()
            .find(|t| t.as_str() == s.trim())
            .copied()
            .ok_or_else(|| SchemeError::UnknownRepType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
/// Scheme Field: every value a scheme form can carry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeField {
    Set,
    Reps,
    Load,
    Time,
    Rest,
    Cadence,
    Notes,
    Speed,
    Distance,
    Pace,
    Incline,
}

impl SchemeField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemeField::Set => "set",
            SchemeField::Reps => "reps",
            SchemeField::Load => "load",
            SchemeField::Time => "time",
            SchemeField::Rest => "rest",
            SchemeField::Cadence => "cadence",
            SchemeField::Notes => "notes",
            SchemeField::Speed => "speed",
            SchemeField::Distance => "distance",
            SchemeField::Pace => "pace",
            SchemeField::Incline => "incline",
        }
    }
}

impl std::fmt::Display for SchemeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
/// Error Types
// ---------------------------------------------------------------------------

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum SchemeError {
    #[error("{rep_type}: missing required field '{field}'")]
    MissingRequiredField { rep_type: RepType, field: SchemeField },

    #[error("{rep_type}: field '{field}' must be a finite number")]
    InvalidNumber { rep_type: RepType, field: SchemeField },

    #[error("{rep_type}: field '{field}' must not be blank")]
    BlankText { rep_type: RepType, field: SchemeField },

    #[error("Unknown repetition type: {0}")]
    UnknownRepType(String),
}

impl SchemeError {
    /// The form field the error should be shown next to
    pub fn field(&self) -> Option<SchemeField> {
        match self {
            SchemeError::MissingRequiredField { field, .. }
            | SchemeError::InvalidNumber { field, .. }
            | SchemeError::BlankText { field, .. } => Some(*field),
            SchemeError::UnknownRepType(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
/// Scheme Fields: the loose, all-optional form shape
// ---------------------------------------------------------------------------

/// Raw field values as edited in a form or stored on a preset.
///
/// Numbers are `None` when absent, which is distinct from `Some(0.0)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load: Option<f64>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    /// Seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cadence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// km/h
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    /// km
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// min/km
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<f64>,
    /// Percent grade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incline: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(Option<f64>),
    Text(Option<&'a str>),
}

impl SchemeFields {
    pub fn value(&self, field: SchemeField) -> FieldValue<'_> {
        match field {
            SchemeField::Set => FieldValue::Number(self.set),
            SchemeField::Reps => FieldValue::Number(self.reps),
            SchemeField::Load => FieldValue::Number(self.load),
            SchemeField::Time => FieldValue::Number(self.time),
            SchemeField::Rest => FieldValue::Number(self.rest),
            SchemeField::Cadence => FieldValue::Text(self.cadence.as_deref()),
            SchemeField::Notes => FieldValue::Text(self.notes.as_deref()),
            SchemeField::Speed => FieldValue::Number(self.speed),
            SchemeField::Distance => FieldValue::Number(self.distance),
            SchemeField::Pace => FieldValue::Number(self.pace),
            SchemeField::Incline => FieldValue::Number(self.incline),
        }
    }

    /// Whether a field holds a usable value (finite number / non-blank text)
    pub fn is_present(&self, field: SchemeField) -> bool {
        match self.value(field) {
            FieldValue::Number(n) => n.is_some_and(f64::is_finite),
            FieldValue::Text(t) => t.is_some_and(|s| !s.trim().is_empty()),
        }
    }

    #[cfg(test)]
    pub fn clear(&mut self, field: SchemeField) {
        match field {
            SchemeField::Set => self.set = None,
            SchemeField::Reps => self.reps = None,
            SchemeField::Load => self.load = None,
            SchemeField::Time => self.time = None,
            SchemeField::Rest => self.rest = None,
            SchemeField::Cadence => self.cadence = None,
            SchemeField::Notes => self.notes = None,
            SchemeField::Speed => self.speed = None,
            SchemeField::Distance => self.distance = None,
            SchemeField::Pace => self.pace = None,
            SchemeField::Incline => self.incline = None,
        }
    }

    fn required_number(&self, rep_type: RepType, field: SchemeField) -> Result<f64, SchemeError> {
        match self.value(field) {
            FieldValue::Number(Some(n)) if n.is_finite() => Ok(n),
            FieldValue::Number(Some(_)) => Err(SchemeError::InvalidNumber { rep_type, field }),
            _ => Err(SchemeError::MissingRequiredField { rep_type, field }),
        }
    }

    fn optional_number(
        &self,
        rep_type: RepType,
        field: SchemeField,
    ) -> Result<Option<f64>, SchemeError> {
        match self.value(field) {
            FieldValue::Number(Some(n)) if n.is_finite() => Ok(Some(n)),
            FieldValue::Number(Some(_)) => Err(SchemeError::InvalidNumber { rep_type, field }),
            _ => Ok(None),
        }
    }

    fn required_text(&self, rep_type: RepType, field: SchemeField) -> Result<String, SchemeError> {
        match self.value(field) {
            FieldValue::Text(Some(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
            FieldValue::Text(Some(_)) => Err(SchemeError::BlankText { rep_type, field }),
            _ => Err(SchemeError::MissingRequiredField { rep_type, field }),
        }
    }
}

// ---------------------------------------------------------------------------
/// Scheme Draft: a tag plus whatever the form holds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeDraft {
    #[serde(rename = "type")]
    pub rep_type: RepType,
    #[serde(flatten)]
    pub fields: SchemeFields,
}

impl SchemeDraft {
    pub fn new(rep_type: RepType, fields: SchemeFields) -> Self {
        Self { rep_type, fields }
    }

    /// Check the draft against its type's rules. Never panics.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Turn the draft into a typed scheme, reporting the first offending
    /// field. Fields the type does not use are dropped.
    pub fn validate(&self) -> Result<RepetitionScheme, SchemeError> {
        let t = self.rep_type;
        let f = &self.fields;
        let num = |field| f.required_number(t, field);

        // Construction order follows `RepType::required_fields`.
        let scheme = match t {
            RepType::RepsLoad => RepetitionScheme::RepsLoad {
                set: num(SchemeField::Set)?,
                reps: num(SchemeField::Reps)?,
                load: num(SchemeField::Load)?,
                rest: num(SchemeField::Rest)?,
            },
            RepType::RepsLoadTime => RepetitionScheme::RepsLoadTime {
                reps: num(SchemeField::Reps)?,
                load: num(SchemeField::Load)?,
                time: num(SchemeField::Time)?,
            },
            RepType::CompleteSet => RepetitionScheme::CompleteSet {
                set: num(SchemeField::Set)?,
                reps: num(SchemeField::Reps)?,
                load: num(SchemeField::Load)?,
                time: num(SchemeField::Time)?,
                rest: num(SchemeField::Rest)?,
            },
            RepType::RepsTime => RepetitionScheme::RepsTime {
                set: num(SchemeField::Set)?,
                reps: num(SchemeField::Reps)?,
                time: num(SchemeField::Time)?,
                rest: num(SchemeField::Rest)?,
            },
            RepType::Cadence => RepetitionScheme::Cadence {
                cadence: f.required_text(t, SchemeField::Cadence)?,
            },
            RepType::Notes => RepetitionScheme::Notes {
                notes: f.required_text(t, SchemeField::Notes)?,
            },
            RepType::Running => {
                let rest = num(SchemeField::Rest)?;
                RepetitionScheme::Running {
                    speed: f.optional_number(t, SchemeField::Speed)?,
                    distance: f.optional_number(t, SchemeField::Distance)?,
                    time: f.optional_number(t, SchemeField::Time)?,
                    pace: f.optional_number(t, SchemeField::Pace)?,
                    rest,
                }
            }
            RepType::TimeIncline => RepetitionScheme::TimeIncline {
                time: num(SchemeField::Time)?,
                incline: num(SchemeField::Incline)?,
                rest: num(SchemeField::Rest)?,
            },
        };

        Ok(scheme)
    }

    /// Required fields of this draft's type that are not filled in yet
    pub fn missing_fields(&self) -> Vec<SchemeField> {
        self.rep_type
            .required_fields()
            .iter()
            .filter(|field| !self.fields.is_present(**field))
            .copied()
            .collect()
    }
}

// ---------------------------------------------------------------------------
/// Repetition Scheme: the validated, closed set of variants
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum RepetitionScheme {
    RepsLoad {
        set: f64,
        reps: f64,
        load: f64,
        rest: f64,
    },
    RepsLoadTime {
        reps: f64,
        load: f64,
        time: f64,
    },
    CompleteSet {
        set: f64,
        reps: f64,
        load: f64,
        time: f64,
        rest: f64,
    },
    RepsTime {
        set: f64,
        reps: f64,
        time: f64,
        rest: f64,
    },
    Cadence {
        cadence: String,
    },
    Notes {
        notes: String,
    },
    Running {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        distance: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pace: Option<f64>,
        rest: f64,
    },
    TimeIncline {
        time: f64,
        incline: f64,
        rest: f64,
    },
}

impl RepetitionScheme {
    pub fn rep_type(&self) -> RepType {
        match self {
            RepetitionScheme::RepsLoad { .. } => RepType::RepsLoad,
            RepetitionScheme::RepsLoadTime { .. } => RepType::RepsLoadTime,
            RepetitionScheme::CompleteSet { .. } => RepType::CompleteSet,
            RepetitionScheme::RepsTime { .. } => RepType::RepsTime,
            RepetitionScheme::Cadence { .. } => RepType::Cadence,
            RepetitionScheme::Notes { .. } => RepType::Notes,
            RepetitionScheme::Running { .. } => RepType::Running,
            RepetitionScheme::TimeIncline { .. } => RepType::TimeIncline,
        }
    }

    pub fn to_fields(&self) -> SchemeFields {
        match self.clone() {
            RepetitionScheme::RepsLoad { set, reps, load, rest } => SchemeFields {
                set: Some(set),
                reps: Some(reps),
                load: Some(load),
                rest: Some(rest),
                ..Default::default()
            },
            RepetitionScheme::RepsLoadTime { reps, load, time } => SchemeFields {
                reps: Some(reps),
                load: Some(load),
                time: Some(time),
                ..Default::default()
            },
            RepetitionScheme::CompleteSet { set, reps, load, time, rest } => SchemeFields {
                set: Some(set),
                reps: Some(reps),
                load: Some(load),
                time: Some(time),
                rest: Some(rest),
                ..Default::default()
            },
            RepetitionScheme::RepsTime { set, reps, time, rest } => SchemeFields {
                set: Some(set),
                reps: Some(reps),
                time: Some(time),
                rest: Some(rest),
                ..Default::default()
            },
            RepetitionScheme::Cadence { cadence } => SchemeFields {
                cadence: Some(cadence),
                ..Default::default()
            },
            RepetitionScheme::Notes { notes } => SchemeFields {
                notes: Some(notes),
                ..Default::default()
            },
            RepetitionScheme::Running { speed, distance, time, pace, rest } => SchemeFields {
                speed,
                distance,
                time,
                pace,
                rest: Some(rest),
                ..Default::default()
            },
            RepetitionScheme::TimeIncline { time, incline, rest } => SchemeFields {
                time: Some(time),
                incline: Some(incline),
                rest: Some(rest),
                ..Default::default()
            },
        }
    }

    pub fn to_draft(&self) -> SchemeDraft {
        SchemeDraft::new(self.rep_type(), self.to_fields())
    }

    /// Re-check a typed scheme (e.g. one deserialized from the frontend)
    pub fn validate(&self) -> Result<(), SchemeError> {
        self.to_draft().validate().map(|_| ())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// One-line summary for display. Not meant to be parsed back.
    pub fn format(&self) -> String {
        match self {
            RepetitionScheme::RepsLoad { set, reps, load, rest } => format!(
                "{}×{} @ {}, rest {}s",
                fmt_num(*set),
                fmt_num(*reps),
                fmt_num(*load),
                fmt_num(*rest)
            ),
            RepetitionScheme::RepsLoadTime { reps, load, time } => format!(
                "{} reps @ {}, {}s",
                fmt_num(*reps),
                fmt_num(*load),
                fmt_num(*time)
            ),
            RepetitionScheme::CompleteSet { set, reps, load, time, rest } => format!(
                "{}×{} @ {}, {}s, rest {}s",
                fmt_num(*set),
                fmt_num(*reps),
                fmt_num(*load),
                fmt_num(*time),
                fmt_num(*rest)
            ),
            RepetitionScheme::RepsTime { set, reps, time, rest } => format!(
                "{}×{}, {}s, rest {}s",
                fmt_num(*set),
                fmt_num(*reps),
                fmt_num(*time),
                fmt_num(*rest)
            ),
            RepetitionScheme::Cadence { cadence } => format!("cadence {}", cadence.trim()),
            RepetitionScheme::Notes { notes } => notes.trim().to_string(),
            RepetitionScheme::Running { speed, distance, time, pace, rest } => {
                let mut parts = Vec::new();
                if let Some(speed) = speed {
                    parts.push(format!("{} km/h", fmt_num(*speed)));
                }
                if let Some(distance) = distance {
                    parts.push(format!("{} km", fmt_num(*distance)));
                }
                if let Some(time) = time {
                    parts.push(format!("{}s", fmt_num(*time)));
                }
                if let Some(pace) = pace {
                    parts.push(format!("pace {} min/km", fmt_num(*pace)));
                }
                parts.push(format!("rest {}s", fmt_num(*rest)));
                parts.join(", ")
            }
            RepetitionScheme::TimeIncline { time, incline, rest } => format!(
                "{}s @ {}% incline, rest {}s",
                fmt_num(*time),
                fmt_num(*incline),
                fmt_num(*rest)
            ),
        }
    }
}

impl std::fmt::Display for RepetitionScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.format())
    }
}

/// Whole numbers print bare, others with at most two decimals
fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
