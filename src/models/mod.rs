pub mod history;
pub mod training;

pub use history::{AttendanceRecord, FeedbackLogEntry};
pub use training::{ExerciseInfo, Training, TrainingExercise, TrainingSnapshot};
