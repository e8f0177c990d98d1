use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, ThisError)]
#[non_exhaustive]
pub enum GymlogError {
    #[error("exercise name must not be empty")]
    EmptyName,
    #[error("{0} is already in the catalog")]
    DuplicateExercise(String),
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    #[error("unknown metric: {0} (expected max-weight, volume, e1rm or sets)")]
    UnknownMetric(String),
    #[error("no workout in progress")]
    NoActiveWorkout,
    #[error("no exercise in progress, start one first")]
    NoActiveExercise,
    #[error("no sets recorded for {0} yet")]
    NoSetsRecorded(String),
    #[error("invalid weight: {0}")]
    InvalidWeight(f64),
    #[error("invalid repetitions: {0}")]
    InvalidReps(i64),
    #[error("rest after set {0} was already recorded")]
    RestAlreadyRecorded(i32),
    #[error("invalid rest time: {0}s")]
    InvalidRest(i64),
    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
