use chrono::NaiveDateTime;
use diesel::prelude::*;
use std::fmt;

use crate::db::schema;

// User models
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
}

// Catalog models
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = schema::exercise_catalog)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub category: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = schema::exercise_catalog)]
pub struct NewCatalogEntry<'a> {
    pub name: &'a str,
    pub category: &'a str,
}

// Workout models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutStatus {
    InProgress,
    Completed,
}

impl WorkoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutStatus::InProgress => "in_progress",
            WorkoutStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_progress" => Some(WorkoutStatus::InProgress),
            "completed" => Some(WorkoutStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(User))]
#[diesel(table_name = schema::workouts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Workout {
    pub id: i32,
    pub user_id: i32,
    pub notes: String,
    pub status: String,
    pub performed_at: NaiveDateTime,
}

impl Workout {
    pub fn status(&self) -> Option<WorkoutStatus> {
        WorkoutStatus::parse(&self.status)
    }

    pub fn is_in_progress(&self) -> bool {
        self.status() == Some(WorkoutStatus::InProgress)
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::workouts)]
pub struct NewWorkout<'a> {
    pub user_id: i32,
    pub notes: &'a str,
    pub status: &'a str,
    pub performed_at: NaiveDateTime,
}

// Exercise entries within a workout
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Workout))]
#[diesel(table_name = schema::workout_exercises)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutExercise {
    pub id: i32,
    pub workout_id: i32,
    pub name: String,
    pub position: i32,
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_exercises)]
pub struct NewWorkoutExercise<'a> {
    pub workout_id: i32,
    pub name: &'a str,
    pub position: i32,
}

// Set models
#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(WorkoutExercise))]
#[diesel(table_name = schema::workout_sets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct WorkoutSet {
    pub id: i32,
    pub workout_exercise_id: i32,
    pub set_index: i32,
    pub weight: f64,
    pub reps: i32,
    pub rest_seconds: i32,
    /// Rest can be recorded once per set.
    pub rest_recorded: bool,
}

impl fmt::Display for WorkoutSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Set {} — {}kg × {} reps",
            self.set_index, self.weight, self.reps
        )?;
        if self.rest_seconds > 0 {
            write!(f, " | ⏱ {}s", self.rest_seconds)?;
        }
        Ok(())
    }
}

#[derive(Insertable)]
#[diesel(table_name = schema::workout_sets)]
pub struct NewWorkoutSet {
    pub workout_exercise_id: i32,
    pub set_index: i32,
    pub weight: f64,
    pub reps: i32,
    pub rest_seconds: i32,
}

// Helper structs for displaying a workout with everything it contains
#[derive(Debug, Clone)]
pub struct ExerciseWithSets {
    pub exercise: WorkoutExercise,
    pub sets: Vec<WorkoutSet>,
}

#[derive(Debug, Clone)]
pub struct WorkoutDetail {
    pub workout: Workout,
    pub exercises: Vec<ExerciseWithSets>,
}

impl WorkoutDetail {
    pub fn set_count(&self) -> usize {
        self.exercises.iter().map(|e| e.sets.len()).sum()
    }
}

impl fmt::Display for WorkoutDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "#{} {} ({} exercises)",
            self.workout.id,
            self.workout.performed_at.format("%d/%m/%Y %H:%M"),
            self.exercises.len()
        )?;
        if self.exercises.is_empty() {
            return writeln!(f, "  No exercises.");
        }
        for entry in &self.exercises {
            writeln!(f, "  • {}", entry.exercise.name)?;
            for set in &entry.sets {
                writeln!(f, "    {}", set)?;
            }
        }
        Ok(())
    }
}
