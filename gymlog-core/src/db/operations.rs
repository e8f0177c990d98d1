use anyhow::Result;
use chrono::NaiveDateTime;
use diesel::prelude::*;
use log::debug;

use crate::{
    catalog::{Category, name_matches},
    db::models::{
        CatalogEntry, ExerciseWithSets, NewCatalogEntry, NewUser, NewWorkout, NewWorkoutExercise,
        NewWorkoutSet, User, Workout, WorkoutDetail, WorkoutExercise, WorkoutSet, WorkoutStatus,
    },
    db::schema::{exercise_catalog, users, workout_exercises, workout_sets, workouts},
    metrics::{ExerciseSession, SetRecord},
};

// Users
pub fn get_or_create_user(conn: &mut SqliteConnection, username: &str) -> Result<User> {
    if let Some(user) = users::table
        .filter(users::username.eq(username))
        .select(User::as_select())
        .first(conn)
        .optional()?
    {
        return Ok(user);
    }

    debug!("Creating user {}", username);
    diesel::insert_into(users::table)
        .values(&NewUser { username })
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

// Catalog
pub fn add_catalog_entry(
    conn: &mut SqliteConnection,
    name: &str,
    category: Category,
) -> Result<CatalogEntry> {
    diesel::insert_into(exercise_catalog::table)
        .values(&NewCatalogEntry {
            name,
            category: category.as_str(),
        })
        .returning(CatalogEntry::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn remove_catalog_entry(conn: &mut SqliteConnection, entry_id: i32) -> Result<usize> {
    diesel::delete(exercise_catalog::table.find(entry_id))
        .execute(conn)
        .map_err(Into::into)
}

pub fn list_catalog(conn: &mut SqliteConnection) -> Result<Vec<CatalogEntry>> {
    exercise_catalog::table
        .order((exercise_catalog::category.asc(), exercise_catalog::name.asc()))
        .select(CatalogEntry::as_select())
        .load(conn)
        .map_err(Into::into)
}

/// Catalog names containing `text`, ignoring ASCII case.
/// Catalog names containing `text`, matched in Rust because SQLite's `LIKE`
/// only folds ASCII case.
pub fn search_catalog(conn: &mut SqliteConnection, text: &str, limit: usize) -> Result<Vec<String>> {
    let needle = text.to_lowercase();
    let names = exercise_catalog::table
        .order(exercise_catalog::name.asc())
        .select(exercise_catalog::name)
        .load::<String>(conn)?;

    Ok(names
        .into_iter()
        .filter(|name| name_matches(name, &needle))
        .take(limit)
        .collect())
}

// Workouts
pub fn create_workout(
    conn: &mut SqliteConnection,
    user_id: i32,
    notes: &str,
    performed_at: NaiveDateTime,
) -> Result<Workout> {
    diesel::insert_into(workouts::table)
        .values(&NewWorkout {
            user_id,
            notes,
            status: WorkoutStatus::InProgress.as_str(),
            performed_at,
        })
        .returning(Workout::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_workout(
    conn: &mut SqliteConnection,
    user_id: i32,
    workout_id: i32,
) -> Result<Option<Workout>> {
    workouts::table
        .find(workout_id)
        .filter(workouts::user_id.eq(user_id))
        .select(Workout::as_select())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn get_in_progress_workout(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<Workout>> {
    workouts::table
        .filter(workouts::user_id.eq(user_id))
        .filter(workouts::status.eq(WorkoutStatus::InProgress.as_str()))
        .order(workouts::id.desc())
        .select(Workout::as_select())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

pub fn complete_workout(conn: &mut SqliteConnection, workout_id: i32) -> Result<usize> {
    diesel::update(workouts::table.find(workout_id))
        .set(workouts::status.eq(WorkoutStatus::Completed.as_str()))
        .execute(conn)
        .map_err(Into::into)
}

/// Deletes a workout owned by `user_id`; its exercises and sets cascade.
pub fn delete_workout(conn: &mut SqliteConnection, user_id: i32, workout_id: i32) -> Result<usize> {
    diesel::delete(
        workouts::table
            .filter(workouts::id.eq(workout_id))
            .filter(workouts::user_id.eq(user_id)),
    )
    .execute(conn)
    .map_err(Into::into)
}

/// All workouts of a user, most recent first.
pub fn list_workouts(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<Workout>> {
    workouts::table
        .filter(workouts::user_id.eq(user_id))
        .order((workouts::performed_at.desc(), workouts::id.desc()))
        .select(Workout::as_select())
        .load(conn)
        .map_err(Into::into)
}

/// Attaches exercises (by position) and their sets (by set index) to each
/// workout, keeping the order of `workouts`.
pub fn load_workout_details(
    conn: &mut SqliteConnection,
    workouts: Vec<Workout>,
) -> Result<Vec<WorkoutDetail>> {
    let exercises = WorkoutExercise::belonging_to(&workouts)
        .order((workout_exercises::position.asc(), workout_exercises::id.asc()))
        .select(WorkoutExercise::as_select())
        .load(conn)?;

    let sets = WorkoutSet::belonging_to(&exercises)
        .order((workout_sets::set_index.asc(), workout_sets::id.asc()))
        .select(WorkoutSet::as_select())
        .load(conn)?;

    let sets_per_exercise = sets.grouped_by(&exercises);
    let entries: Vec<ExerciseWithSets> = exercises
        .into_iter()
        .zip(sets_per_exercise)
        .map(|(exercise, sets)| ExerciseWithSets { exercise, sets })
        .collect();

    let mut details: Vec<WorkoutDetail> = workouts
        .into_iter()
        .map(|workout| WorkoutDetail {
            workout,
            exercises: Vec::new(),
        })
        .collect();
    for entry in entries {
        if let Some(detail) = details
            .iter_mut()
            .find(|d| d.workout.id == entry.exercise.workout_id)
        {
            detail.exercises.push(entry);
        }
    }
    Ok(details)
}

// Exercise entries
pub fn add_workout_exercise(
    conn: &mut SqliteConnection,
    workout_id: i32,
    name: &str,
) -> Result<WorkoutExercise> {
    let max_position: Option<i32> = workout_exercises::table
        .filter(workout_exercises::workout_id.eq(workout_id))
        .select(diesel::dsl::max(workout_exercises::position))
        .first(conn)?;

    let next_position = max_position.map(|n| n + 1).unwrap_or(1);

    diesel::insert_into(workout_exercises::table)
        .values(&NewWorkoutExercise {
            workout_id,
            name,
            position: next_position,
        })
        .returning(WorkoutExercise::as_returning())
        .get_result(conn)
        .map_err(Into::into)
}

pub fn get_last_workout_exercise(
    conn: &mut SqliteConnection,
    workout_id: i32,
) -> Result<Option<WorkoutExercise>> {
    workout_exercises::table
        .filter(workout_exercises::workout_id.eq(workout_id))
        .order((workout_exercises::position.desc(), workout_exercises::id.desc()))
        .select(WorkoutExercise::as_select())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

// Sets
pub fn add_workout_set(
    conn: &mut SqliteConnection,
    workout_exercise_id: i32,
    weight: f64,
    reps: i32,
) -> Result<WorkoutSet> {
    // Take the write lock before reading the next set number
    conn.immediate_transaction(|conn| {
        let max_set_index: Option<i32> = workout_sets::table
            .filter(workout_sets::workout_exercise_id.eq(workout_exercise_id))
            .select(diesel::dsl::max(workout_sets::set_index))
            .first(conn)?;

        let next_set_index = max_set_index.map(|n| n + 1).unwrap_or(1);

        diesel::insert_into(workout_sets::table)
            .values(&NewWorkoutSet {
                workout_exercise_id,
                set_index: next_set_index,
                weight,
                reps,
                rest_seconds: 0,
            })
            .returning(WorkoutSet::as_returning())
            .get_result(conn)
            .map_err(Into::into)
    })
}

pub fn get_sets_for_exercise(
    conn: &mut SqliteConnection,
    workout_exercise_id: i32,
) -> Result<Vec<WorkoutSet>> {
    workout_sets::table
        .filter(workout_sets::workout_exercise_id.eq(workout_exercise_id))
        .order((workout_sets::set_index.asc(), workout_sets::id.asc()))
        .select(WorkoutSet::as_select())
        .load(conn)
        .map_err(Into::into)
}

pub fn get_last_set(
    conn: &mut SqliteConnection,
    workout_exercise_id: i32,
) -> Result<Option<WorkoutSet>> {
    workout_sets::table
        .filter(workout_sets::workout_exercise_id.eq(workout_exercise_id))
        .order((workout_sets::set_index.desc(), workout_sets::id.desc()))
        .select(WorkoutSet::as_select())
        .first(conn)
        .optional()
        .map_err(Into::into)
}

/// Records the rest after a set. Returns `None` when the set already has
/// its rest recorded.
pub fn update_rest_seconds(
    conn: &mut SqliteConnection,
    set_id: i32,
    rest_seconds: i32,
) -> Result<Option<WorkoutSet>> {
    diesel::update(
        workout_sets::table
            .find(set_id)
            .filter(workout_sets::rest_recorded.eq(false)),
    )
    .set((
        workout_sets::rest_seconds.eq(rest_seconds),
        workout_sets::rest_recorded.eq(true),
    ))
    .returning(WorkoutSet::as_returning())
    .get_result(conn)
    .optional()
    .map_err(Into::into)
}

// Analytics
pub fn logged_exercise_names(conn: &mut SqliteConnection, user_id: i32) -> Result<Vec<String>> {
    workout_exercises::table
        .inner_join(workouts::table)
        .filter(workouts::user_id.eq(user_id))
        .select(workout_exercises::name)
        .distinct()
        .order(workout_exercises::name.asc())
        .load::<String>(conn)
        .map_err(Into::into)
}

impl From<WorkoutSet> for SetRecord {
    fn from(s: WorkoutSet) -> Self {
        SetRecord {
            weight_kg: s.weight,
            repetitions: u32::try_from(s.reps).unwrap_or(0),
            set_index: u32::try_from(s.set_index).unwrap_or(1),
            rest_seconds: u32::try_from(s.rest_seconds).unwrap_or(0),
        }
    }
}

/// Sessions of the exercise called `name`, oldest workout first. When one
/// workout logged the exercise more than once, the entries are merged into a
/// single session in entry order.
pub fn sessions_for_exercise(
    conn: &mut SqliteConnection,
    user_id: i32,
    name: &str,
) -> Result<Vec<ExerciseSession>> {
    let rows: Vec<(Workout, WorkoutExercise)> = workouts::table
        .inner_join(workout_exercises::table)
        .filter(workouts::user_id.eq(user_id))
        .filter(workout_exercises::name.eq(name))
        .order((
            workouts::performed_at.asc(),
            workouts::id.asc(),
            workout_exercises::position.asc(),
        ))
        .select((Workout::as_select(), WorkoutExercise::as_select()))
        .load(conn)?;

    let exercises: Vec<WorkoutExercise> = rows.iter().map(|(_, e)| e.clone()).collect();
    let sets = WorkoutSet::belonging_to(&exercises)
        .order((workout_sets::set_index.asc(), workout_sets::id.asc()))
        .select(WorkoutSet::as_select())
        .load(conn)?;
    let sets_per_exercise = sets.grouped_by(&exercises);

    let mut sessions: Vec<ExerciseSession> = Vec::new();
    let mut last_workout_id: Option<i32> = None;
    for ((workout, _), sets) in rows.into_iter().zip(sets_per_exercise) {
        let records = sets.into_iter().map(SetRecord::from);
        match sessions.last_mut() {
            Some(session) if last_workout_id == Some(workout.id) => session.sets.extend(records),
            _ => {
                sessions.push(ExerciseSession::new(workout.performed_at, records.collect()));
                last_workout_id = Some(workout.id);
            }
        }
    }

    debug!(
        "Loaded {} sessions for exercise {} (user {})",
        sessions.len(),
        name,
        user_id
    );
    Ok(sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MEMORY_DATABASE_URL, open_pool};
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    #[test]
    fn set_indexes_count_per_exercise_entry() {
        let pool = open_pool(MEMORY_DATABASE_URL).unwrap();
        let mut conn = pool.get().unwrap();
        let user = get_or_create_user(&mut conn, "anna").unwrap();
        let workout = create_workout(&mut conn, user.id, "", at(1)).unwrap();
        let bench = add_workout_exercise(&mut conn, workout.id, "Bench Press").unwrap();
        let squat = add_workout_exercise(&mut conn, workout.id, "Squat").unwrap();
        assert_eq!((bench.position, squat.position), (1, 2));

        let first = add_workout_set(&mut conn, bench.id, 40.0, 10).unwrap();
        let second = add_workout_set(&mut conn, bench.id, 40.0, 8).unwrap();
        let other = add_workout_set(&mut conn, squat.id, 80.0, 5).unwrap();
        assert_eq!(first.set_index, 1);
        assert_eq!(second.set_index, 2);
        assert_eq!(other.set_index, 1);
        assert_eq!(second.rest_seconds, 0);

        assert!(!second.rest_recorded);

        let updated = update_rest_seconds(&mut conn, second.id, 90).unwrap().unwrap();
        assert_eq!(updated.rest_seconds, 90);
        assert!(updated.rest_recorded);
        assert_eq!(get_last_set(&mut conn, bench.id).unwrap(), Some(updated.clone()));
        assert_eq!(update_rest_seconds(&mut conn, second.id, 300).unwrap(), None);
        assert_eq!(get_last_set(&mut conn, bench.id).unwrap(), Some(updated));
    }

    #[test]
    fn set_indexes_are_unique_per_exercise_entry() {
        let pool = open_pool(MEMORY_DATABASE_URL).unwrap();
        let mut conn = pool.get().unwrap();
        let user = get_or_create_user(&mut conn, "anna").unwrap();
        let workout = create_workout(&mut conn, user.id, "", at(1)).unwrap();
        let bench = add_workout_exercise(&mut conn, workout.id, "Bench Press").unwrap();
        add_workout_set(&mut conn, bench.id, 40.0, 10).unwrap();

        let duplicate = diesel::insert_into(workout_sets::table)
            .values(&NewWorkoutSet {
                workout_exercise_id: bench.id,
                set_index: 1,
                weight: 40.0,
                reps: 8,
                rest_seconds: 0,
            })
            .execute(&mut conn);
        assert!(matches!(
            duplicate,
            Err(diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _
            ))
        ));
        assert_eq!(get_sets_for_exercise(&mut conn, bench.id).unwrap().len(), 1);
    }

    #[test]
    fn duplicate_entries_merge_into_one_session() {
        let pool = open_pool(MEMORY_DATABASE_URL).unwrap();
        let mut conn = pool.get().unwrap();
        let user = get_or_create_user(&mut conn, "anna").unwrap();

        let later = create_workout(&mut conn, user.id, "", at(8)).unwrap();
        let ex = add_workout_exercise(&mut conn, later.id, "Bench Press").unwrap();
        add_workout_set(&mut conn, ex.id, 45.0, 6).unwrap();

        let earlier = create_workout(&mut conn, user.id, "", at(1)).unwrap();
        let first = add_workout_exercise(&mut conn, earlier.id, "Bench Press").unwrap();
        add_workout_exercise(&mut conn, earlier.id, "Squat").unwrap();
        let again = add_workout_exercise(&mut conn, earlier.id, "Bench Press").unwrap();
        add_workout_set(&mut conn, first.id, 40.0, 10).unwrap();
        add_workout_set(&mut conn, again.id, 40.0, 8).unwrap();

        let sessions = sessions_for_exercise(&mut conn, user.id, "Bench Press").unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].date, at(1));
        let reps: Vec<u32> = sessions[0].sets.iter().map(|s| s.repetitions).collect();
        assert_eq!(reps, vec![10, 8]);
        assert_eq!(sessions[1].sets.len(), 1);

        let names = logged_exercise_names(&mut conn, user.id).unwrap();
        assert_eq!(names, vec!["Bench Press".to_string(), "Squat".to_string()]);
    }

    #[test]
    fn workouts_are_scoped_to_their_user() {
        let pool = open_pool(MEMORY_DATABASE_URL).unwrap();
        let mut conn = pool.get().unwrap();
        let anna = get_or_create_user(&mut conn, "anna").unwrap();
        let marco = get_or_create_user(&mut conn, "marco").unwrap();
        assert_eq!(get_or_create_user(&mut conn, "anna").unwrap().id, anna.id);

        let workout = create_workout(&mut conn, anna.id, "legs", at(2)).unwrap();
        assert!(get_workout(&mut conn, marco.id, workout.id).unwrap().is_none());
        assert_eq!(delete_workout(&mut conn, marco.id, workout.id).unwrap(), 0);
        assert!(list_workouts(&mut conn, marco.id).unwrap().is_empty());
        assert_eq!(list_workouts(&mut conn, anna.id).unwrap().len(), 1);
    }
}
