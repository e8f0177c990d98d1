use anyhow::Result;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::debug;

use crate::catalog::{Category, MIN_SUGGESTION_CHARS, SUGGESTION_LIMIT, normalize_name};
use crate::db::models::CatalogEntry;
use crate::db::operations::{add_catalog_entry, list_catalog, remove_catalog_entry, search_catalog};
use crate::errors::GymlogError;
use crate::tracker::Tracker;

impl Tracker {
    pub async fn add_catalog_exercise(&self, name: &str, category: Category) -> Result<CatalogEntry> {
        let name = normalize_name(name)?.to_string();

        self.with_conn(move |conn| {
            add_catalog_entry(conn, &name, category).map_err(|e| {
                match e.downcast_ref::<DieselError>() {
                    Some(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
                        GymlogError::DuplicateExercise(name.clone()).into()
                    }
                    _ => e,
                }
            })
        })
        .await
    }

    pub async fn remove_catalog_exercise(&self, entry_id: i32) -> Result<usize> {
        self.with_conn(move |conn| remove_catalog_entry(conn, entry_id))
            .await
    }

    /// The whole catalog, ordered by category and name.
    pub async fn catalog(&self) -> Result<Vec<CatalogEntry>> {
        self.with_conn(list_catalog).await
    }

    /// Autocomplete catalog names for a partially typed exercise.
    pub async fn suggest_exercises(&self, text: &str) -> Result<Vec<String>> {
        let text = text.trim().to_string();
        if text.chars().count() < MIN_SUGGESTION_CHARS {
            return Ok(vec![]);
        }

        debug!("Looking up suggestions for {}", text);
        self.with_conn(move |conn| search_catalog(conn, &text, SUGGESTION_LIMIT))
            .await
    }
}
