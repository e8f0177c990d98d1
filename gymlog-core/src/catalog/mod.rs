//! Exercise catalog helpers: categories, filtering and grouping.

use std::fmt;
use std::str::FromStr;

use crate::db::models::CatalogEntry;
use crate::errors::GymlogError;

/// Autocomplete only kicks in from this many characters.
pub const MIN_SUGGESTION_CHARS: usize = 2;
pub const SUGGESTION_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    Chest,
    Back,
    Legs,
    Shoulders,
    Biceps,
    Triceps,
    Abs,
    #[default]
    Other,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Chest,
        Category::Back,
        Category::Legs,
        Category::Shoulders,
        Category::Biceps,
        Category::Triceps,
        Category::Abs,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Chest => "chest",
            Category::Back => "back",
            Category::Legs => "legs",
            Category::Shoulders => "shoulders",
            Category::Biceps => "biceps",
            Category::Triceps => "triceps",
            Category::Abs => "abs",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GymlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| GymlogError::UnknownCategory(s.to_string()))
    }
}

/// Trims an exercise name, rejecting names that are blank.
pub fn normalize_name(name: &str) -> Result<&str, GymlogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(GymlogError::EmptyName)
    } else {
        Ok(trimmed)
    }
}

/// Case-insensitive substring match, Unicode aware. `needle` must already be
/// lowercase.
pub fn name_matches(name: &str, needle: &str) -> bool {
    name.to_lowercase().contains(needle)
}

pub fn filter_catalog<'a>(entries: &'a [CatalogEntry], text: &str) -> Vec<&'a CatalogEntry> {
    let needle = text.to_lowercase();
    entries
        .iter()
        .filter(|e| name_matches(&e.name, &needle))
        .collect()
}

/// Groups entries by category in order of first appearance. Categories that
/// end up with no entries are not listed.
pub fn group_by_category<'a, I>(entries: I) -> Vec<(String, Vec<&'a CatalogEntry>)>
where
    I: IntoIterator<Item = &'a CatalogEntry>,
{
    let mut groups: Vec<(String, Vec<&'a CatalogEntry>)> = Vec::new();
    for entry in entries {
        match groups.iter_mut().find(|(c, _)| *c == entry.category) {
            Some((_, members)) => members.push(entry),
            None => groups.push((entry.category.clone(), vec![entry])),
        }
    }
    groups
}
