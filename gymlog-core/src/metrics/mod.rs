//! Progression metrics for a single exercise.
//!
//! Turns the chronological sessions of one exercise into a per-session time
//! series ([`MetricPoint`]) and reduces a series to the summary tiles shown
//! next to a progression chart ([`Summary`]). Everything here is a pure
//! function of its inputs.

mod record;

pub use record::{ExerciseSession, SetRecord, parse_session_date};

use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::errors::GymlogError;

/// Divisor of the Epley one-rep-max estimate `weight × (1 + reps / 30)`.
pub const EPLEY_DIVISOR: f64 = 30.0;

/// Format used for [`MetricPoint::label`].
pub const LABEL_FORMAT: &str = "%d/%m";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatorConfig {
    pub one_rep_max_divisor: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            one_rep_max_divisor: EPLEY_DIVISOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricPoint {
    pub label: String,
    pub date: NaiveDateTime,
    pub max_weight: f64,
    pub volume: f64,
    pub estimated_one_rep_max: f64,
    pub set_count: usize,
}

impl MetricPoint {
    pub fn value(&self, key: MetricKey) -> f64 {
        match key {
            MetricKey::MaxWeight => self.max_weight,
            MetricKey::Volume => self.volume,
            MetricKey::EstimatedOneRepMax => self.estimated_one_rep_max,
            MetricKey::SetCount => self.set_count as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKey {
    MaxWeight,
    Volume,
    EstimatedOneRepMax,
    SetCount,
}

impl MetricKey {
    pub const ALL: [MetricKey; 4] = [
        MetricKey::MaxWeight,
        MetricKey::Volume,
        MetricKey::EstimatedOneRepMax,
        MetricKey::SetCount,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::MaxWeight => "max-weight",
            MetricKey::Volume => "volume",
            MetricKey::EstimatedOneRepMax => "e1rm",
            MetricKey::SetCount => "sets",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::MaxWeight => "Max weight",
            MetricKey::Volume => "Volume",
            MetricKey::EstimatedOneRepMax => "Estimated 1RM",
            MetricKey::SetCount => "Sets",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            MetricKey::SetCount => "",
            _ => "kg",
        }
    }

    /// Renders `value` followed by this metric's unit, if it has one.
    pub fn format_value(&self, value: f64) -> String {
        format!("{} {}", value, self.unit()).trim().to_string()
    }

    pub fn next(&self) -> MetricKey {
        let idx = Self::ALL.iter().position(|k| k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKey {
    type Err = GymlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "max-weight" | "max_weight" | "maxweight" | "weight" => Ok(MetricKey::MaxWeight),
            "volume" => Ok(MetricKey::Volume),
            "e1rm" | "1rm" | "orm" | "one-rep-max" => Ok(MetricKey::EstimatedOneRepMax),
            "sets" | "set-count" | "set_count" => Ok(MetricKey::SetCount),
            _ => Err(GymlogError::UnknownMetric(s.to_string())),
        }
    }
}

/// Summary statistics of one metric across a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Summary {
    pub latest: f64,
    /// `None` for an empty series.
    pub record: Option<f64>,
    pub delta: f64,
    pub count: usize,
}

impl Summary {
    /// The delta with an explicit sign, e.g. `+5` or `-2.5`.
    pub fn delta_display(&self) -> String {
        if self.delta >= 0.0 {
            format!("+{}", self.delta)
        } else {
            format!("{}", self.delta)
        }
    }
}

/// Rounds half-up to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor + 0.5).floor() / factor
}

pub fn estimated_one_rep_max(weight_kg: f64, repetitions: u32, divisor: f64) -> f64 {
    weight_kg * (1.0 + f64::from(repetitions) / divisor)
}

pub fn format_label(date: &NaiveDateTime) -> String {
    date.format(LABEL_FORMAT).to_string()
}

/// Derives the metrics of a single session, `None` when it has no sets.
pub fn session_point(session: &ExerciseSession, config: &AggregatorConfig) -> Option<MetricPoint> {
    if session.sets.is_empty() {
        return None;
    }

    let max_weight = session
        .sets
        .iter()
        .map(|s| s.weight_kg)
        .fold(f64::NEG_INFINITY, f64::max);
    let volume: f64 = session
        .sets
        .iter()
        .map(|s| s.weight_kg * f64::from(s.repetitions))
        .sum();
    let one_rep_max = session
        .sets
        .iter()
        .map(|s| estimated_one_rep_max(s.weight_kg, s.repetitions, config.one_rep_max_divisor))
        .fold(f64::NEG_INFINITY, f64::max);

    Some(MetricPoint {
        label: format_label(&session.date),
        date: session.date,
        max_weight: round_to(max_weight, 1),
        volume: round_to(volume, 0),
        estimated_one_rep_max: round_to(one_rep_max, 1),
        set_count: session.sets.len(),
    })
}

/// Computes one point per session, in input order. Sessions without sets
/// have no defined metrics and are left out.
pub fn compute_series(sessions: &[ExerciseSession], config: &AggregatorConfig) -> Vec<MetricPoint> {
    let series: Vec<MetricPoint> = sessions
        .iter()
        .filter_map(|session| {
            let point = session_point(session, config);
            if point.is_none() {
                warn!("Skipping session on {} with no sets", session.date);
            }
            point
        })
        .collect();
    debug!(
        "Computed {} metric points from {} sessions",
        series.len(),
        sessions.len()
    );
    series
}

pub fn summarize(series: &[MetricPoint], key: MetricKey) -> Summary {
    let first = series.first().map(|p| p.value(key));
    let latest = series.last().map(|p| p.value(key)).unwrap_or(0.0);
    let record = series.iter().map(|p| p.value(key)).reduce(f64::max);
    let delta = match first {
        Some(first) if series.len() >= 2 => round_to(latest - first, 1),
        _ => 0.0,
    };

    Summary {
        latest,
        record,
        delta,
        count: series.len(),
    }
}

/// Anything that can hand out the chronological sessions of one exercise.
pub trait SessionSource {
    fn sessions_for_exercise(&self, name: &str) -> Result<Vec<ExerciseSession>>;
}

pub fn load_series<S: SessionSource + ?Sized>(
    source: &S,
    name: &str,
    config: &AggregatorConfig,
) -> Result<Vec<MetricPoint>> {
    let sessions = source.sessions_for_exercise(name)?;
    Ok(compute_series(&sessions, config))
}
