use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::GymlogError;

/// One performed set as read by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRecord {
    pub weight_kg: f64,
    pub repetitions: u32,
    #[serde(default = "first_set_index")]
    pub set_index: u32,
    #[serde(default)]
    pub rest_seconds: u32,
}

fn first_set_index() -> u32 {
    1
}

impl SetRecord {
    pub fn new(weight_kg: f64, repetitions: u32) -> Self {
        Self {
            weight_kg,
            repetitions,
            set_index: 1,
            rest_seconds: 0,
        }
    }

    pub fn validate(&self) -> Result<(), GymlogError> {
        if !self.weight_kg.is_finite() || self.weight_kg < 0.0 {
            return Err(GymlogError::InvalidWeight(self.weight_kg));
        }
        Ok(())
    }
}

/// All sets of one exercise within one workout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSession {
    #[serde(deserialize_with = "deserialize_date")]
    pub date: NaiveDateTime,
    pub sets: Vec<SetRecord>,
}

impl ExerciseSession {
    pub fn new(date: NaiveDateTime, sets: Vec<SetRecord>) -> Self {
        Self { date, sets }
    }

    pub fn validate(&self) -> Result<(), GymlogError> {
        self.sets.iter().try_for_each(SetRecord::validate)
    }
}

/// Accepts RFC 3339 timestamps, naive `YYYY-MM-DDTHH:MM:SS[.f]` and plain dates.
pub fn parse_session_date(s: &str) -> Result<NaiveDateTime, GymlogError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Local).naive_local());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| GymlogError::InvalidDate(s.to_string()))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = String::deserialize(deserializer)?;
    parse_session_date(&raw).map_err(Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_record_shape() {
        let json = r#"[
            {"date": "2024-01-01T09:15:00Z", "sets": [{"weightKg": 40, "repetitions": 10}, {"weightKg": 40, "repetitions": 8, "setIndex": 2, "restSeconds": 90}]},
            {"date": "2024-01-08", "sets": [{"weightKg": 45.5, "repetitions": 6}]}
        ]"#;
        let sessions: Vec<ExerciseSession> = serde_json::from_str(json).unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].sets[0].set_index, 1);
        assert_eq!(sessions[0].sets[1].rest_seconds, 90);
        assert_eq!(sessions[1].sets[0].weight_kg, 45.5);
        assert_eq!(sessions[1].date.format("%Y-%m-%d %H:%M").to_string(), "2024-01-08 00:00");
    }

    #[test]
    fn offset_timestamps_land_in_local_time() {
        let utc = parse_session_date("2024-01-02T04:30:00Z").unwrap();
        let eastern = parse_session_date("2024-01-01T23:30:00-05:00").unwrap();
        assert_eq!(utc, eastern);

        let expected = DateTime::parse_from_rfc3339("2024-01-02T04:30:00Z")
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        assert_eq!(utc, expected);
    }

    #[test]
    fn rejects_bad_dates_and_reps() {
        assert!(parse_session_date("yesterday").is_err());
        let negative_reps = r#"{"date": "2024-01-01", "sets": [{"weightKg": 40, "repetitions": -1}]}"#;
        assert!(serde_json::from_str::<ExerciseSession>(negative_reps).is_err());
    }

    #[test]
    fn validate_rejects_negative_weight() {
        let session = ExerciseSession::new(
            parse_session_date("2024-01-01").unwrap(),
            vec![SetRecord::new(-5.0, 5)],
        );
        assert_eq!(session.validate(), Err(GymlogError::InvalidWeight(-5.0)));
    }
}
