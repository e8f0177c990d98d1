//! Runtime configuration, read from the environment (and a `.env` file).

use anyhow::Result;
use log::LevelFilter;
use std::env;

use crate::errors::GymlogError;
use crate::logging::parse_level;
use crate::metrics::{AggregatorConfig, EPLEY_DIVISOR};

pub const DEFAULT_DATABASE_URL: &str = "gymlog.db";
pub const DEFAULT_USER: &str = "default";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub username: String,
    pub log_level: LevelFilter,
    pub aggregator: AggregatorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            username: DEFAULT_USER.to_string(),
            log_level: LevelFilter::Warn,
            aggregator: AggregatorConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(url) = lookup("GYMLOG_DATABASE_URL").or_else(|| lookup("DATABASE_URL")) {
            config.database_url = url;
        }
        if let Some(user) = lookup("GYMLOG_USER") {
            config.username = user;
        }
        if let Some(level) = lookup("GYMLOG_LOG") {
            config.log_level = parse_level(&level)
                .ok_or_else(|| GymlogError::InvalidConfig(format!("GYMLOG_LOG={}", level)))?;
        }
        if let Some(divisor) = lookup("GYMLOG_E1RM_DIVISOR") {
            config.aggregator.one_rep_max_divisor = parse_divisor(&divisor)?;
        }

        Ok(config)
    }
}

fn parse_divisor(raw: &str) -> Result<f64, GymlogError> {
    match raw.trim().parse::<f64>() {
        Ok(d) if d.is_finite() && d > 0.0 => Ok(d),
        _ => Err(GymlogError::InvalidConfig(format!(
            "GYMLOG_E1RM_DIVISOR must be a positive number (default {}), got {}",
            EPLEY_DIVISOR, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.aggregator.one_rep_max_divisor, 30.0);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "fallback.db"),
            ("GYMLOG_DATABASE_URL", "gym.db"),
            ("GYMLOG_USER", "anna"),
            ("GYMLOG_LOG", "debug"),
            ("GYMLOG_E1RM_DIVISOR", "40"),
        ]))
        .unwrap();
        assert_eq!(config.database_url, "gym.db");
        assert_eq!(config.username, "anna");
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.aggregator.one_rep_max_divisor, 40.0);
    }

    #[test]
    fn falls_back_to_database_url() {
        let config = Config::from_lookup(lookup_from(&[("DATABASE_URL", "other.db")])).unwrap();
        assert_eq!(config.database_url, "other.db");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::from_lookup(lookup_from(&[("GYMLOG_E1RM_DIVISOR", "0")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("GYMLOG_E1RM_DIVISOR", "abc")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("GYMLOG_LOG", "loud")])).is_err());
    }
}
