use std::time::Duration;

use path_matrix_core::contract::DEFAULT_TABLE_NAME;
use thiserror::Error;

pub const TABLE_NAME_ENV: &str = "PATHS_TABLE_NAME";
pub const DISTANCE_WORKERS_ENV: &str = "DISTANCE_WORKERS";
pub const TABLE_READY_TIMEOUT_ENV: &str = "TABLE_READY_TIMEOUT_SECS";
pub const DEFAULT_TABLE_READY_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must not be empty")]
    Empty { name: &'static str },
    #[error("{name} must be a positive integer, got '{value}'")]
    NotPositive { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub table_name: String,
    pub distance_workers: Option<usize>,
    pub table_ready_timeout: Duration,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            distance_workers: None,
            table_ready_timeout: Duration::from_secs(DEFAULT_TABLE_READY_TIMEOUT_SECS),
        }
    }
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable lookup. Unset variables
    /// fall back to defaults; set-but-invalid ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let table_name = match lookup(TABLE_NAME_ENV) {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    name: TABLE_NAME_ENV,
                })
            }
            Some(value) => value.trim().to_string(),
            None => defaults.table_name,
        };

        let distance_workers = lookup(DISTANCE_WORKERS_ENV)
            .map(|value| parse_positive(DISTANCE_WORKERS_ENV, &value))
            .transpose()?
            .map(|workers| workers as usize);

        let table_ready_timeout = lookup(TABLE_READY_TIMEOUT_ENV)
            .map(|value| parse_positive(TABLE_READY_TIMEOUT_ENV, &value))
            .transpose()?
            .map(Duration::from_secs)
            .unwrap_or(defaults.table_ready_timeout);

        Ok(Self {
            table_name,
            distance_workers,
            table_ready_timeout,
        })
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::NotPositive {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn unset_variables_use_defaults() {
        let config = HandlerConfig::from_lookup(lookup_from(&[])).expect("config should load");
        assert_eq!(config, HandlerConfig::default());
        assert_eq!(config.table_name, "paths");
    }

    #[test]
    fn reads_all_overrides() {
        let config = HandlerConfig::from_lookup(lookup_from(&[
            (TABLE_NAME_ENV, "test"),
            (DISTANCE_WORKERS_ENV, "4"),
            (TABLE_READY_TIMEOUT_ENV, "15"),
        ]))
        .expect("config should load");

        assert_eq!(config.table_name, "test");
        assert_eq!(config.distance_workers, Some(4));
        assert_eq!(config.table_ready_timeout, Duration::from_secs(15));
    }

    #[test]
    fn rejects_zero_workers() {
        let error = HandlerConfig::from_lookup(lookup_from(&[(DISTANCE_WORKERS_ENV, "0")]))
            .expect_err("zero workers should fail");
        assert_eq!(
            error,
            ConfigError::NotPositive {
                name: DISTANCE_WORKERS_ENV,
                value: "0".to_string(),
            }
        );
    }

    #[test]
    fn rejects_blank_table_name() {
        let error = HandlerConfig::from_lookup(lookup_from(&[(TABLE_NAME_ENV, "  ")]))
            .expect_err("blank table name should fail");
        assert_eq!(error.to_string(), "PATHS_TABLE_NAME must not be empty");
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let error = HandlerConfig::from_lookup(lookup_from(&[(TABLE_READY_TIMEOUT_ENV, "soon")]))
            .expect_err("non-numeric timeout should fail");
        assert!(error.to_string().contains("TABLE_READY_TIMEOUT_SECS"));
    }
}
