use std::env;
use std::path::Path;

use anyhow::{Context, Result};

use crate::metrics::series::DEFAULT_MARGIN;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override these values where both exist.
#[derive(Debug, Clone)]
pub struct Config {
    /// Simulation database holding the post table (RIPPLE_DB_PATH).
    pub db_path: String,
    /// Table with post records (RIPPLE_POST_TABLE, default `post`).
    pub post_table: String,
    /// Seconds per time unit for text timestamps (RIPPLE_TIME_UNIT_SECS).
    /// The default of 60 makes offsets minutes.
    pub time_unit_secs: i64,
    /// Time units sampled past the last activation (RIPPLE_MARGIN).
    pub margin: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "./simulation.db".to_string(),
            post_table: "post".to_string(),
            time_unit_secs: 60,
            margin: DEFAULT_MARGIN,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            db_path: env::var("RIPPLE_DB_PATH").unwrap_or(defaults.db_path),
            post_table: env::var("RIPPLE_POST_TABLE").unwrap_or(defaults.post_table),
            time_unit_secs: parse_env("RIPPLE_TIME_UNIT_SECS")?.unwrap_or(defaults.time_unit_secs),
            margin: parse_env("RIPPLE_MARGIN")?.unwrap_or(defaults.margin),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check numeric settings. Call again after applying CLI overrides.
    pub fn validate(&self) -> Result<()> {
        if self.time_unit_secs <= 0 {
            anyhow::bail!(
                "RIPPLE_TIME_UNIT_SECS must be positive, got {}",
                self.time_unit_secs
            );
        }
        if self.margin < 0 {
            anyhow::bail!(
                "Margin (RIPPLE_MARGIN or --margin) must not be negative, got {}",
                self.margin
            );
        }
        Ok(())
    }

    /// Check that the simulation database exists.
    /// Call this before any command that reads records from SQLite.
    pub fn require_db(&self) -> Result<()> {
        if !Path::new(&self.db_path).exists() {
            anyhow::bail!(
                "Simulation database not found at {}.\n\
                 Set RIPPLE_DB_PATH in your .env file or pass --db.",
                self.db_path
            );
        }
        Ok(())
    }
}

fn parse_env(key: &str) -> Result<Option<i64>> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map(Some)
            .with_context(|| format!("{key} must be an integer, got {raw:?}")),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_minutes() {
        let config = Config::default();
        assert_eq!(config.time_unit_secs, 60);
        assert_eq!(config.margin, 3);
        assert_eq!(config.post_table, "post");
    }

    #[test]
    fn test_validate_rejects_negative_margin() {
        let config = Config {
            margin: -10,
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("--margin"), "got: {err}");
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_time_unit() {
        let config = Config {
            time_unit_secs: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_db_fails_for_missing_file() {
        let config = Config {
            db_path: "/nonexistent/ripple-test.db".to_string(),
            ..Config::default()
        };
        let err = config.require_db().unwrap_err();
        assert!(err.to_string().contains("RIPPLE_DB_PATH"));
    }
}
