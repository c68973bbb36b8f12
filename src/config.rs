//! Application settings loaded from the environment (and `.env`, if present).

use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CITY, DEFAULT_DB_PATH, DEFAULT_EXPORT_DIR, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_SECS,
    DEFAULT_UNITS, OPENWEATHER_API_BASE,
};
use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub city: String,
    pub language: String,
    pub units: String,
    pub timeout: Duration,
    pub db_path: PathBuf,
    pub export_dir: PathBuf,
}

impl Config {
    /// Loads `.env` and reads settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!("Failed to read .env file: {}", e);
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENWEATHER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::Missing("OPENWEATHER_API_KEY"))?;

        let timeout = match lookup("REQUEST_TIMEOUT") {
            None => DEFAULT_TIMEOUT_SECS,
            Some(raw) => {
                let secs: i64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    key: "REQUEST_TIMEOUT",
                    value: raw.clone(),
                    reason: "must be an integer",
                })?;
                if secs <= 0 {
                    return Err(ConfigError::Invalid {
                        key: "REQUEST_TIMEOUT",
                        value: raw,
                        reason: "must be positive",
                    });
                }
                secs as u64
            }
        };

        let or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            api_key,
            base_url: or("OPENWEATHER_BASE_URL", OPENWEATHER_API_BASE),
            city: or("DEFAULT_CITY", DEFAULT_CITY),
            language: or("DEFAULT_LANGUAGE", DEFAULT_LANGUAGE),
            units: or("DEFAULT_UNITS", DEFAULT_UNITS),
            timeout: Duration::from_secs(timeout),
            db_path: PathBuf::from(or("WEATHER_DB_PATH", DEFAULT_DB_PATH)),
            export_dir: PathBuf::from(or("WEATHER_EXPORT_DIR", DEFAULT_EXPORT_DIR)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = Config::from_lookup(lookup(&[("OPENWEATHER_API_KEY", "secret")])).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.base_url, OPENWEATHER_API_BASE);
        assert_eq!(config.city, "Moscow");
        assert_eq!(config.language, "ru");
        assert_eq!(config.units, "metric");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_PATH));
    }

    #[test]
    fn missing_api_key_is_rejected() {
        let err = Config::from_lookup(lookup(&[("DEFAULT_CITY", "Kazan")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("OPENWEATHER_API_KEY")));

        let err = Config::from_lookup(lookup(&[("OPENWEATHER_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)));
    }

    #[test]
    fn timeout_must_be_positive_integer() {
        let err = Config::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "k"),
            ("REQUEST_TIMEOUT", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REQUEST_TIMEOUT", .. }));

        let err = Config::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "k"),
            ("REQUEST_TIMEOUT", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { reason: "must be positive", .. }));

        let config = Config::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "k"),
            ("REQUEST_TIMEOUT", "5"),
            ("DEFAULT_CITY", "Kazan"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.city, "Kazan");
    }
}
