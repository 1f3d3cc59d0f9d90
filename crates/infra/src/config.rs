//! Runtime configuration.

use thiserror::Error;

use stowage_cargo::DEFAULT_WEIGHT_FACTOR;
use stowage_core::UserId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StowageConfig {
    /// Actor recorded for placement, waste planning and simulated usage.
    pub system_actor: UserId,
    /// Return weight per unit volume.
    pub weight_factor: f64,
    /// `tracing_subscriber::EnvFilter` directive.
    pub log_filter: String,
}

impl Default for StowageConfig {
    fn default() -> Self {
        Self {
            system_actor: UserId::system(),
            weight_factor: DEFAULT_WEIGHT_FACTOR,
            log_filter: "info".to_string(),
        }
    }
}

impl StowageConfig {
    /// Read `STOWAGE_SYSTEM_ACTOR`, `STOWAGE_WEIGHT_FACTOR` and `STOWAGE_LOG`
    /// (falling back to `RUST_LOG`). Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(actor) = lookup("STOWAGE_SYSTEM_ACTOR") {
            config.system_actor = UserId::new(actor.clone()).map_err(|e| ConfigError::Invalid {
                key: "STOWAGE_SYSTEM_ACTOR",
                value: actor,
                reason: e.to_string(),
            })?;
        }

        if let Some(raw) = lookup("STOWAGE_WEIGHT_FACTOR") {
            let invalid = |reason: &str| ConfigError::Invalid {
                key: "STOWAGE_WEIGHT_FACTOR",
                value: raw.clone(),
                reason: reason.to_string(),
            };
            let factor: f64 = raw.trim().parse().map_err(|_| invalid("not a number"))?;
            if !factor.is_finite() || factor <= 0.0 {
                return Err(invalid("must be a positive number"));
            }
            config.weight_factor = factor;
        }

        if let Some(filter) = lookup("STOWAGE_LOG").or_else(|| lookup("RUST_LOG")) {
            config.log_filter = filter;
        }

        Ok(config)
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
    fn defaults_when_nothing_is_set() {
        let config = StowageConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, StowageConfig::default());
        assert_eq!(config.weight_factor, 0.1);
        assert_eq!(config.system_actor.as_str(), "system");
    }

    #[test]
    fn reads_overrides() {
        let config = StowageConfig::from_lookup(lookup(&[
            ("STOWAGE_SYSTEM_ACTOR", "station-ai"),
            ("STOWAGE_WEIGHT_FACTOR", "0.25"),
            ("RUST_LOG", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.system_actor.as_str(), "station-ai");
        assert_eq!(config.weight_factor, 0.25);
        assert_eq!(config.log_filter, "debug");
    }

    #[test]
    fn stowage_log_wins_over_rust_log() {
        let config =
            StowageConfig::from_lookup(lookup(&[("STOWAGE_LOG", "warn"), ("RUST_LOG", "debug")])).unwrap();
        assert_eq!(config.log_filter, "warn");
    }

    #[test]
    fn rejects_bad_weight_factor() {
        for bad in ["heavy", "0", "-1", "inf"] {
            let err = StowageConfig::from_lookup(lookup(&[("STOWAGE_WEIGHT_FACTOR", bad)])).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { key: "STOWAGE_WEIGHT_FACTOR", .. }));
        }
    }
}
