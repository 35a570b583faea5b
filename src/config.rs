//! Configuration: built-in defaults, then an optional TOML file, then environment overrides.
//!
//! ```toml
//! database = "/home/me/.local/share/mastery.db"
//!
//! [engine]
//! strategy = "dampened"   # or "baseline"
//! decay_rate = 0.95
//! inertia = 0.8
//! max_daily_delta = 0.08
//!
//! [priority]
//! threshold = 0.6
//! limit = 10
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::DEFAULT_DECAY_RATE;
use crate::error::{MasteryError, Result};

pub const DB_ENV: &str = "MASTERY_DB";
pub const CONFIG_ENV: &str = "MASTERY_CONFIG";
pub const STRATEGY_ENV: &str = "MASTERY_STRATEGY";

const APP_DIR: &str = "mastery";
const DEFAULT_DB_NAME: &str = "mastery.db";
const DEFAULT_CONFIG_NAME: &str = "config.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Baseline,
    #[default]
    Dampened,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Baseline => "baseline",
            StrategyKind::Dampened => "dampened",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "baseline" | "bayesian" | "v1" => Some(StrategyKind::Baseline),
            "dampened" | "damped" | "v2" => Some(StrategyKind::Dampened),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strategy: StrategyKind,
    /// Fraction of confidence kept per day without review
    pub decay_rate: f64,
    /// Dampened only: weight of the prior when blending with the posterior
    pub inertia: f64,
    /// Dampened only: largest change a single update may make
    pub max_daily_delta: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            decay_rate: DEFAULT_DECAY_RATE,
            inertia: 0.8,
            max_daily_delta: 0.08,
        }
    }
}

/// Weak-concept ranking knobs. Defaults are empirical, not derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    /// Concepts at or above this confidence are not considered weak
    pub threshold: f64,
    pub limit: usize,
    pub confidence_weight: f64,
    pub recency_weight: f64,
    pub unreviewed_priority: f64,
    /// `(more than N days since review, priority)`, checked in order
    pub stale_tiers: Vec<(i64, f64)>,
    pub fresh_priority: f64,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            limit: 10,
            confidence_weight: 0.7,
            recency_weight: 0.3,
            unreviewed_priority: 0.5,
            stale_tiers: vec![(14, 1.0), (7, 0.7), (3, 0.4)],
            fresh_priority: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub engine: EngineConfig,
    pub priority: PriorityConfig,
}

impl Config {
    /// Resolves the full configuration from the process environment.
    pub fn load() -> Result<Self> {
        let lookup = |key: &str| std::env::var(key).ok();
        let explicit = lookup(CONFIG_ENV).map(PathBuf::from);

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => {
                let default_path = config_dir().join(DEFAULT_CONFIG_NAME);
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(lookup)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_ENV) {
            self.database = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup(STRATEGY_ENV) {
            self.engine.strategy = StrategyKind::from_str(&name).ok_or_else(|| {
                MasteryError::Config(format!(
                    "unknown strategy '{}' in {} (use baseline or dampened)",
                    name, STRATEGY_ENV
                ))
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let engine = &self.engine;
        if !(engine.decay_rate > 0.0 && engine.decay_rate <= 1.0) {
            return Err(MasteryError::Config(format!(
                "decay_rate {} must be in (0, 1]",
                engine.decay_rate
            )));
        }
        if !(0.0..1.0).contains(&engine.inertia) {
            return Err(MasteryError::Config(format!(
                "inertia {} must be in [0, 1)",
                engine.inertia
            )));
        }
        if !(engine.max_daily_delta > 0.0) {
            return Err(MasteryError::Config(format!(
                "max_daily_delta {} must be positive",
                engine.max_daily_delta
            )));
        }

        let priority = &self.priority;
        if !(priority.threshold > 0.0 && priority.threshold <= 1.0) {
            return Err(MasteryError::Config(format!(
                "priority threshold {} must be in (0, 1]",
                priority.threshold
            )));
        }
        let weights = [
            ("confidence_weight", priority.confidence_weight),
            ("recency_weight", priority.recency_weight),
            ("unreviewed_priority", priority.unreviewed_priority),
            ("fresh_priority", priority.fresh_priority),
        ];
        let tiers = priority
            .stale_tiers
            .iter()
            .map(|&(_, value)| ("stale_tiers priority", value));
        for (name, value) in weights.into_iter().chain(tiers) {
            if !(0.0..=1.0).contains(&value) {
                return Err(MasteryError::Config(format!(
                    "{} {} must be in [0, 1]",
                    name, value
                )));
            }
        }
        if priority
            .stale_tiers
            .windows(2)
            .any(|w| w[0].0 <= w[1].0)
        {
            return Err(MasteryError::Config(
                "stale_tiers must be ordered by strictly descending day count".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        match &self.database {
            Some(path) => path.clone(),
            None => {
                let dir = data_dir();
                fs::create_dir_all(&dir).ok();
                dir.join(DEFAULT_DB_NAME)
            }
        }
    }
}

pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    mod parse_tests {
        use super::*;

        #[test]
        fn defaults_are_valid() {
            let config = Config::default();
            assert!(config.validate().is_ok());
            assert_eq!(config.engine.strategy, StrategyKind::Dampened);
            assert_eq!(config.priority.threshold, 0.6);
        }

        #[test]
        fn empty_toml_gives_defaults() {
            let config = Config::from_toml_str("").unwrap();
            assert_eq!(config, Config::default());
        }

        #[test]
        fn partial_toml_keeps_other_defaults() {
            let config = Config::from_toml_str(
                r#"
                [engine]
                strategy = "baseline"
                decay_rate = 0.9

                [priority]
                limit = 3
                "#,
            )
            .unwrap();
            assert_eq!(config.engine.strategy, StrategyKind::Baseline);
            assert_eq!(config.engine.decay_rate, 0.9);
            assert_eq!(config.engine.inertia, 0.8);
            assert_eq!(config.priority.limit, 3);
            assert_eq!(config.priority.threshold, 0.6);
        }

        #[test]
        fn unknown_strategy_in_toml_fails() {
            let result = Config::from_toml_str("[engine]\nstrategy = \"magic\"\n");
            assert!(matches!(result, Err(MasteryError::Toml(_))));
        }

        #[test]
        fn from_file_reads_toml() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "database = \"/tmp/elsewhere.db\"").unwrap();
            let config = Config::from_file(file.path()).unwrap();
            assert_eq!(config.database_path(), PathBuf::from("/tmp/elsewhere.db"));
        }

        #[test]
        fn from_file_missing_is_io_error() {
            let result = Config::from_file(Path::new("/definitely/not/here.toml"));
            assert!(matches!(result, Err(MasteryError::Io(_))));
        }
    }

    mod override_tests {
        use super::*;

        #[test]
        fn db_env_overrides_file_value() {
            let mut config = Config {
                database: Some(PathBuf::from("/from/file.db")),
                ..Config::default()
            };
            config
                .apply_overrides(env(&[(DB_ENV, "/from/env.db")]))
                .unwrap();
            assert_eq!(config.database_path(), PathBuf::from("/from/env.db"));
        }

        #[test]
        fn strategy_env_selects_variant() {
            let mut config = Config::default();
            config
                .apply_overrides(env(&[(STRATEGY_ENV, "Baseline")]))
                .unwrap();
            assert_eq!(config.engine.strategy, StrategyKind::Baseline);
        }

        #[test]
        fn bad_strategy_env_is_config_error() {
            let mut config = Config::default();
            let err = config
                .apply_overrides(env(&[(STRATEGY_ENV, "sm2")]))
                .unwrap_err();
            assert!(matches!(err, MasteryError::Config(_)));
        }

        #[test]
        fn no_env_leaves_config_untouched() {
            let mut config = Config::default();
            config.apply_overrides(env(&[])).unwrap();
            assert_eq!(config, Config::default());
        }

        #[test]
        fn default_database_path_ends_with_db_name() {
            let path = Config::default().database_path();
            assert!(path.to_string_lossy().ends_with("mastery.db"));
        }
    }

    mod validate_tests {
        use super::*;

        fn with_engine(engine: EngineConfig) -> Config {
            Config {
                engine,
                ..Config::default()
            }
        }

        #[test]
        fn rejects_decay_rate_out_of_range() {
            for bad in [0.0, -0.5, 1.5, f64::NAN] {
                let config = with_engine(EngineConfig {
                    decay_rate: bad,
                    ..EngineConfig::default()
                });
                assert!(config.validate().is_err(), "decay_rate {} accepted", bad);
            }
        }

        #[test]
        fn rejects_full_inertia() {
            let config = with_engine(EngineConfig {
                inertia: 1.0,
                ..EngineConfig::default()
            });
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_non_positive_delta() {
            let config = with_engine(EngineConfig {
                max_daily_delta: 0.0,
                ..EngineConfig::default()
            });
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_unordered_stale_tiers() {
            let config = Config {
                priority: PriorityConfig {
                    stale_tiers: vec![(3, 0.4), (7, 0.7)],
                    ..PriorityConfig::default()
                },
                ..Config::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_zero_threshold() {
            let config = Config {
                priority: PriorityConfig {
                    threshold: 0.0,
                    ..PriorityConfig::default()
                },
                ..Config::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_ranking_weights_outside_unit_interval() {
            let cases: [fn(&mut PriorityConfig, f64); 5] = [
                |p, v| p.confidence_weight = v,
                |p, v| p.recency_weight = v,
                |p, v| p.unreviewed_priority = v,
                |p, v| p.fresh_priority = v,
                |p, v| p.stale_tiers[1].1 = v,
            ];
            for set in cases {
                for bad in [-0.1, 1.5, f64::NAN, f64::INFINITY] {
                    let mut priority = PriorityConfig::default();
                    set(&mut priority, bad);
                    let config = Config {
                        priority,
                        ..Config::default()
                    };
                    assert!(config.validate().is_err(), "weight {} accepted", bad);
                }
            }
        }
    }
}
