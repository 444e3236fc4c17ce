//! Engine configuration: load/validate, with sane library defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{Result, WeaveError};

/// Top-level configuration for an [`crate::engine::ExecutionEngine`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub engine: EngineSection,
}

impl EngineConfig {
    /// Load config from a specific `weave.toml`-shaped file path.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WeaveError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| WeaveError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `./weave.toml` if it exists, otherwise return defaults.
    pub fn load_or_default() -> Self {
        let path = PathBuf::from("weave.toml");
        if path.exists() {
            match Self::load(&path) {
                Ok(cfg) => cfg,
                Err(e) => {
                    warn!(%e, "failed to load weave.toml, falling back to defaults");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.engine.default_timeout_seconds <= 0.0 {
            return Err(WeaveError::Config(
                "engine.default_timeout_seconds must be > 0".into(),
            ));
        }
        if self.engine.backoff_base_seconds <= 0.0 {
            return Err(WeaveError::Config(
                "engine.backoff_base_seconds must be > 0".into(),
            ));
        }
        if self.engine.backoff_cap_seconds < self.engine.backoff_base_seconds {
            return Err(WeaveError::Config(
                "engine.backoff_cap_seconds must be >= engine.backoff_base_seconds".into(),
            ));
        }
        Ok(())
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Retry ceiling applied to any agent whose spec leaves `max_retries`
    /// unset. `AgentSpec::with_engine_defaults` resolves it before the DAG
    /// ever sees the spec, so this is the one place that value actually
    /// comes from.
    pub default_max_retries: u32,
    /// Per-attempt timeout applied to any agent whose spec leaves
    /// `timeout_seconds` unset, resolved the same way.
    pub default_timeout_seconds: f64,
    /// Opt-in continue-on-error mode (§9 open question), defaulting to
    /// fail-fast per spec.
    pub continue_on_error: bool,
    /// 0 = unbounded concurrent workflows.
    pub max_concurrent_workflows: usize,
    /// Bounded LRU capacity for completed `ExecutionContext`s.
    pub retention_capacity: usize,
    pub backoff_base_seconds: f64,
    pub backoff_cap_seconds: f64,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            default_max_retries: 3,
            default_timeout_seconds: 30.0,
            continue_on_error: false,
            max_concurrent_workflows: 0,
            retention_capacity: 256,
            backoff_base_seconds: 1.0,
            backoff_cap_seconds: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TOML: &str = r#"
[engine]
default_max_retries = 5
default_timeout_seconds = 45.0
continue_on_error = true
max_concurrent_workflows = 10
retention_capacity = 64
backoff_base_seconds = 2.0
backoff_cap_seconds = 30.0
"#;

    #[test]
    fn parse_full_toml() {
        let cfg: EngineConfig = toml::from_str(FULL_TOML).expect("parse full TOML");
        assert_eq!(cfg.engine.default_max_retries, 5);
        assert!(cfg.engine.continue_on_error);
        assert_eq!(cfg.engine.max_concurrent_workflows, 10);
        cfg.validate().expect("full config is valid");
    }

    #[test]
    fn parse_minimal_toml_gets_defaults() {
        let cfg: EngineConfig = toml::from_str("").expect("parse empty TOML");
        assert_eq!(cfg.engine.default_timeout_seconds, 30.0);
        assert_eq!(cfg.engine.retention_capacity, 256);
        assert!(!cfg.engine.continue_on_error);
        cfg.validate().expect("default config is valid");
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut cfg = EngineConfig::default();
        cfg.engine.default_timeout_seconds = 0.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("default_timeout_seconds"));
    }

    #[test]
    fn validate_rejects_cap_below_base() {
        let mut cfg = EngineConfig::default();
        cfg.engine.backoff_cap_seconds = 0.5;
        cfg.engine.backoff_base_seconds = 1.0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("backoff_cap_seconds"));
    }

    #[test]
    fn serialization_round_trip() {
        let original = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&original).expect("serialize");
        let restored: EngineConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(
            original.engine.default_timeout_seconds,
            restored.engine.default_timeout_seconds
        );
        restored.validate().expect("round-tripped config is valid");
    }
}
