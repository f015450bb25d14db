//! Engine and revision-loop configuration.
//!
//! Passed explicitly into `ValidationEngine` and `RevisionLoop` at
//! construction. Sources, lowest precedence first: built-in defaults, an
//! optional TOML file, then `PCBUILD_*` environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;
use crate::model::CoolingType;

const DEFAULT_MAX_ITERATIONS: u32 = 5;
const DEFAULT_PSU_MARGIN: f64 = 0.3;
const DEFAULT_AIR_THERMAL_THRESHOLD_W: u32 = 250;
const DEFAULT_AIO_THERMAL_THRESHOLD_W: u32 = 450;
const DEFAULT_CUSTOM_THERMAL_THRESHOLD_W: u32 = 600;
const DEFAULT_COLLABORATOR_TIMEOUT_SECS: u64 = 120;
const DEFAULT_COLLABORATOR_RETRIES: u32 = 2;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

pub const ENV_MAX_ITERATIONS: &str = "PCBUILD_MAX_ITERATIONS";
pub const ENV_PSU_MARGIN: &str = "PCBUILD_PSU_MARGIN";
pub const ENV_AIR_THERMAL_THRESHOLD_W: &str = "PCBUILD_AIR_THERMAL_THRESHOLD_W";
pub const ENV_BUDGET_TOLERANCE: &str = "PCBUILD_BUDGET_TOLERANCE";
pub const ENV_MAX_WARNINGS: &str = "PCBUILD_MAX_WARNINGS";
pub const ENV_COLLABORATOR_TIMEOUT_SECS: &str = "PCBUILD_COLLABORATOR_TIMEOUT_SECS";
pub const ENV_COLLABORATOR_RETRIES: &str = "PCBUILD_COLLABORATOR_RETRIES";

/// Parameters of the deterministic rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Fractional PSU headroom over estimated load (0.3 = 30%).
    pub psu_margin: f64,
    /// Combined CPU+GPU TDP above which an air-cooled build is a thermal risk.
    pub air_thermal_threshold_w: u32,
    pub aio_thermal_threshold_w: u32,
    pub custom_thermal_threshold_w: u32,
    /// Fraction over the budget ceiling tolerated as a warning (0.05 = 5%).
    pub budget_tolerance: f64,
    /// Add RAM, storage, board, fan, and pump draw to the CPU+GPU load.
    pub include_auxiliary_load: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            psu_margin: DEFAULT_PSU_MARGIN,
            air_thermal_threshold_w: DEFAULT_AIR_THERMAL_THRESHOLD_W,
            aio_thermal_threshold_w: DEFAULT_AIO_THERMAL_THRESHOLD_W,
            custom_thermal_threshold_w: DEFAULT_CUSTOM_THERMAL_THRESHOLD_W,
            budget_tolerance: 0.0,
            include_auxiliary_load: false,
        }
    }
}

impl ValidationConfig {
    /// Thermal threshold tier for a cooling type.
    pub fn thermal_threshold_w(&self, cooling: CoolingType) -> u32 {
        match cooling {
            CoolingType::Air => self.air_thermal_threshold_w,
            CoolingType::Aio => self.aio_thermal_threshold_w,
            CoolingType::Custom => self.custom_thermal_threshold_w,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.psu_margin.is_finite() || !(0.0..=5.0).contains(&self.psu_margin) {
            return Err(ConfigError::Invalid(format!(
                "psu_margin must be in [0, 5], got {}",
                self.psu_margin
            )));
        }
        if !self.budget_tolerance.is_finite() || !(0.0..=1.0).contains(&self.budget_tolerance) {
            return Err(ConfigError::Invalid(format!(
                "budget_tolerance must be in [0, 1], got {}",
                self.budget_tolerance
            )));
        }
        if self.air_thermal_threshold_w == 0
            || self.aio_thermal_threshold_w == 0
            || self.custom_thermal_threshold_w == 0
        {
            return Err(ConfigError::Invalid(
                "thermal thresholds must be > 0".to_string(),
            ));
        }
        if self.air_thermal_threshold_w > self.aio_thermal_threshold_w
            || self.aio_thermal_threshold_w > self.custom_thermal_threshold_w
        {
            return Err(ConfigError::Invalid(format!(
                "thermal thresholds must not decrease from air to aio to custom, got {}/{}/{}",
                self.air_thermal_threshold_w,
                self.aio_thermal_threshold_w,
                self.custom_thermal_threshold_w
            )));
        }
        Ok(())
    }
}

/// Parameters of the revision loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionConfig {
    /// Validation cycles before a session is exhausted.
    pub max_iterations: u32,
    /// Warnings tolerated on an approved build. `None` never blocks.
    pub max_warnings: Option<usize>,
    /// Per-call timeout for Planner and Critic.
    pub collaborator_timeout_secs: u64,
    /// Retries after the first failed attempt of one collaborator call.
    pub collaborator_retries: u32,
    /// Base delay between retries, doubled on each attempt.
    pub retry_backoff_ms: u64,
    /// Treat changes to preserved classes as a retryable planner failure.
    pub strict_preservation: bool,
}

impl Default for RevisionConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_warnings: None,
            collaborator_timeout_secs: DEFAULT_COLLABORATOR_TIMEOUT_SECS,
            collaborator_retries: DEFAULT_COLLABORATOR_RETRIES,
            retry_backoff_ms: DEFAULT_RETRY_BACKOFF_MS,
            strict_preservation: false,
        }
    }
}

impl RevisionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iterations == 0 {
            return Err(ConfigError::Invalid("max_iterations must be > 0".to_string()));
        }
        if self.collaborator_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "collaborator_timeout_secs must be > 0".to_string(),
            ));
        }
        if self.collaborator_retries > 10 {
            return Err(ConfigError::Invalid(format!(
                "collaborator_retries must be <= 10, got {}",
                self.collaborator_retries
            )));
        }
        Ok(())
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub validation: ValidationConfig,
    pub revision: RevisionConfig,
}

impl EngineConfig {
    /// Defaults, then the TOML file if given, then process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `PCBUILD_*` overrides. `lookup` abstracts the environment so
    /// tests do not have to mutate process state.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        if let Some(v) = parse_env(&lookup, ENV_MAX_ITERATIONS)? {
            self.revision.max_iterations = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_PSU_MARGIN)? {
            self.validation.psu_margin = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_AIR_THERMAL_THRESHOLD_W)? {
            self.validation.air_thermal_threshold_w = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_BUDGET_TOLERANCE)? {
            self.validation.budget_tolerance = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_MAX_WARNINGS)? {
            self.revision.max_warnings = Some(v);
        }
        if let Some(v) = parse_env(&lookup, ENV_COLLABORATOR_TIMEOUT_SECS)? {
            self.revision.collaborator_timeout_secs = v;
        }
        if let Some(v) = parse_env(&lookup, ENV_COLLABORATOR_RETRIES)? {
            self.revision.collaborator_retries = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validation.validate()?;
        self.revision.validate()
    }
}

fn parse_env<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn default_config_validates() {
        let cfg = EngineConfig::default();
        cfg.validate().expect("default config should be valid");
        assert_eq!(cfg.revision.max_iterations, 5);
        assert_eq!(cfg.validation.psu_margin, 0.3);
        assert_eq!(cfg.validation.air_thermal_threshold_w, 250);
        assert_eq!(cfg.validation.budget_tolerance, 0.0);
        assert!(cfg.revision.max_warnings.is_none());
    }

    #[test]
    fn thermal_tiers_rise_with_cooling_type() {
        let cfg = ValidationConfig::default();
        assert!(
            cfg.thermal_threshold_w(CoolingType::Air) < cfg.thermal_threshold_w(CoolingType::Aio)
        );
        assert!(
            cfg.thermal_threshold_w(CoolingType::Aio)
                < cfg.thermal_threshold_w(CoolingType::Custom)
        );
    }

    #[test]
    fn env_overrides_apply() {
        let mut cfg = EngineConfig::default();
        cfg.apply_env(env(&[
            (ENV_MAX_ITERATIONS, "3"),
            (ENV_PSU_MARGIN, "0.2"),
            (ENV_MAX_WARNINGS, "1"),
        ]))
        .unwrap();
        assert_eq!(cfg.revision.max_iterations, 3);
        assert_eq!(cfg.validation.psu_margin, 0.2);
        assert_eq!(cfg.revision.max_warnings, Some(1));
    }

    #[test]
    fn unparsable_env_is_an_error() {
        let mut cfg = EngineConfig::default();
        let err = cfg
            .apply_env(env(&[(ENV_MAX_ITERATIONS, "five")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidEnv {
                var: ENV_MAX_ITERATIONS,
                ..
            }
        ));
    }

    #[test]
    fn zero_max_iterations_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.revision.max_iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn negative_margin_rejected() {
        let mut cfg = EngineConfig::default();
        cfg.validation.psu_margin = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: EngineConfig = toml::from_str(
            r#"
            [validation]
            psu_margin = 0.25

            [revision]
            max_warnings = 2
            "#,
        )
        .unwrap();
        assert_eq!(cfg.validation.psu_margin, 0.25);
        assert_eq!(cfg.validation.air_thermal_threshold_w, 250);
        assert_eq!(cfg.revision.max_iterations, 5);
        assert_eq!(cfg.revision.max_warnings, Some(2));
    }
}
