//! Structured user intent for one session.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::component::{ChassisSize, ComponentClass, CoolingType};

/// Importance of a component class to the user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum NoiseTolerance {
    /// Quiet operation matters most.
    Low,
    #[default]
    Medium,
    /// Performance over acoustics.
    High,
}

/// Which peripherals the user wants included in the quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PeripheralFlags {
    #[serde(default)]
    pub monitor: bool,
    #[serde(default)]
    pub keyboard: bool,
    #[serde(default)]
    pub mouse: bool,
    #[serde(default)]
    pub audio: bool,
}

/// Normalized user constraints.
///
/// Produced once by the interpreter and never modified afterwards. The
/// revision loop owns it for the whole session and hands each planner
/// request its own copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Constraints {
    /// Budget ceiling in USD.
    pub budget_usd: f64,
    /// Named workloads with relative weights, e.g. {"gaming": 0.7, "ml": 0.3}.
    pub workloads: BTreeMap<String, f64>,
    /// Performance priority per component class; absent classes are `medium`.
    #[serde(default)]
    pub priorities: BTreeMap<ComponentClass, Priority>,
    #[serde(default)]
    pub form_factor: ChassisSize,
    #[serde(default)]
    pub noise_tolerance: NoiseTolerance,
    #[serde(default = "default_upgrade_horizon")]
    pub upgrade_horizon_years: u8,
    #[serde(default)]
    pub peripherals: PeripheralFlags,
    #[serde(default = "default_ram_min_gb")]
    pub ram_min_gb: u32,
    #[serde(default = "default_storage_min_tb")]
    pub storage_min_tb: f64,
    #[serde(default)]
    pub cooling_preference: Option<CoolingType>,
}

fn default_upgrade_horizon() -> u8 {
    3
}

fn default_ram_min_gb() -> u32 {
    16
}

fn default_storage_min_tb() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstraintsError {
    #[error("budget must be a positive amount, got {0}")]
    InvalidBudget(f64),

    #[error("at least one workload is required")]
    NoWorkloads,

    #[error("workload '{name}' has invalid weight {weight}")]
    InvalidWeight { name: String, weight: f64 },

    #[error("upgrade horizon must be 1-5 years, got {0}")]
    InvalidUpgradeHorizon(u8),
}

impl Constraints {
    /// Minimal constraints: a budget and one fully-weighted workload.
    pub fn new(budget_usd: f64, workload: impl Into<String>) -> Self {
        let mut workloads = BTreeMap::new();
        workloads.insert(workload.into(), 1.0);
        Self {
            budget_usd,
            workloads,
            priorities: BTreeMap::new(),
            form_factor: ChassisSize::default(),
            noise_tolerance: NoiseTolerance::default(),
            upgrade_horizon_years: default_upgrade_horizon(),
            peripherals: PeripheralFlags::default(),
            ram_min_gb: default_ram_min_gb(),
            storage_min_tb: default_storage_min_tb(),
            cooling_preference: None,
        }
    }

    pub fn with_form_factor(mut self, form_factor: ChassisSize) -> Self {
        self.form_factor = form_factor;
        self
    }

    pub fn with_priority(mut self, class: ComponentClass, priority: Priority) -> Self {
        self.priorities.insert(class, priority);
        self
    }

    pub fn priority(&self, class: ComponentClass) -> Priority {
        self.priorities.get(&class).copied().unwrap_or_default()
    }

    /// Reject constraints that no build could ever be checked against.
    pub fn validate(&self) -> Result<(), ConstraintsError> {
        if !self.budget_usd.is_finite() || self.budget_usd <= 0.0 {
            return Err(ConstraintsError::InvalidBudget(self.budget_usd));
        }
        if self.workloads.is_empty() {
            return Err(ConstraintsError::NoWorkloads);
        }
        if let Some((name, weight)) = self
            .workloads
            .iter()
            .find(|(_, w)| !w.is_finite() || **w < 0.0)
        {
            return Err(ConstraintsError::InvalidWeight {
                name: name.clone(),
                weight: *weight,
            });
        }
        if !(1..=5).contains(&self.upgrade_horizon_years) {
            return Err(ConstraintsError::InvalidUpgradeHorizon(
                self.upgrade_horizon_years,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let c: Constraints =
            serde_json::from_str(r#"{"budget_usd": 1500, "workloads": {"gaming": 1.0}}"#)
                .unwrap();
        assert_eq!(c.form_factor, ChassisSize::MidTower);
        assert_eq!(c.noise_tolerance, NoiseTolerance::Medium);
        assert_eq!(c.upgrade_horizon_years, 3);
        assert_eq!(c.priority(ComponentClass::Gpu), Priority::Medium);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_priorities_keyed_by_class() {
        let c: Constraints = serde_json::from_str(
            r#"{"budget_usd": 2000, "workloads": {"ml": 1.0},
                "priorities": {"gpu": "critical", "cpu": "low"},
                "form_factor": "mini-itx"}"#,
        )
        .unwrap();
        assert_eq!(c.priority(ComponentClass::Gpu), Priority::Critical);
        assert_eq!(c.priority(ComponentClass::Cpu), Priority::Low);
        assert_eq!(c.form_factor, ChassisSize::MiniItx);
    }

    #[test]
    fn test_validate_rejects_bad_budget() {
        let c = Constraints::new(0.0, "gaming");
        assert_eq!(c.validate(), Err(ConstraintsError::InvalidBudget(0.0)));
    }

    #[test]
    fn test_validate_rejects_negative_weight() {
        let mut c = Constraints::new(1000.0, "gaming");
        c.workloads.insert("office".into(), -1.0);
        assert!(matches!(
            c.validate(),
            Err(ConstraintsError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_horizon_out_of_range() {
        let mut c = Constraints::new(1000.0, "gaming");
        c.upgrade_horizon_years = 9;
        assert_eq!(c.validate(), Err(ConstraintsError::InvalidUpgradeHorizon(9)));
    }

    #[test]
    fn test_unknown_form_factor_fails_explicitly() {
        let result: Result<Constraints, _> = serde_json::from_str(
            r#"{"budget_usd": 1000, "workloads": {"gaming": 1.0}, "form_factor": "shoebox"}"#,
        );
        assert!(result.is_err());
    }
}
