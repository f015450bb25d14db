//! Rule registry and aggregation.

use std::sync::Arc;

use tracing::debug;

use crate::catalog::PartsCatalog;
use crate::config::ValidationConfig;
use crate::model::{Build, BuildDraft, Constraints, StructuralFailure};

use super::budget::Budget;
use super::compatibility::{
    CoolerClearance, CoolingCapacity, DisplayOutput, ExpansionHeadroom, FormFactorFit,
    GpuClearance, MemoryCapacity, MemoryCompatibility, MemorySpeed, SocketCompatibility,
    StorageConnectivity,
};
use super::power::{PowerConnectors, PowerEstimate, PsuEfficiency, PsuHeadroom, ThermalRisk};
use super::report::{BuildMetrics, ValidationResult};
use super::{BuildRule, RuleContext};

/// Runs every registered rule against a build.
///
/// Holds no per-session state; one engine can be shared by any number of
/// concurrent sessions.
pub struct ValidationEngine {
    catalog: Arc<PartsCatalog>,
    config: ValidationConfig,
    rules: Vec<Box<dyn BuildRule>>,
}

impl ValidationEngine {
    /// Engine with the standard rule set.
    pub fn new(catalog: Arc<PartsCatalog>, config: ValidationConfig) -> Self {
        let rules: Vec<Box<dyn BuildRule>> = vec![
            Box::new(SocketCompatibility),
            Box::new(MemoryCompatibility),
            Box::new(FormFactorFit),
            Box::new(PsuHeadroom),
            Box::new(ThermalRisk),
            Box::new(Budget),
            Box::new(CoolingCapacity),
            Box::new(GpuClearance),
            Box::new(CoolerClearance),
            Box::new(StorageConnectivity),
            Box::new(DisplayOutput),
            Box::new(MemoryCapacity),
            Box::new(PowerConnectors),
            Box::new(PsuEfficiency),
            Box::new(MemorySpeed),
            Box::new(ExpansionHeadroom),
        ];
        Self {
            catalog,
            config,
            rules,
        }
    }

    /// Register an additional rule after the existing ones.
    pub fn with_rule(mut self, rule: impl BuildRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn catalog(&self) -> &PartsCatalog {
        &self.catalog
    }

    /// Evaluate every rule, in registration order.
    pub fn validate(&self, build: &Build, constraints: &Constraints) -> ValidationResult {
        let ctx = RuleContext {
            build,
            constraints,
            catalog: &self.catalog,
            config: &self.config,
        };
        let outcomes = self.rules.iter().map(|rule| rule.evaluate(&ctx)).collect();
        let result = ValidationResult::new(outcomes, self.metrics(build, constraints));
        debug!(summary = %result.summary(), "Validated build");
        result
    }

    /// Structural check, then rule evaluation. A draft missing a required
    /// class never reaches any rule.
    pub fn validate_draft(
        &self,
        draft: BuildDraft,
        constraints: &Constraints,
    ) -> Result<(Build, ValidationResult), StructuralFailure> {
        let build = Build::try_from(draft)?;
        let result = self.validate(&build, constraints);
        Ok((build, result))
    }

    fn metrics(&self, build: &Build, constraints: &Constraints) -> BuildMetrics {
        let estimate = PowerEstimate::for_build(build, self.config.include_auxiliary_load);
        let load = estimate.load_w();
        let wattage = build.psu().wattage;
        let headroom_pct = if load == 0 {
            100.0
        } else {
            (f64::from(wattage) - f64::from(load)) / f64::from(load) * 100.0
        };
        let cost = build.estimated_cost_usd();
        BuildMetrics {
            estimated_load_w: load,
            required_psu_w: estimate.required_psu_w(self.config.psu_margin),
            psu_wattage: wattage,
            psu_headroom_pct: round1(headroom_pct),
            total_cost_usd: (cost * 100.0).round() / 100.0,
            budget_utilisation_pct: round1(cost / constraints.budget_usd * 100.0),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Validate a build outside any session, with default configuration and the
/// built-in platform table.
pub fn quick_validate(build: &Build, constraints: &Constraints) -> ValidationResult {
    ValidationEngine::new(
        Arc::new(PartsCatalog::builtin()),
        ValidationConfig::default(),
    )
    .validate(build, constraints)
}
