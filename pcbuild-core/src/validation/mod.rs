//! Validation Engine: deterministic compatibility, power, thermal, and
//! budget checks over a complete [`Build`].
//!
//! Every rule is a pure function of (build, constraints, catalog, config).
//! Nothing here sees iteration history, performs I/O, or suspends, so the
//! same inputs always yield the same [`ValidationResult`] with outcomes in
//! registration order.
//!
//! # Registered rules
//!
//! ```text
//! socket_compatibility → memory_compatibility → form_factor_fit →
//! psu_headroom → thermal_risk → budget → cooling_capacity →
//! gpu_clearance → cooler_clearance → storage_connectivity →
//! display_output → memory_capacity → power_connectors →
//! psu_efficiency → memory_speed → expansion_headroom
//! ```
//!
//! The last three only ever warn.

pub mod budget;
pub mod compatibility;
pub mod engine;
pub mod power;
pub mod report;

pub use engine::{quick_validate, ValidationEngine};
pub use power::{PowerEstimate, PsuHeadroom, ThermalRisk};
pub use report::{BuildMetrics, Issue, RuleOutcome, ValidationResult, Verdict};

use crate::catalog::PartsCatalog;
use crate::config::ValidationConfig;
use crate::model::{Build, Constraints};

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub build: &'a Build,
    pub constraints: &'a Constraints,
    pub catalog: &'a PartsCatalog,
    pub config: &'a ValidationConfig,
}

/// A single registered check.
///
/// Implementations must be pure: no interior mutability, no clocks, no I/O.
pub trait BuildRule: Send + Sync {
    /// Stable identifier, used as the outcome's `rule` and as its code when
    /// the rule passes.
    fn id(&self) -> &'static str;

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome;
}
