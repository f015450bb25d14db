use std::collections::BTreeSet;

use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};

use crate::model::ComponentClass;
use crate::validation::{Issue, ValidationResult, Verdict};

/// Component classes a revision is allowed to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AffectedSet {
    /// Full re-plan: the first planning call of a session.
    All,
    Only(BTreeSet<ComponentClass>),
}

impl AffectedSet {
    pub fn of(classes: &[ComponentClass]) -> Self {
        Self::Only(classes.iter().copied().collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn contains(&self, class: ComponentClass) -> bool {
        match self {
            Self::All => true,
            Self::Only(set) => set.contains(&class),
        }
    }

    /// Affected classes in canonical order.
    pub fn classes(&self) -> Vec<ComponentClass> {
        ComponentClass::ALL
            .iter()
            .copied()
            .filter(|c| self.contains(*c))
            .collect()
    }

    /// Classes that must be carried over unchanged.
    pub fn preserved(&self) -> Vec<ComponentClass> {
        ComponentClass::ALL
            .iter()
            .copied()
            .filter(|c| !self.contains(*c))
            .collect()
    }

    pub fn union(self, other: AffectedSet) -> AffectedSet {
        match (self, other) {
            (Self::Only(mut a), Self::Only(b)) => {
                a.extend(b);
                Self::Only(a)
            }
            _ => Self::All,
        }
    }
}

/// Serialized as `"all"` or a list of class names.
impl Serialize for AffectedSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("all"),
            Self::Only(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for class in set {
                    seq.serialize_element(class)?;
                }
                seq.end()
            }
        }
    }
}

/// Fixed code → class table. Unrecognised codes implicate everything.
pub fn implicated_classes(code: &str) -> AffectedSet {
    use ComponentClass::*;

    match code {
        "socket_mismatch" => AffectedSet::of(&[Cpu, Motherboard]),
        "ram_type_mismatch" => AffectedSet::of(&[Ram, Motherboard]),
        "form_factor_mismatch" => AffectedSet::of(&[Motherboard, Chassis]),
        "insufficient_psu" | "psu_headroom_low" => AffectedSet::of(&[Psu]),
        "thermal_risk" | "cooling_insufficient" => AffectedSet::of(&[Cooling]),
        "budget_exceeded" | "budget_tight" => AffectedSet::of(&[Cpu, Gpu, Peripheral]),
        "gpu_too_long" => AffectedSet::of(&[Gpu, Chassis]),
        "cooler_too_tall" | "radiator_not_supported" => AffectedSet::of(&[Cooling, Chassis]),
        "insufficient_m2_slots" | "insufficient_sata_ports" => {
            AffectedSet::of(&[Storage, Motherboard])
        }
        "missing_gpu" => AffectedSet::of(&[Gpu]),
        "ram_capacity_exceeded" | "insufficient_ram_slots" => AffectedSet::of(&[Ram, Motherboard]),
        "missing_power_connectors" => AffectedSet::of(&[Gpu, Psu]),
        "power_connectors_unverified" | "efficiency_suboptimal" => AffectedSet::of(&[Psu]),
        "tight_fit" => AffectedSet::of(&[Gpu, Cooling, Chassis]),
        "clearance_minimal" => AffectedSet::of(&[Cooling, Chassis]),
        "ram_speed_mismatch" => AffectedSet::of(&[Ram]),
        "no_spare_slots" => AffectedSet::of(&[Gpu, Motherboard, Ram, Storage]),
        _ => AffectedSet::All,
    }
}

/// Targeted revision instruction for the planner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    /// Error codes, in rule registration order.
    pub errors: Vec<String>,
    /// Warning codes, in rule registration order.
    pub warnings: Vec<String>,
    /// Human-readable detail for every non-passing outcome.
    pub messages: Vec<Issue>,
    /// Classes the planner may change. Sent at the top level of a
    /// `PlanRequest`, not inside the feedback object.
    #[serde(skip)]
    pub affected: AffectedSet,
    /// Classes the planner must carry over unchanged.
    pub preserve: Vec<ComponentClass>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackReducer;

impl FeedbackReducer {
    pub fn reduce(&self, result: &ValidationResult) -> Feedback {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut messages = Vec::new();
        let mut affected: Option<AffectedSet> = None;

        for outcome in result.outcomes() {
            match outcome.verdict {
                Verdict::Pass => continue,
                Verdict::Error => errors.push(outcome.code.clone()),
                Verdict::Warning => warnings.push(outcome.code.clone()),
            }
            messages.push(Issue {
                kind: outcome.code.clone(),
                message: outcome.message.clone(),
            });
            let implicated = implicated_classes(&outcome.code);
            affected = Some(match affected {
                Some(acc) => acc.union(implicated),
                None => implicated,
            });
        }

        // Nothing to target means nothing to preserve either.
        let affected = affected.unwrap_or(AffectedSet::All);
        let preserve = affected.preserved();
        Feedback {
            errors,
            warnings,
            messages,
            affected,
            preserve,
        }
    }
}
