//! Validation Result: aggregated rule outcomes for one build.

use serde::{Deserialize, Serialize};

/// Verdict of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Pass,
    Warning,
    Error,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "FAIL"),
        }
    }
}

/// Outcome of one rule on one build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Registered rule id, e.g. `psu_headroom`.
    pub rule: String,
    pub verdict: Verdict,
    /// Outcome code, e.g. `psu_headroom_low`. Equal to `rule` on pass.
    pub code: String,
    pub message: String,
}

impl RuleOutcome {
    pub fn pass(rule: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            verdict: Verdict::Pass,
            code: rule.to_string(),
            message: message.into(),
        }
    }

    pub fn warning(rule: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            verdict: Verdict::Warning,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn error(rule: &str, code: &str, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            verdict: Verdict::Error,
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn is_pass(&self) -> bool {
        self.verdict == Verdict::Pass
    }
}

/// Quantities computed while validating, reported alongside the verdicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildMetrics {
    pub estimated_load_w: u32,
    pub required_psu_w: f64,
    pub psu_wattage: u32,
    /// (wattage - load) / load, as a percentage.
    pub psu_headroom_pct: f64,
    pub total_cost_usd: f64,
    pub budget_utilisation_pct: f64,
}

/// One error or warning in the wire shape: `{type, message}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

/// Wire shape consumed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResultWire {
    pub is_valid: bool,
    pub errors: Vec<Issue>,
    pub warnings: Vec<Issue>,
    pub metrics: BuildMetrics,
}

/// Aggregate of every rule outcome for one build.
///
/// Serializes as [`ValidationResultWire`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "ValidationResultWire")]
pub struct ValidationResult {
    outcomes: Vec<RuleOutcome>,
    metrics: BuildMetrics,
}

impl ValidationResult {
    pub fn new(outcomes: Vec<RuleOutcome>, metrics: BuildMetrics) -> Self {
        Self { outcomes, metrics }
    }

    /// True iff no rule produced an error.
    pub fn is_valid(&self) -> bool {
        !self.outcomes.iter().any(|o| o.verdict == Verdict::Error)
    }

    /// Valid, and carrying no more warnings than `max_warnings` allows.
    pub fn is_approvable(&self, max_warnings: Option<usize>) -> bool {
        self.is_valid() && max_warnings.map_or(true, |max| self.warning_count() <= max)
    }

    /// All outcomes in registration order, passes included.
    pub fn outcomes(&self) -> &[RuleOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, rule: &str) -> Option<&RuleOutcome> {
        self.outcomes.iter().find(|o| o.rule == rule)
    }

    pub fn errors(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.verdict == Verdict::Warning)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn metrics(&self) -> &BuildMetrics {
        &self.metrics
    }

    pub fn to_wire(&self) -> ValidationResultWire {
        let issue = |o: &RuleOutcome| Issue {
            kind: o.code.clone(),
            message: o.message.clone(),
        };
        ValidationResultWire {
            is_valid: self.is_valid(),
            errors: self.errors().map(issue).collect(),
            warnings: self.warnings().map(issue).collect(),
            metrics: self.metrics.clone(),
        }
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let failing: Vec<&str> = self
            .outcomes
            .iter()
            .filter(|o| !o.is_pass())
            .map(|o| o.code.as_str())
            .collect();
        let mut line = format!(
            "{}: {} errors, {} warnings, {}/{} rules passed",
            if self.is_valid() { "VALID" } else { "INVALID" },
            self.error_count(),
            self.warning_count(),
            self.outcomes.len() - failing.len(),
            self.outcomes.len(),
        );
        if !failing.is_empty() {
            line.push_str(&format!(" [{}]", failing.join(", ")));
        }
        line
    }
}

impl From<ValidationResult> for ValidationResultWire {
    fn from(result: ValidationResult) -> Self {
        result.to_wire()
    }
}
