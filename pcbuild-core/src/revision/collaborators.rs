//! Contracts for the generative collaborators.
//!
//! The loop only ever talks to these traits, so tests drive it with
//! deterministic stand-ins and production wires in HTTP-backed agents.

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::CollaboratorError;
use crate::feedback::{AffectedSet, Feedback};
use crate::model::{Build, BuildDraft, Constraints};
use crate::validation::ValidationResult;

use super::session::SessionOutcome;

/// What the planner is asked to do on one call.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRequest {
    pub original_constraints: Constraints,
    /// `"all"` on the first call, the reduced set afterwards.
    pub affected_components: AffectedSet,
    pub previous_build: Option<Build>,
    pub feedback: Option<Feedback>,
    /// Validation cycles completed so far.
    pub iteration: u32,
}

impl PlanRequest {
    /// First call of a session: no history, everything open.
    pub fn initial(constraints: Constraints) -> Self {
        Self {
            original_constraints: constraints,
            affected_components: AffectedSet::All,
            previous_build: None,
            feedback: None,
            iteration: 0,
        }
    }

    pub fn revision(
        constraints: Constraints,
        previous: Build,
        feedback: Feedback,
        iteration: u32,
    ) -> Self {
        Self {
            original_constraints: constraints,
            affected_components: feedback.affected.clone(),
            previous_build: Some(previous),
            feedback: Some(feedback),
            iteration,
        }
    }
}

/// Free-form text → constraints. Must fail on unparsable input rather than
/// fall back to defaults.
#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, text: &str) -> Result<Constraints, CollaboratorError>;
}

/// Proposes a candidate build. May be non-deterministic.
///
/// Expected to carry over every class outside `affected_components`
/// unchanged; the loop only checks this when strict preservation is on.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn propose(&self, request: &PlanRequest) -> Result<BuildDraft, CollaboratorError>;
}

/// Narrative diagnosis of a failed validation. Never affects control flow.
#[async_trait]
pub trait Critic: Send + Sync {
    async fn diagnose(&self, result: &ValidationResult) -> Result<String, CollaboratorError>;
}

/// Renders a finished session for the user.
pub trait Formatter: Send + Sync {
    fn format(&self, outcome: &SessionOutcome) -> String;
}

/// Pretty-printed JSON of the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format(&self, outcome: &SessionOutcome) -> String {
        serde_json::to_string_pretty(outcome)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to render outcome: {e}\"}}"))
    }
}
