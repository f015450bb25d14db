//! Per-session records and the outcome handed to the formatter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Build, StructuralFailure};
use crate::validation::ValidationResult;

use super::state_machine::TransitionRecord;

/// Terminal status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Approved,
    Exhausted,
    StructuralFailure,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approved => write!(f, "approved"),
            Self::Exhausted => write!(f, "exhausted"),
            Self::StructuralFailure => write!(f, "structural_failure"),
        }
    }
}

/// Why the session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Approved,
    IterationLimit,
    CollaboratorFailure,
    StructuralFailure,
    Cancelled,
}

/// One validation cycle.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// 1-based validation cycle.
    pub iteration: u32,
    pub build: Build,
    pub validation_result: ValidationResult,
    /// Critic narrative, when the cycle was critiqued.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Result of a finished session.
///
/// `build` and `validation_result` are the last validated pair; both are
/// absent only when the session ended before any build was validated.
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub reason: TerminationReason,
    pub build: Option<Build>,
    pub validation_result: Option<ValidationResult>,
    pub iteration_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub structural_failure: Option<StructuralFailure>,
    /// Last collaborator error, when one ended the session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub history: Vec<HistoryEntry>,
    pub transitions: Vec<TransitionRecord>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionOutcome {
    pub fn is_approved(&self) -> bool {
        self.status == SessionStatus::Approved
    }

    /// Critic narratives in iteration order.
    pub fn diagnoses(&self) -> Vec<&str> {
        self.history
            .iter()
            .filter_map(|h| h.diagnosis.as_deref())
            .collect()
    }

    pub fn summary(&self) -> String {
        let verdict = self
            .validation_result
            .as_ref()
            .map(|r| r.summary())
            .unwrap_or_else(|| "no build validated".to_string());
        format!(
            "session {} {} after {} iterations ({:?}): {}",
            self.session_id, self.status, self.iteration_count, self.reason, verdict
        )
    }
}
