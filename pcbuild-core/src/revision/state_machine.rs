//! Session state machine: explicit states and legal transition guards.
//!
//! The revision loop calls `advance()` to move between states. Each call
//! checks the edge against the transition table and appends a record to the
//! log, so a finished session can be replayed state by state.

use std::fmt;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// States of one revision session.
///
/// Every session starts at `Start` and ends in exactly one of `Approved`,
/// `Exhausted`, or `StructuralFailure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Start,
    /// Waiting on the planner for a candidate build.
    Planning,
    /// Running the validation engine.
    Validating,
    /// Build accepted. Terminal.
    Approved,
    /// Waiting on the critic, then reducing feedback.
    Critiquing,
    /// Recording history and preparing the next planning call.
    Revising,
    /// Iteration cap or collaborator retries spent. Terminal.
    Exhausted,
    /// Planner produced an incomplete build. Terminal.
    StructuralFailure,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Approved | Self::Exhausted | Self::StructuralFailure
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => write!(f, "Start"),
            Self::Planning => write!(f, "Planning"),
            Self::Validating => write!(f, "Validating"),
            Self::Approved => write!(f, "Approved"),
            Self::Critiquing => write!(f, "Critiquing"),
            Self::Revising => write!(f, "Revising"),
            Self::Exhausted => write!(f, "Exhausted"),
            Self::StructuralFailure => write!(f, "StructuralFailure"),
        }
    }
}

/// Legal transitions.
///
/// ```text
/// Start → Planning
/// Planning → Validating
/// Validating → Approved | Critiquing | Exhausted
/// Critiquing → Revising
/// Revising → Planning
/// ```
/// Any non-terminal state may also end in `Exhausted` or `StructuralFailure`
/// (collaborator failure, cancellation).
fn is_legal_transition(from: SessionState, to: SessionState) -> bool {
    use SessionState::*;

    if matches!(to, Exhausted | StructuralFailure) && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (Start, Planning)
            | (Planning, Validating)
            | (Validating, Approved)
            | (Validating, Critiquing)
            | (Critiquing, Revising)
            | (Revising, Planning)
    )
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: SessionState,
    pub to: SessionState,
    /// Validation cycles completed when the transition happened.
    pub iteration: u32,
    /// Milliseconds since the session started.
    pub elapsed_ms: u64,
    pub at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("illegal session transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: SessionState,
    pub to: SessionState,
}

pub struct StateMachine {
    current: SessionState,
    iteration: u32,
    created_at: Instant,
    transitions: Vec<TransitionRecord>,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: SessionState::Start,
            iteration: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
        }
    }

    pub fn current(&self) -> SessionState {
        self.current
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn set_iteration(&mut self, iteration: u32) {
        self.iteration = iteration;
    }

    pub fn advance(
        &mut self,
        to: SessionState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            iteration: self.iteration,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            at: Utc::now(),
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            iteration = self.iteration,
            "Session transition"
        );

        self.transitions.push(record);
        self.current = to;
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    pub fn into_transitions(self) -> Vec<TransitionRecord> {
        self.transitions
    }

    pub fn summary(&self) -> String {
        let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
        let mut line = format!(
            "{} → {} ({}ms, {} transitions)",
            SessionState::Start,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.transitions.len(),
        );
        if !states.is_empty() {
            line.push_str(&format!(" [{}]", states.join(" → ")));
        }
        line
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
