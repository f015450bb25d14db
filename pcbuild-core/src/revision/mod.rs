//! Revision Loop (Orchestrator).
//!
//! ```text
//! Start → Planning → Validating → Approved
//!                        ↓
//!                   Critiquing → Revising → Planning → … → Exhausted
//! ```
//! `Approved`, `Exhausted`, and `StructuralFailure` are terminal. Planner and
//! Critic calls are the only suspension points; each is bounded by a timeout
//! and a small retry budget. [`interpret_with_retry`] applies the same bounds
//! to the interpreter call that precedes a session.

pub mod collaborators;
pub mod orchestrator;
pub mod retry;
pub mod session;
pub mod state_machine;

pub use collaborators::{Critic, Formatter, Interpreter, JsonFormatter, PlanRequest, Planner};
pub use orchestrator::RevisionLoop;
pub use retry::{call_with_retry, interpret_with_retry, RetryPolicy};
pub use session::{HistoryEntry, SessionOutcome, SessionStatus, TerminationReason};
pub use state_machine::{IllegalTransition, SessionState, StateMachine, TransitionRecord};
