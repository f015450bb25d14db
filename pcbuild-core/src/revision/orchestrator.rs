//! Revision Loop: bounded plan → validate → critique → revise cycle.
//!
//! One `RevisionLoop` is shared by every session; `run` owns all per-session
//! state on its own stack, so concurrent sessions share nothing mutable.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::RevisionConfig;
use crate::errors::CollaboratorError;
use crate::feedback::{preservation_violations, FeedbackReducer};
use crate::model::{Build, Constraints, StructuralFailure};
use crate::validation::{ValidationEngine, ValidationResult};

use super::collaborators::{Critic, PlanRequest, Planner};
use super::retry::{call_with_retry, RetryPolicy};
use super::session::{HistoryEntry, SessionOutcome, SessionStatus, TerminationReason};
use super::state_machine::{SessionState, StateMachine};

pub struct RevisionLoop {
    engine: Arc<ValidationEngine>,
    planner: Arc<dyn Planner>,
    critic: Arc<dyn Critic>,
    config: RevisionConfig,
}

impl RevisionLoop {
    pub fn new(
        engine: Arc<ValidationEngine>,
        planner: Arc<dyn Planner>,
        critic: Arc<dyn Critic>,
        config: RevisionConfig,
    ) -> Self {
        Self {
            engine,
            planner,
            critic,
            config,
        }
    }

    pub fn config(&self) -> &RevisionConfig {
        &self.config
    }

    pub fn engine(&self) -> &ValidationEngine {
        &self.engine
    }

    /// Drive one session to a terminal state.
    ///
    /// Never runs more than `max_iterations` validation cycles. Collaborator
    /// failures and cancellation end the session with a status rather than
    /// an error, so one bad session cannot affect another.
    pub async fn run(&self, constraints: Constraints, cancel: &CancellationToken) -> SessionOutcome {
        let mut session = Session::start(constraints);
        let policy = RetryPolicy::from_config(&self.config);
        session.enter(SessionState::Planning, Some("session started"));
        let mut request = PlanRequest::initial(session.constraints.clone());

        loop {
            if cancel.is_cancelled() {
                return session.escalate(TerminationReason::Cancelled, None);
            }

            let build = match self.plan(&request, policy, cancel).await {
                Ok(Ok(build)) => build,
                Ok(Err(failure)) => return session.structural_failure(failure),
                Err(CollaboratorError::Cancelled) => {
                    return session.escalate(TerminationReason::Cancelled, None)
                }
                Err(err) => {
                    return session
                        .escalate(TerminationReason::CollaboratorFailure, Some(err.to_string()))
                }
            };

            if cancel.is_cancelled() {
                return session.escalate(TerminationReason::Cancelled, None);
            }

            session.enter(SessionState::Validating, None);
            let result = self.engine.validate(&build, &session.constraints);
            session.iteration += 1;
            session.sm.set_iteration(session.iteration);
            info!(
                session = %session.id,
                iteration = session.iteration,
                max_iterations = self.config.max_iterations,
                cost_usd = build.estimated_cost_usd(),
                verdict = %result.summary(),
                "Validated candidate build"
            );

            if result.is_approvable(self.config.max_warnings) {
                return session.approved(build, result);
            }
            if session.iteration >= self.config.max_iterations {
                return session.exhausted(build, result);
            }
            if cancel.is_cancelled() {
                session.record(build, result, None);
                return session.escalate(TerminationReason::Cancelled, None);
            }

            session.enter(SessionState::Critiquing, Some(&result.summary()));
            let critic = self.critic.as_ref();
            let result_ref = &result;
            let diagnosis = call_with_retry("critic", policy, cancel, move |_| {
                critic.diagnose(result_ref)
            })
            .await;
            let diagnosis = match diagnosis {
                Ok(text) => text,
                Err(err) => {
                    session.record(build, result, None);
                    return match err {
                        CollaboratorError::Cancelled => {
                            session.escalate(TerminationReason::Cancelled, None)
                        }
                        err => session.escalate(
                            TerminationReason::CollaboratorFailure,
                            Some(err.to_string()),
                        ),
                    };
                }
            };
            let feedback = FeedbackReducer.reduce(&result);

            session.enter(SessionState::Revising, None);
            let affected: Vec<&str> = feedback
                .affected
                .classes()
                .iter()
                .map(|c| c.as_str())
                .collect();
            let reason = format!("revise [{}]", affected.join(", "));
            session.record(build.clone(), result, Some(diagnosis));
            request = PlanRequest::revision(
                session.constraints.clone(),
                build,
                feedback,
                session.iteration,
            );
            session.enter(SessionState::Planning, Some(&reason));
        }
    }

    /// One planner call, with retries. The inner `Err` is a structurally
    /// incomplete build, which is never retried.
    async fn plan(
        &self,
        request: &PlanRequest,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<Result<Build, StructuralFailure>, CollaboratorError> {
        let planner = self.planner.as_ref();
        let strict = self.config.strict_preservation;

        call_with_retry("planner", policy, cancel, move |_| async move {
            let draft = planner.propose(request).await?;
            let build = match Build::try_from(draft) {
                Ok(build) => build,
                Err(failure) => return Ok(Err(failure)),
            };

            if let Some(previous) = &request.previous_build {
                let changed =
                    preservation_violations(previous, &build, &request.affected_components);
                if !changed.is_empty() {
                    if strict {
                        return Err(CollaboratorError::PreservationViolation { changed });
                    }
                    warn!(changed = ?changed, "Planner changed preserved classes");
                }
            }
            Ok(Ok(build))
        })
        .await
    }
}

/// Mutable state of one running session.
struct Session {
    id: Uuid,
    constraints: Constraints,
    sm: StateMachine,
    iteration: u32,
    history: Vec<HistoryEntry>,
    started_at: DateTime<Utc>,
}

impl Session {
    fn start(constraints: Constraints) -> Self {
        let id = Uuid::new_v4();
        info!(
            session = %id,
            budget_usd = constraints.budget_usd,
            form_factor = %constraints.form_factor,
            "Revision session starting"
        );
        Self {
            id,
            constraints,
            sm: StateMachine::new(),
            iteration: 0,
            history: Vec::new(),
            started_at: Utc::now(),
        }
    }

    fn enter(&mut self, to: SessionState, reason: Option<&str>) {
        if let Err(e) = self.sm.advance(to, reason) {
            error!(session = %self.id, error = %e, "Session state machine rejected transition");
        }
    }

    fn record(&mut self, build: Build, validation_result: ValidationResult, diagnosis: Option<String>) {
        self.history.push(HistoryEntry {
            iteration: self.iteration,
            build,
            validation_result,
            diagnosis,
            recorded_at: Utc::now(),
        });
    }

    fn approved(mut self, build: Build, result: ValidationResult) -> SessionOutcome {
        self.record(build, result, None);
        self.enter(SessionState::Approved, Some("build approved"));
        self.finish(SessionStatus::Approved, TerminationReason::Approved, None, None)
    }

    fn exhausted(mut self, build: Build, result: ValidationResult) -> SessionOutcome {
        self.record(build, result, None);
        self.enter(SessionState::Exhausted, Some("iteration limit reached"));
        self.finish(
            SessionStatus::Exhausted,
            TerminationReason::IterationLimit,
            None,
            None,
        )
    }

    fn structural_failure(mut self, failure: StructuralFailure) -> SessionOutcome {
        let reason = failure.to_string();
        self.enter(SessionState::StructuralFailure, Some(&reason));
        self.finish(
            SessionStatus::StructuralFailure,
            TerminationReason::StructuralFailure,
            Some(failure),
            None,
        )
    }

    /// Exhausted with the last validated build if there is one, otherwise a
    /// structural failure.
    fn escalate(mut self, reason: TerminationReason, error: Option<String>) -> SessionOutcome {
        let (state, status) = if self.history.is_empty() {
            (SessionState::StructuralFailure, SessionStatus::StructuralFailure)
        } else {
            (SessionState::Exhausted, SessionStatus::Exhausted)
        };
        let note = error.clone().unwrap_or_else(|| format!("{reason:?}"));
        self.enter(state, Some(&note));
        self.finish(status, reason, None, error)
    }

    fn finish(
        self,
        status: SessionStatus,
        reason: TerminationReason,
        structural_failure: Option<StructuralFailure>,
        error: Option<String>,
    ) -> SessionOutcome {
        let last = self.history.last();
        let build = last.map(|h| h.build.clone());
        let validation_result = last.map(|h| h.validation_result.clone());

        match status {
            SessionStatus::Approved => info!(
                session = %self.id,
                iterations = self.iteration,
                state_path = %self.sm.summary(),
                "Session approved"
            ),
            _ => warn!(
                session = %self.id,
                status = %status,
                reason = ?reason,
                iterations = self.iteration,
                error = error.as_deref().unwrap_or(""),
                state_path = %self.sm.summary(),
                "Session ended without approval"
            ),
        }

        SessionOutcome {
            session_id: self.id,
            status,
            reason,
            build,
            validation_result,
            iteration_count: self.iteration,
            structural_failure,
            error,
            history: self.history,
            transitions: self.sm.into_transitions(),
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
