//! PC Build Core Library
//!
//! This library provides the deterministic half of a PC build recommender:
//! - A Validation Engine of independent, pure compatibility rules plus a
//!   power/thermal estimator
//! - A Feedback Reducer that turns failed verdicts into targeted revision
//!   requests
//! - A bounded Revision Loop that alternates an external planner with the
//!   engine until approval or exhaustion
//!
//! Interpreting user text, proposing components, and narrating failures are
//! generative and live behind the traits in [`revision::collaborators`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use pcbuild_core::{EngineConfig, PartsCatalog, RevisionLoop, ValidationEngine};
//!
//! let config = EngineConfig::load(None)?;
//! let engine = Arc::new(ValidationEngine::new(
//!     Arc::new(PartsCatalog::builtin()),
//!     config.validation.clone(),
//! ));
//! let revision = RevisionLoop::new(engine, planner, critic, config.revision);
//! let outcome = revision.run(constraints, &CancellationToken::new()).await;
//! println!("{}", outcome.summary());
//! ```

pub mod catalog;
pub mod config;
pub mod errors;
pub mod feedback;
pub mod model;
pub mod revision;
pub mod validation;

pub use catalog::{PartsCatalog, Platform};
pub use config::{EngineConfig, RevisionConfig, ValidationConfig};
pub use errors::{CatalogError, CollaboratorError, ConfigError, RetryCategory};
pub use feedback::{AffectedSet, Feedback, FeedbackReducer};
pub use model::{Build, BuildDraft, ComponentClass, ComponentSpec, Constraints, StructuralFailure};
pub use revision::{
    interpret_with_retry, Critic, Formatter, Interpreter, JsonFormatter, PlanRequest, Planner,
    RetryPolicy, RevisionLoop, SessionOutcome, SessionStatus, TerminationReason,
};
pub use validation::{
    quick_validate, BuildRule, RuleContext, RuleOutcome, ValidationEngine, ValidationResult,
    Verdict,
};
