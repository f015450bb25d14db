//! Feedback Reducer: turns a non-approved validation result into a
//! targeted revision request.
//!
//! Each failing outcome code maps to the component classes it concerns. The
//! union of those classes is the affected set the next planner call may
//! change; every other class is marked preserve.

pub mod preservation;
pub mod reducer;

pub use preservation::preservation_violations;
pub use reducer::{implicated_classes, AffectedSet, Feedback, FeedbackReducer};
