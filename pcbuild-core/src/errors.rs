//! Error taxonomy for the core crate.
//!
//! Rule-level errors and warnings are not Rust errors: they are data inside a
//! `ValidationResult`. The types here cover what can go wrong around the
//! engine: loading configuration and catalogs, and talking to collaborators.
//!
//! ## Collaborator failure categories
//!
//! | Category     | Retriable |
//! |--------------|-----------|
//! | Transient    | yes       |
//! | RateLimit    | yes       |
//! | Malformed    | yes       |
//! | Preservation | yes       |
//! | Fatal        | no        |
//! | Cancelled    | no        |

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::ComponentClass;

/// Classification the revision loop uses to decide whether to retry a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryCategory {
    /// Network failure or timeout.
    Transient,
    /// Backend asked us to slow down.
    RateLimit,
    /// Output could not be parsed into the expected shape.
    Malformed,
    /// Planner changed classes it was told to keep.
    Preservation,
    /// Misconfiguration or rejected credentials.
    Fatal,
    Cancelled,
}

impl RetryCategory {
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            Self::Transient | Self::RateLimit | Self::Malformed | Self::Preservation
        )
    }
}

impl fmt::Display for RetryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::RateLimit => write!(f, "rate_limit"),
            Self::Malformed => write!(f, "malformed"),
            Self::Preservation => write!(f, "preservation"),
            Self::Fatal => write!(f, "fatal"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Failure of one Interpreter, Planner, or Critic call.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{collaborator} timed out after {secs}s")]
    Timeout {
        collaborator: &'static str,
        secs: u64,
    },

    #[error("request failed: {0}")]
    Request(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("malformed output: {0}")]
    Malformed(String),

    #[error("planner changed preserved classes: {}", join_classes(.changed))]
    PreservationViolation { changed: Vec<ComponentClass> },

    #[error("unrecoverable: {0}")]
    Fatal(String),

    #[error("cancelled")]
    Cancelled,
}

fn join_classes(classes: &[ComponentClass]) -> String {
    classes
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl CollaboratorError {
    pub fn retry_category(&self) -> RetryCategory {
        match self {
            Self::Timeout { .. } | Self::Request(_) => RetryCategory::Transient,
            Self::RateLimit(_) => RetryCategory::RateLimit,
            Self::Malformed(_) => RetryCategory::Malformed,
            Self::PreservationViolation { .. } => RetryCategory::Preservation,
            Self::Fatal(_) => RetryCategory::Fatal,
            Self::Cancelled => RetryCategory::Cancelled,
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.retry_category().is_retriable()
    }

    pub fn malformed(detail: impl fmt::Display) -> Self {
        Self::Malformed(detail.to_string())
    }
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("environment variable {var}={value:?} is not valid")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("catalog is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog section '{section}' entry {index}: {reason}")]
    Entry {
        section: String,
        index: usize,
        reason: String,
    },

    #[error("unknown catalog section '{0}'")]
    UnknownSection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_retriable() {
        let err = CollaboratorError::Timeout {
            collaborator: "planner",
            secs: 30,
        };
        assert!(err.is_retriable());
        assert_eq!(err.retry_category(), RetryCategory::Transient);
        assert_eq!(err.to_string(), "planner timed out after 30s");
    }

    #[test]
    fn malformed_json_is_retriable() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: CollaboratorError = json_err.into();
        assert_eq!(err.retry_category(), RetryCategory::Malformed);
        assert!(err.is_retriable());
    }

    #[test]
    fn fatal_and_cancelled_are_terminal() {
        assert!(!CollaboratorError::Fatal("401 unauthorized".into()).is_retriable());
        assert!(!CollaboratorError::Cancelled.is_retriable());
    }

    #[test]
    fn preservation_violation_lists_classes() {
        let err = CollaboratorError::PreservationViolation {
            changed: vec![ComponentClass::Gpu, ComponentClass::Ram],
        };
        assert!(err.is_retriable());
        assert_eq!(
            err.to_string(),
            "planner changed preserved classes: gpu, ram"
        );
    }
}
