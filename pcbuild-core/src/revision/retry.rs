//! Bounded retry around a single collaborator call.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::RevisionConfig;
use crate::errors::CollaboratorError;
use crate::model::Constraints;

use super::collaborators::Interpreter;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub timeout: Duration,
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &RevisionConfig) -> Self {
        Self {
            max_retries: config.collaborator_retries,
            timeout: Duration::from_secs(config.collaborator_timeout_secs),
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt + 1`, doubling each time.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Run `call` until it succeeds, fails with a non-retriable error, or the
/// policy's retries are spent. Each attempt is bounded by the policy timeout
/// and abandoned as soon as `cancel` fires.
pub async fn call_with_retry<T, F, Fut>(
    collaborator: &'static str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, CollaboratorError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let mut attempt = 0;
    loop {
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(CollaboratorError::Cancelled),
            timed = tokio::time::timeout(policy.timeout, call(attempt)) => match timed {
                Ok(result) => result,
                Err(_) => Err(CollaboratorError::Timeout {
                    collaborator,
                    secs: policy.timeout.as_secs(),
                }),
            },
        };

        let err = match outcome {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !err.is_retriable() || attempt >= policy.max_retries {
            return Err(err);
        }

        let backoff = policy.backoff(attempt);
        warn!(
            collaborator,
            attempt = attempt + 1,
            max_retries = policy.max_retries,
            category = %err.retry_category(),
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "Collaborator call failed, retrying"
        );
        tokio::select! {
            _ = cancel.cancelled() => return Err(CollaboratorError::Cancelled),
            _ = tokio::time::sleep(backoff) => {}
        }
        attempt += 1;
    }
}

/// Interpret a request with the timeout, retry and cancellation rules the
/// revision loop applies to its own collaborators.
pub async fn interpret_with_retry(
    interpreter: &dyn Interpreter,
    text: &str,
    policy: RetryPolicy,
    cancel: &CancellationToken,
) -> Result<Constraints, CollaboratorError> {
    call_with_retry("interpreter", policy, cancel, |_| interpreter.interpret(text)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            timeout: Duration::from_secs(5),
            base_backoff: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let p = policy(3);
        assert_eq!(p.backoff(0), Duration::from_millis(10));
        assert_eq!(p.backoff(1), Duration::from_millis(20));
        assert_eq!(p.backoff(2), Duration::from_millis(40));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = call_with_retry("planner", policy(2), &CancellationToken::new(), |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CollaboratorError::Request("connection reset".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            call_with_retry("critic", policy(1), &CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CollaboratorError::malformed("not json")) }
            })
            .await;
        assert!(matches!(result, Err(CollaboratorError::Malformed(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> =
            call_with_retry("planner", policy(5), &CancellationToken::new(), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(CollaboratorError::Fatal("401".into())) }
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let result: Result<(), _> =
            call_with_retry("planner", policy(0), &CancellationToken::new(), |_| async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Timeout {
                collaborator: "planner",
                secs: 5
            })
        ));
    }

    /// Rate-limited once, then answers; or never answers at all.
    struct FlakyInterpreter {
        calls: AtomicU32,
        hang: bool,
    }

    #[async_trait]
    impl Interpreter for FlakyInterpreter {
        async fn interpret(&self, _text: &str) -> Result<Constraints, CollaboratorError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.hang {
                std::future::pending::<()>().await;
            }
            if n == 0 {
                Err(CollaboratorError::RateLimit("HTTP 429".into()))
            } else {
                Ok(Constraints::new(1500.0, "gaming"))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_interpreter_is_retried_and_bounded() {
        let flaky = FlakyInterpreter {
            calls: AtomicU32::new(0),
            hang: false,
        };
        let constraints =
            interpret_with_retry(&flaky, "gaming pc", policy(2), &CancellationToken::new())
                .await
                .unwrap();
        assert_eq!(constraints.budget_usd, 1500.0);
        assert_eq!(flaky.calls.load(Ordering::SeqCst), 2);

        let stuck = FlakyInterpreter {
            calls: AtomicU32::new(0),
            hang: true,
        };
        let result =
            interpret_with_retry(&stuck, "gaming pc", policy(1), &CancellationToken::new()).await;
        assert!(matches!(
            result,
            Err(CollaboratorError::Timeout {
                collaborator: "interpreter",
                ..
            })
        ));
        assert_eq!(stuck.calls.load(Ordering::SeqCst), 2);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let result = interpret_with_retry(&stuck, "gaming pc", policy(3), &cancel).await;
        assert!(matches!(result, Err(CollaboratorError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let result: Result<(), _> = call_with_retry("planner", policy(3), &cancel, |_| async {
            std::future::pending::<()>().await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(CollaboratorError::Cancelled)));
    }
}
