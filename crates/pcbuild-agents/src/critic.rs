//! Narrative diagnosis of failed validations.

use std::sync::Arc;

use async_trait::async_trait;
use pcbuild_core::{CollaboratorError, Critic, ValidationResult};
use tracing::info;

use crate::llm::{ChatCompletion, ChatRequest};
use crate::prompts;

const TEMPERATURE: f32 = 0.3;

pub struct LlmCritic {
    llm: Arc<dyn ChatCompletion>,
}

impl LlmCritic {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Critic for LlmCritic {
    async fn diagnose(&self, result: &ValidationResult) -> Result<String, CollaboratorError> {
        info!(
            errors = result.error_count(),
            warnings = result.warning_count(),
            "Analyzing build failure"
        );
        let request = ChatRequest {
            system: prompts::CRITIC_PREAMBLE.to_string(),
            user: prompts::critic_user_prompt(result),
            temperature: TEMPERATURE,
            json: false,
        };
        let narrative = self.llm.complete(request).await?;
        Ok(narrative.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcbuild_core::validation::{BuildMetrics, RuleOutcome};

    use crate::llm::MockChatCompletion;

    #[tokio::test]
    async fn test_critic_sends_failures_as_plain_text_request() {
        let result = ValidationResult::new(
            vec![
                RuleOutcome::error("budget", "budget_exceeded", "over by $120.00"),
                RuleOutcome::pass("psu_headroom", "ok"),
            ],
            BuildMetrics::default(),
        );

        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .withf(|req| {
                !req.json
                    && req.user.contains("budget_exceeded: over by $120.00")
                    && req.user.contains("## Warnings\nNone")
            })
            .times(1)
            .returning(|_| Ok("  The build is $120 over budget; pick a cheaper GPU.\n".into()));

        let narrative = LlmCritic::new(Arc::new(llm)).diagnose(&result).await.unwrap();
        assert_eq!(narrative, "The build is $120 over budget; pick a cheaper GPU.");
    }
}
