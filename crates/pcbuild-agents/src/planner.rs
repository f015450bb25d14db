//! Build proposals from the model.

use std::sync::Arc;

use async_trait::async_trait;
use pcbuild_core::{BuildDraft, CollaboratorError, PlanRequest, Planner};
use tracing::{debug, info};

use crate::llm::{complete_json, ChatCompletion, ChatRequest};
use crate::prompts;

const TEMPERATURE: f32 = 0.4;

pub struct LlmPlanner {
    llm: Arc<dyn ChatCompletion>,
    system_prompt: String,
}

impl LlmPlanner {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self {
            llm,
            system_prompt: prompts::planner_system_prompt(),
        }
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn propose(&self, request: &PlanRequest) -> Result<BuildDraft, CollaboratorError> {
        let user = prompts::planner_user_prompt(request);
        debug!(
            iteration = request.iteration,
            affected = ?request.affected_components,
            prompt_version = prompts::PROMPT_VERSION,
            "Requesting build proposal"
        );

        let draft: BuildDraft = complete_json(
            self.llm.as_ref(),
            ChatRequest::json(&self.system_prompt, user, TEMPERATURE),
        )
        .await?;

        info!(
            iteration = request.iteration,
            cpu = draft.cpu.as_ref().map(|c| c.model.as_str()).unwrap_or("-"),
            gpu = draft.gpu.as_ref().map(|g| g.model.as_str()).unwrap_or("-"),
            "Planner proposed build"
        );
        Ok(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockChatCompletion;
    use pcbuild_core::Constraints;

    #[tokio::test]
    async fn test_partial_reply_is_a_draft_not_an_error() {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .withf(|req| req.user.contains("# Build Request") && req.temperature == TEMPERATURE)
            .times(1)
            .returning(|_| {
                Ok(r#"{"psu": {"model": "Corsair RM750e", "wattage": 750,
                        "efficiency": "80+ Gold", "modular": "full", "price_usd": 99.99}}"#
                    .to_string())
            });
        let planner = LlmPlanner::new(Arc::new(llm));

        let draft = planner
            .propose(&PlanRequest::initial(Constraints::new(1200.0, "gaming")))
            .await
            .unwrap();
        assert_eq!(draft.psu.as_ref().unwrap().wattage, 750);
        assert!(draft.cpu.is_none());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_malformed() {
        let mut llm = MockChatCompletion::new();
        llm.expect_complete()
            .returning(|_| Ok("I recommend the Ryzen 5 7600.".to_string()));
        let planner = LlmPlanner::new(Arc::new(llm));

        let err = planner
            .propose(&PlanRequest::initial(Constraints::new(1200.0, "gaming")))
            .await
            .unwrap_err();
        assert!(matches!(err, CollaboratorError::Malformed(_)));
    }
}
