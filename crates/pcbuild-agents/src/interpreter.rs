//! Free-form request → [`Constraints`].

use std::sync::Arc;

use async_trait::async_trait;
use pcbuild_core::{CollaboratorError, Constraints, Interpreter};
use serde_json::Value;
use tracing::info;

use crate::llm::{complete_json, ChatCompletion, ChatRequest};
use crate::prompts;

/// Shortest request worth sending to the model.
pub const MIN_REQUEST_CHARS: usize = 10;

const TEMPERATURE: f32 = 0.3;

pub struct LlmInterpreter {
    llm: Arc<dyn ChatCompletion>,
    system_prompt: String,
}

impl LlmInterpreter {
    pub fn new(llm: Arc<dyn ChatCompletion>) -> Self {
        Self {
            llm,
            system_prompt: prompts::interpreter_system_prompt(),
        }
    }
}

/// Whether `text` says enough to interpret.
pub fn is_detailed_enough(text: &str) -> bool {
    text.trim().chars().count() >= MIN_REQUEST_CHARS
}

#[async_trait]
impl Interpreter for LlmInterpreter {
    async fn interpret(&self, text: &str) -> Result<Constraints, CollaboratorError> {
        if !is_detailed_enough(text) {
            return Err(CollaboratorError::Fatal(format!(
                "request too short: describe the build in at least {MIN_REQUEST_CHARS} characters"
            )));
        }

        let reply: Value = complete_json(
            self.llm.as_ref(),
            ChatRequest::json(&self.system_prompt, text.trim(), TEMPERATURE),
        )
        .await?;

        if let Some(reason) = reply.get("error").and_then(Value::as_str) {
            return Err(CollaboratorError::Fatal(format!(
                "could not interpret request: {reason}"
            )));
        }

        let constraints: Constraints = serde_json::from_value(reply)?;
        constraints
            .validate()
            .map_err(|e| CollaboratorError::malformed(format!("interpreted constraints: {e}")))?;

        info!(
            budget_usd = constraints.budget_usd,
            workloads = ?constraints.workloads.keys().collect::<Vec<_>>(),
            form_factor = %constraints.form_factor,
            "Interpreted build request"
        );
        Ok(constraints)
    }
}
