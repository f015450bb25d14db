//! HTTP-backed collaborators for the PC build recommender.
//!
//! Each agent implements one of the `pcbuild_core` collaborator traits on top
//! of a [`llm::ChatCompletion`] backend, which in production is an
//! OpenAI-compatible chat-completions endpoint (OpenAI or Ollama).

pub mod config;
pub mod critic;
pub mod formatter;
pub mod interpreter;
pub mod llm;
pub mod planner;
pub mod prompts;

pub use config::{LlmConfig, LlmConfigError, LlmProvider};
pub use critic::LlmCritic;
pub use formatter::TextFormatter;
pub use interpreter::{is_detailed_enough, LlmInterpreter};
pub use llm::{ChatClient, ChatCompletion, ChatRequest};
pub use planner::LlmPlanner;
