use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pcbuild_agents::{
    is_detailed_enough, ChatClient, ChatCompletion, LlmConfig, LlmCritic, LlmInterpreter,
    LlmPlanner, TextFormatter,
};
use pcbuild_core::validation::Issue;
use pcbuild_core::{
    interpret_with_retry, BuildDraft, Constraints, EngineConfig, Formatter, JsonFormatter,
    PartsCatalog, RetryPolicy, RevisionLoop, ValidationEngine,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pcbuild", version, about = "Validated PC build recommendations")]
struct Cli {
    /// Engine configuration (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Parts catalog (JSON). Only the built-in platform table is used without it.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Override the revision iteration limit.
    #[arg(long, global = true)]
    max_iterations: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Turn a description into a validated build.
    Recommend {
        /// Describe the build; omit for an interactive prompt.
        #[arg(long)]
        prompt: Option<String>,

        /// Print the session outcome as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Check a build against constraints without any model calls.
    Validate {
        /// Build JSON file.
        #[arg(long)]
        build: PathBuf,

        /// Constraints JSON file.
        #[arg(long)]
        constraints: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = EngineConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(max) = cli.max_iterations {
        config.revision.max_iterations = max;
        config.validate().context("Invalid --max-iterations")?;
    }
    let catalog = match &cli.catalog {
        Some(path) => PartsCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => PartsCatalog::builtin(),
    };
    let engine = Arc::new(ValidationEngine::new(
        Arc::new(catalog),
        config.validation.clone(),
    ));

    match cli.command {
        Command::Validate { build, constraints } => validate(&engine, &build, &constraints),
        Command::Recommend { prompt, json } => recommend(engine, config, prompt, json).await,
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn validate(engine: &ValidationEngine, build: &Path, constraints: &Path) -> Result<ExitCode> {
    let draft: BuildDraft = read_json(build)?;
    let constraints: Constraints = read_json(constraints)?;
    constraints.validate().context("Invalid constraints")?;

    let wire = match engine.validate_draft(draft, &constraints) {
        Ok((_, result)) => {
            info!(verdict = %result.summary(), "Validation complete");
            serde_json::to_value(&result)?
        }
        Err(failure) => {
            let issue = Issue {
                kind: "incomplete_build".into(),
                message: failure.to_string(),
            };
            serde_json::json!({ "is_valid": false, "errors": [issue], "warnings": [] })
        }
    };
    println!("{}", serde_json::to_string_pretty(&wire)?);

    let valid = wire["is_valid"].as_bool().unwrap_or(false);
    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn recommend(
    engine: Arc<ValidationEngine>,
    config: EngineConfig,
    prompt: Option<String>,
    json: bool,
) -> Result<ExitCode> {
    let llm_config = LlmConfig::from_env().context("LLM endpoint not configured")?;
    info!(
        provider = %llm_config.provider,
        model = %llm_config.model,
        max_iterations = config.revision.max_iterations,
        "PC build recommender starting"
    );
    let llm: Arc<dyn ChatCompletion> = Arc::new(ChatClient::new(llm_config)?);

    let interpreter = LlmInterpreter::new(llm.clone());
    let policy = RetryPolicy::from_config(&config.revision);
    let revision = RevisionLoop::new(
        engine,
        Arc::new(LlmPlanner::new(llm.clone())),
        Arc::new(LlmCritic::new(llm)),
        config.revision,
    );
    let formatter: Box<dyn Formatter> = if json {
        Box::new(JsonFormatter)
    } else {
        Box::new(TextFormatter::default())
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; stopping the current session");
            on_interrupt.cancel();
        }
    });

    let session = Session {
        interpreter: &interpreter,
        policy,
        revision: &revision,
        formatter: formatter.as_ref(),
        cancel: &cancel,
    };

    if let Some(text) = prompt {
        return session.handle(&text).await;
    }

    println!("Describe your ideal PC build and I'll design one for you.");
    println!("Example: 'I need a gaming PC for $1500 that can handle 1440p'");
    println!("Type 'quit' or 'exit' to stop.\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"Your requirements: ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };
        let text = line.trim();

        if text.is_empty() {
            continue;
        }
        if matches!(text.to_ascii_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }
        if !is_detailed_enough(text) {
            println!("Please provide more details (at least 10 characters).\n");
            continue;
        }
        if let Err(e) = session.handle(text).await {
            error!(error = %e, "Failed to generate build");
            println!("\nError: {e:#}\n");
        }
    }
    println!("Goodbye!");
    Ok(ExitCode::SUCCESS)
}

struct Session<'a> {
    interpreter: &'a LlmInterpreter,
    policy: RetryPolicy,
    revision: &'a RevisionLoop,
    formatter: &'a dyn Formatter,
    cancel: &'a CancellationToken,
}

impl Session<'_> {
    async fn handle(&self, text: &str) -> Result<ExitCode> {
        let constraints = interpret_with_retry(self.interpreter, text, self.policy, self.cancel)
            .await
            .context("Could not interpret the request")?;

        let outcome = self.revision.run(constraints, self.cancel).await;
        println!("\n{}\n", self.formatter.format(&outcome));

        Ok(if outcome.is_approved() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }
}
