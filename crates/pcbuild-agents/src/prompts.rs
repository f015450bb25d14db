//! System prompts and prompt builders for each agent role.
//!
//! Prompt versioning: bump `PROMPT_VERSION` whenever preamble content changes
//! so logged replies can be traced to the prompt that produced them.

use pcbuild_core::{BuildDraft, Constraints, PlanRequest, ValidationResult};
use schemars::schema_for;

/// Prompt version. Bump on any preamble content change.
pub const PROMPT_VERSION: &str = "1.3.0";

const INTERPRETER_PREAMBLE: &str = "\
You turn a customer's description of the PC they want into structured build \
constraints.

## Rules
- Reply with ONE JSON object matching the schema below. No prose, no Markdown.
- `budget_usd` is required. If the customer gives a range, use the upper bound. \
  If they give no budget at all, reply with {\"error\": \"no budget\"}.
- `workloads` maps workload names (\"gaming\", \"video_editing\", \"ml\", \
  \"office\", \"streaming\", ...) to weights that sum to 1.0.
- Only set `form_factor`, `noise_tolerance`, `cooling_preference` or \
  `priorities` when the customer says something that implies them.
- Peripherals are only included when explicitly requested.";

const PLANNER_PREAMBLE: &str = "\
You are an experienced PC builder. You propose complete, buildable parts lists \
that respect the customer's constraints.

## Rules
- Reply with ONE JSON object matching the schema below. No prose, no Markdown.
- Always include cpu, motherboard, ram, at least one storage drive, psu, \
  cooling and chassis. Omit gpu only when the CPU has integrated graphics and \
  the workloads do not need a discrete card.
- Use real, currently sold parts with realistic USD prices and manufacturer \
  TDP, dimensions and slot counts.
- Keep the total under the budget. Size the PSU for roughly 30% headroom over \
  CPU plus GPU TDP, and list its PCIe power leads so the GPU's connectors \
  can be checked.
- When revising, change ONLY the classes listed as affected and copy every \
  other section from the previous build exactly.";

pub const CRITIC_PREAMBLE: &str = "\
You review PC builds that failed automated validation and explain to the \
customer, in two to five short sentences, what is wrong and what kind of part \
change would fix it. Address errors before warnings. Do not invent problems \
that the validation report does not mention. Plain text only.";

fn schema_json<T: schemars::JsonSchema>() -> String {
    serde_json::to_string_pretty(&schema_for!(T)).unwrap_or_default()
}

pub fn interpreter_system_prompt() -> String {
    format!(
        "{INTERPRETER_PREAMBLE}\n\n## Constraints schema\n{}",
        schema_json::<Constraints>()
    )
}

pub fn planner_system_prompt() -> String {
    format!(
        "{PLANNER_PREAMBLE}\n\n## Build schema\n{}",
        schema_json::<BuildDraft>()
    )
}

pub fn planner_user_prompt(request: &PlanRequest) -> String {
    let constraints = pretty(&request.original_constraints);
    let (Some(previous), Some(feedback)) = (&request.previous_build, &request.feedback) else {
        return format!(
            "# Build Request\n\nPropose a complete build for these constraints:\n\n{constraints}\n"
        );
    };

    let issues: Vec<String> = feedback
        .messages
        .iter()
        .map(|issue| format!("- {}: {}", issue.kind, issue.message))
        .collect();
    let affected: Vec<&str> = request
        .affected_components
        .classes()
        .iter()
        .map(|c| c.as_str())
        .collect();
    let preserve: Vec<&str> = feedback.preserve.iter().map(|c| c.as_str()).collect();

    format!(
        "# Revision Request (attempt {next})\n\n\
         The previous build failed validation.\n\n\
         ## Original Constraints\n{constraints}\n\n\
         ## Previous Build\n{previous}\n\n\
         ## Validation Issues\n{issues}\n\n\
         ## Change ONLY\n{affected}\n\n\
         ## Keep unchanged\n{preserve}\n\n\
         Return the complete revised build.\n",
        next = request.iteration + 1,
        previous = pretty(previous),
        issues = issues.join("\n"),
        affected = affected.join(", "),
        preserve = if preserve.is_empty() {
            "(nothing)".to_string()
        } else {
            preserve.join(", ")
        },
    )
}

pub fn critic_user_prompt(result: &ValidationResult) -> String {
    let lines = |verdicts: Vec<String>| {
        if verdicts.is_empty() {
            "None".to_string()
        } else {
            verdicts.join("\n")
        }
    };
    let errors = lines(
        result
            .errors()
            .map(|o| format!("- {}: {}", o.code, o.message))
            .collect(),
    );
    let warnings = lines(
        result
            .warnings()
            .map(|o| format!("- {}: {}", o.code, o.message))
            .collect(),
    );
    let metrics = result.metrics();
    format!(
        "# Validation Report\n\n## Errors\n{errors}\n\n## Warnings\n{warnings}\n\n\
         ## Metrics\n- estimated load: {}W\n- PSU: {}W ({:.1}% headroom)\n\
         - cost: ${:.2} ({:.1}% of budget)\n",
        metrics.estimated_load_w,
        metrics.psu_wattage,
        metrics.psu_headroom_pct,
        metrics.total_cost_usd,
        metrics.budget_utilisation_pct,
    )
}

fn pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
