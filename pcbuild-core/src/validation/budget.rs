use super::{BuildRule, RuleContext, RuleOutcome};

/// Estimated cost against the budget ceiling, with `budget_tolerance` of
/// grace before an overage becomes an error.
pub struct Budget;

impl BuildRule for Budget {
    fn id(&self) -> &'static str {
        "budget"
    }

    fn evaluate(&self, ctx: &RuleContext<'_>) -> RuleOutcome {
        let cost = ctx.build.estimated_cost_usd();
        let ceiling = ctx.constraints.budget_usd;
        let limit = ceiling * (1.0 + ctx.config.budget_tolerance);
        let over = cost - ceiling;

        if cost > limit {
            RuleOutcome::error(
                self.id(),
                "budget_exceeded",
                format!(
                    "estimated cost ${cost:.2} exceeds budget ${ceiling:.2} by ${over:.2} ({:.1}%)",
                    over / ceiling * 100.0
                ),
            )
        } else if cost > ceiling {
            RuleOutcome::warning(
                self.id(),
                "budget_tight",
                format!(
                    "estimated cost ${cost:.2} is ${over:.2} over budget ${ceiling:.2}, within tolerance"
                ),
            )
        } else {
            RuleOutcome::pass(
                self.id(),
                format!(
                    "estimated cost ${cost:.2} within budget ${ceiling:.2} (${:.2} spare)",
                    -over
                ),
            )
        }
    }
}
