use mealy_core::{MealPeriod, ReconcileOutcome};
use serde_json::json;

use crate::context::{print_json, Context};

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    if let Err(e) = ctx.session.refresh().await {
        tracing::warn!("reconciling against last known schedule: {e}");
    }
    let outcome = ctx.session.reconcile().await?;
    let output = match outcome {
        ReconcileOutcome::Unchanged(period) => json!({
            "outcome": "unchanged",
            "period": period,
        }),
        ReconcileOutcome::Transitioned {
            from,
            to,
            increment_missed,
            ..
        } => json!({
            "outcome": "transitioned",
            "from": MealPeriod::label_of(from),
            "to": to,
            "incrementMissed": increment_missed,
        }),
        ReconcileOutcome::Busy => json!({ "outcome": "busy" }),
    };
    print_json(&output)?;
    ctx.finish()
}
