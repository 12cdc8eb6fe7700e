use mealy_core::MembershipView;
use serde::Serialize;

use crate::context::{print_json, Context};

/// End-of-period summary printed after a food-finished report.
#[derive(Serialize)]
struct FinishedSummary<'a> {
    headline: &'static str,
    missed: Vec<&'a str>,
    #[serde(flatten)]
    view: &'a MembershipView,
}

pub async fn finished(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    ctx.session.refresh_members().await?;
    let view = ctx.session.report_food_finished().await?;
    let summary = FinishedSummary {
        headline: "Food finished",
        missed: view.waiting.iter().map(|m| m.display_name.as_str()).collect(),
        view: &view,
    };
    print_json(&summary)?;
    ctx.finish()
}

pub async fn undo(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    ctx.session.refresh_members().await?;
    let view = ctx.session.undo_food_finished().await?;
    eprintln!("food-finished report undone");
    print_json(&view)?;
    ctx.finish()
}
