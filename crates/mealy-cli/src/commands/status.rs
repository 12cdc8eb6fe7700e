use crate::context::{print_json, Context};

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    // A stale snapshot is still worth showing.
    if let Err(e) = ctx.session.refresh().await {
        tracing::warn!("showing last known state: {e}");
    }
    let report = ctx.session.status_report().await?;
    eprintln!("{}", report.headline);
    print_json(&report)?;
    ctx.finish()
}
