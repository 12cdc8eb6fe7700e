use crate::context::{print_json, Context};

/// Mark the acting member as fed.
pub async fn eat(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    ctx.session.refresh_members().await?;
    let view = ctx.session.mark_eaten().await?;
    print_json(&view)?;
    ctx.finish()
}

/// Flip the acting member's away flag.
pub async fn away(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    ctx.session.refresh_members().await?;
    let view = ctx.session.toggle_away().await?;
    if let Some(me) = ctx.session.acting_member() {
        eprintln!(
            "{} is now {}",
            me.display_name,
            if me.is_away { "away" } else { "home" }
        );
    }
    print_json(&view)?;
    ctx.finish()
}
