use mealy_core::Poller;
use tokio::sync::broadcast::error::RecvError;

use crate::context::Context;

pub async fn run(offline: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::build(offline)?;
    let mut events = ctx.session.subscribe();
    let handle = Poller::new(ctx.session.clone(), ctx.config.poller_config()).spawn();

    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("received Ctrl+C, shutting down...");
            cancel.cancel();
        }
    });

    loop {
        match events.recv().await {
            Ok(event) => {
                println!("{}", serde_json::to_string(&event)?);
                if matches!(event, mealy_core::Event::PollerStopped { .. }) {
                    break;
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("dropped {skipped} events");
            }
            Err(RecvError::Closed) => break,
        }
    }

    handle.shutdown().await;
    ctx.finish()
}
