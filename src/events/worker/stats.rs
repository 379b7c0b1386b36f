use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::bot::NovaBot;
use crate::events::{HandlerModule, WorkerEvent};

pub fn module() -> HandlerModule {
    HandlerModule::worker("stats", |ctx, event| Box::pin(run(ctx, event)))
}

async fn run(_ctx: Arc<NovaBot>, event: WorkerEvent) -> Result<()> {
    let WorkerEvent::Stats { worker, stats } = event else { return Ok(()) };

    worker.set_stats(stats);
    debug!(
        "📊 Worker `{}`: {}/{} players activos",
        worker.id(),
        stats.playing_players,
        stats.players
    );

    Ok(())
}
