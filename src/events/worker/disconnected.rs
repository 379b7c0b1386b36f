use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::audio::worker::WorkerState;
use crate::bot::NovaBot;
use crate::events::{HandlerModule, WorkerEvent};

pub fn module() -> HandlerModule {
    HandlerModule::worker("disconnected", |ctx, event| Box::pin(run(ctx, event)))
}

async fn run(_ctx: Arc<NovaBot>, event: WorkerEvent) -> Result<()> {
    let WorkerEvent::Disconnected { worker, reason } = event else { return Ok(()) };

    worker.set_state(WorkerState::Disconnected);
    warn!(
        "🔌 Worker `{}` desconectado: {}",
        worker.id(),
        reason.as_deref().unwrap_or("sin motivo")
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::test_bot;

    #[tokio::test]
    async fn marks_the_worker_as_disconnected() {
        let (bot, _, _) = test_bot().await;
        let worker = bot.workers.all()[0].clone();
        worker.set_state(WorkerState::Connected);

        bot.emit_worker(WorkerEvent::Disconnected { worker: worker.clone(), reason: None }).await;

        assert_eq!(worker.state(), WorkerState::Disconnected);
    }
}
