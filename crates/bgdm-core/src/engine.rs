//! Download engine: semaphore-bounded fan-out per batch and the channel
//! consumer loop.

use crate::batch::{Batch, BatchMessage, BatchReceiver};
use crate::fetch::{fetch_asset, FetchContext};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Exact per-batch result, independent of completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub attempted: usize,
    pub succeeded: usize,
}

/// Consumes batches and fans each out into bounded concurrent fetches. The
/// limiter is shared across batches, so a batch with hundreds of assets never
/// holds more than `concurrency` requests in flight.
pub struct DownloadEngine {
    ctx: Arc<FetchContext>,
    limiter: Arc<Semaphore>,
}

impl DownloadEngine {
    pub fn new(ctx: FetchContext, concurrency: usize) -> Self {
        Self {
            ctx: Arc::new(ctx),
            limiter: Arc::new(Semaphore::new(concurrency.max(1))),
        }
    }

    /// Launches one fetch per `(scenario, asset)` pair in the batch and waits
    /// for all of them.
    pub async fn run_batch(&self, batch: Batch) -> BatchSummary {
        let mut tasks = JoinSet::new();
        for (scenario, assets) in batch.into_entries() {
            for asset in assets {
                let ctx = Arc::clone(&self.ctx);
                let limiter = Arc::clone(&self.limiter);
                let scenario = scenario.clone();
                tasks.spawn(async move { fetch_asset(&ctx, &limiter, &scenario, &asset).await });
            }
        }

        let attempted = tasks.len();
        self.ctx
            .events
            .log(format!("[+] batch: downloading {attempted} images"));

        let mut succeeded = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) if outcome.is_success() => succeeded += 1,
                Ok(_) => {}
                Err(e) => tracing::warn!("fetch task join: {e}"),
            }
        }

        self.ctx.events.log(format!(
            "[+] batch done: {succeeded} of {attempted} succeeded"
        ));
        BatchSummary {
            attempted,
            succeeded,
        }
    }

    /// Consumer loop: processes batches until the end-of-stream sentinel.
    /// Once a stop is requested, queued batches are drained without starting
    /// any new fetch; in-flight fetches of the current batch still finish and
    /// are counted.
    pub async fn run(&self, mut rx: BatchReceiver) {
        while let Some(msg) = rx.recv().await {
            match msg {
                BatchMessage::EndOfStream => break,
                BatchMessage::Batch(batch) => {
                    if self.ctx.signals.is_stopped() {
                        self.ctx.events.log(format!(
                            "[stop] discarding queued batch of {} images",
                            batch.asset_count()
                        ));
                        continue;
                    }
                    self.run_batch(batch).await;
                }
            }
        }
        self.ctx.events.log("=== all batches finished ===");
    }
}
