//! Scenario discovery: the source seam and the batch producer loop.
//!
//! The actual mechanism that locates scenarios and their assets (a rendered
//! page, an API, a naming convention) lives behind [`ScenarioSource`]; the
//! producer loop only requires that a source yields scenario names and
//! per-scenario asset keys.

use crate::batch::{Batch, BatchMessage, BatchSender};
use crate::control::ControlSignals;
use crate::event::EventSink;
use crate::stats::StatsAggregator;
use anyhow::Context;
use async_trait::async_trait;
use std::mem;
use std::sync::Arc;
use std::time::Duration;

/// Error from one discovery step. Listing failures for a single scenario are
/// logged and skipped; only a failure to list scenarios at all aborts the
/// producer (there is nothing to do without it).
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("remote listing unavailable: {0}")]
    Unavailable(String),
    #[error("scenario not understood: {0}")]
    Unparseable(String),
}

/// Collaborator that locates scenarios and their downloadable assets.
/// Implementations must be cheap to call concurrently and side-effect free
/// from the pipeline's point of view.
#[async_trait]
pub trait ScenarioSource: Send + Sync {
    /// All scenario names for this run, in scan order.
    async fn list_scenarios(&self) -> Result<Vec<String>, DiscoveryError>;

    /// Asset keys belonging to one scenario.
    async fn list_assets(&self, scenario: &str) -> Result<Vec<String>, DiscoveryError>;
}

#[derive(Debug, Clone, Copy)]
pub struct DiscoveryOptions {
    /// Scenarios per batch handed to the engine.
    pub batch_size: usize,
    /// Fixed delay between scenario scans.
    pub scan_delay: Duration,
}

/// Producer loop: scans scenarios, groups them into batches and sends them on
/// the bounded channel, then sends `EndOfStream` exactly once, on the
/// success, error and stop paths alike.
pub async fn run_discovery(
    source: Arc<dyn ScenarioSource>,
    opts: DiscoveryOptions,
    signals: Arc<ControlSignals>,
    stats: Arc<StatsAggregator>,
    events: EventSink,
    tx: BatchSender,
) {
    if let Err(e) = produce(source.as_ref(), &opts, &signals, &stats, &events, &tx).await {
        tracing::error!("discovery failed: {e:#}");
        events.log(format!("[err] discovery failed: {e:#}"));
    }
    // The engine may already be gone (stop injects its own sentinel and the
    // consumer drops the receiver); a failed send is fine then.
    let _ = tx.send(BatchMessage::EndOfStream).await;
}

async fn produce(
    source: &dyn ScenarioSource,
    opts: &DiscoveryOptions,
    signals: &ControlSignals,
    stats: &StatsAggregator,
    events: &EventSink,
    tx: &BatchSender,
) -> anyhow::Result<()> {
    let scenarios = source
        .list_scenarios()
        .await
        .context("listing scenarios")?;
    let total = scenarios.len();
    events.log(format!("[+] discovered {total} scenarios"));

    let batch_size = opts.batch_size.max(1);
    let mut batch = Batch::new();
    let mut scanned = 0usize;

    for scenario in scenarios {
        if signals.is_stopped() {
            events.log("[stop] discovery aborted");
            return Ok(());
        }
        signals.wait_if_paused().await;
        if !opts.scan_delay.is_zero() {
            tokio::time::sleep(opts.scan_delay).await;
        }

        let assets = match source.list_assets(&scenario).await {
            Ok(assets) => assets,
            Err(e) => {
                tracing::warn!(%scenario, "scan failed: {e}");
                events.log(format!("    [warn] {scenario}: {e}, skipped"));
                continue;
            }
        };

        scanned += 1;
        events.progress(scanned, total);

        if assets.is_empty() {
            events.log(format!("    [warn] {scenario}: no images, skipped"));
            continue;
        }

        stats.add_discovered(assets.len() as u64);
        events.log(format!("    [info] {scenario}: {} images", assets.len()));
        batch.push(scenario, assets);

        if batch.scenario_count() >= batch_size {
            // Blocks while the channel is full: downloads lagging throttles
            // the scan. A closed channel means the consumer is gone.
            if tx
                .send(BatchMessage::Batch(mem::take(&mut batch)))
                .await
                .is_err()
            {
                return Ok(());
            }
        }
    }

    if !batch.is_empty() {
        let _ = tx.send(BatchMessage::Batch(batch)).await;
    }
    events.log("=== scan complete ===");
    Ok(())
}

/// Network-free source enumerating numbered scenarios with the remote's
/// fixed asset naming scheme: scenario `N` carries assets
/// `bg0{N:03}{digit}.png` for each configured trailing digit.
#[derive(Debug, Clone)]
pub struct RangeSource {
    start: u32,
    end: u32,
    digits: Vec<u8>,
}

impl RangeSource {
    /// Covers `start..=end` with the full 0-9 digit set.
    pub fn new(start: u32, end: u32) -> Self {
        Self::with_digits(start, end, (0..10).collect())
    }

    pub fn with_digits(start: u32, end: u32, digits: Vec<u8>) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self { start, end, digits }
    }
}

#[async_trait]
impl ScenarioSource for RangeSource {
    async fn list_scenarios(&self) -> Result<Vec<String>, DiscoveryError> {
        Ok((self.start..=self.end)
            .map(|n| format!("scenario{n}"))
            .collect())
    }

    async fn list_assets(&self, scenario: &str) -> Result<Vec<String>, DiscoveryError> {
        let number: u32 = scenario
            .strip_prefix("scenario")
            .and_then(|rest| rest.parse().ok())
            .ok_or_else(|| DiscoveryError::Unparseable(scenario.to_string()))?;
        Ok(self
            .digits
            .iter()
            .map(|d| format!("bg0{number:03}{d}.png"))
            .collect())
    }
}
