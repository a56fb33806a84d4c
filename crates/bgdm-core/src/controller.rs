//! Pipeline orchestration: run lifecycle, operator control surface and the
//! completion callback.
//!
//! One controller owns the control signals, the stats aggregator and the
//! batch channel for the current run, and drives discovery and the download
//! engine as two concurrent tasks. Nothing carries over between runs: every
//! `start` builds a fresh aggregator, signals and channel.

use crate::assets::AssetMapper;
use crate::batch::{batch_channel, BatchMessage, BatchSender};
use crate::config::{BgdmConfig, MAX_CONCURRENCY, MIN_CONCURRENCY};
use crate::control::ControlSignals;
use crate::discovery::{run_discovery, DiscoveryOptions, ScenarioSource};
use crate::engine::DownloadEngine;
use crate::event::EventSink;
use crate::fetch::{FetchContext, HttpOptions, PlaceholderFilter};
use crate::report;
use crate::retry::RetryPolicy;
use crate::stats::StatsAggregator;
use anyhow::{bail, Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Queued batches between discovery and the engine. Small on purpose: the
/// channel is a hand-off, not a buffer, and a full channel is what throttles
/// scanning when downloads lag.
const BATCH_CHANNEL_CAPACITY: usize = 4;

/// Lifecycle of one controller. `Stopping` drains gracefully; `Done` is
/// re-entrant (a new `start` is allowed from `Idle` and `Done`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Paused,
    Stopping,
    Done,
}

/// Per-run parameters supplied by the presentation layer.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output_dir: PathBuf,
    pub concurrency: usize,
    pub batch_size: usize,
    pub split_by_scenario: bool,
}

impl RunOptions {
    pub fn from_config(cfg: &BgdmConfig) -> Self {
        Self {
            output_dir: PathBuf::from(&cfg.output_dir),
            concurrency: cfg.clamped_concurrency(),
            batch_size: cfg.batch_size,
            split_by_scenario: cfg.split_by_scenario,
        }
    }
}

struct Run {
    state: PipelineState,
    signals: Arc<ControlSignals>,
    stats: Arc<StatsAggregator>,
    batch_tx: Option<BatchSender>,
}

struct Shared {
    config: BgdmConfig,
    events: EventSink,
    run: Mutex<Run>,
}

/// Control surface exposed to the presentation layer.
pub struct PipelineController {
    shared: Arc<Shared>,
}

impl PipelineController {
    pub fn new(config: BgdmConfig, events: EventSink) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                events,
                run: Mutex::new(Run {
                    state: PipelineState::Idle,
                    signals: Arc::new(ControlSignals::new()),
                    stats: Arc::new(StatsAggregator::new()),
                    batch_tx: None,
                }),
            }),
        }
    }

    /// Starts a run. Fails if one is already active, or if the output
    /// directory cannot be created (the one fatal error of a run).
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, opts: RunOptions, source: Arc<dyn ScenarioSource>) -> Result<()> {
        let mut run = self.shared.run.lock().unwrap();
        match run.state {
            PipelineState::Idle | PipelineState::Done => {}
            PipelineState::Running | PipelineState::Paused | PipelineState::Stopping => {
                bail!("a run is already active")
            }
        }

        let config = &self.shared.config;
        let events = self.shared.events.clone();
        let concurrency = opts.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY);
        let batch_size = opts.batch_size.max(1);

        std::fs::create_dir_all(&opts.output_dir).with_context(|| {
            format!("creating output directory {}", opts.output_dir.display())
        })?;

        let mapper = AssetMapper::new(
            &config.base_url,
            &config.asset_path_template,
            opts.output_dir.clone(),
            opts.split_by_scenario,
        )?;
        let retry = config
            .retry
            .as_ref()
            .map(RetryPolicy::from_config)
            .unwrap_or_default();

        let signals = Arc::new(ControlSignals::new());
        let stats = Arc::new(StatsAggregator::new());
        let (tx, rx) = batch_channel(BATCH_CHANNEL_CAPACITY);

        let ctx = FetchContext {
            mapper,
            http: HttpOptions {
                user_agent: config.user_agent.clone(),
                timeout: Duration::from_secs(config.request_timeout_secs),
            },
            retry,
            min_content_len: config.min_content_len,
            placeholder: PlaceholderFilter::from_config(&config.placeholder),
            signals: Arc::clone(&signals),
            stats: Arc::clone(&stats),
            events: events.clone(),
        };
        let engine = DownloadEngine::new(ctx, concurrency);

        events.log("=== run started ===");
        events.log(format!("saving to: {}", opts.output_dir.display()));
        events.log(format!(
            "concurrency: {concurrency}, {batch_size} scenarios per batch"
        ));

        let discovery_handle = tokio::spawn(run_discovery(
            source,
            DiscoveryOptions {
                batch_size,
                scan_delay: Duration::from_millis(config.scan_delay_ms),
            },
            Arc::clone(&signals),
            Arc::clone(&stats),
            events.clone(),
            tx.clone(),
        ));
        let engine_handle = tokio::spawn(async move { engine.run(rx).await });

        let shared = Arc::clone(&self.shared);
        let supervisor_stats = Arc::clone(&stats);
        let supervisor_signals = Arc::clone(&signals);
        let output_dir = opts.output_dir.clone();
        tokio::spawn(async move {
            if let Err(e) = discovery_handle.await {
                tracing::warn!("discovery task join: {e}");
            }
            if let Err(e) = engine_handle.await {
                tracing::warn!("engine task join: {e}");
            }

            let snapshot = supervisor_stats.snapshot();
            match report::write_failed_items(&output_dir, &snapshot) {
                Ok(Some(path)) => shared
                    .events
                    .log(format!("failed items written to {}", path.display())),
                Ok(None) => {}
                Err(e) => tracing::warn!("failure report not written: {e:#}"),
            }

            {
                let mut run = shared.run.lock().unwrap();
                run.state = PipelineState::Done;
                run.batch_tx = None;
            }

            if supervisor_signals.is_stopped() {
                shared.events.log("=== run stopped ===");
            }
            shared.events.log("=== download stats ===");
            shared.events.log(format!("images discovered: {}", snapshot.total));
            shared.events.log(format!("downloaded: {}", snapshot.success));
            shared.events.log(format!("failed: {}", snapshot.failed));
            for item in &snapshot.failed_items {
                shared
                    .events
                    .log(format!("  - {}/{}", item.scenario, item.asset));
            }
            shared.events.done(snapshot);
        });

        run.state = PipelineState::Running;
        run.signals = signals;
        run.stats = stats;
        run.batch_tx = Some(tx);
        Ok(())
    }

    /// Suspends the start of new scan steps and fetch attempts. Work already
    /// in flight is unaffected.
    pub fn pause(&self) {
        let mut run = self.shared.run.lock().unwrap();
        if run.state == PipelineState::Running {
            run.signals.pause();
            run.state = PipelineState::Paused;
            self.shared.events.log("[info] pause requested");
        }
    }

    pub fn resume(&self) {
        let mut run = self.shared.run.lock().unwrap();
        if run.state == PipelineState::Paused {
            run.signals.resume();
            run.state = PipelineState::Running;
            self.shared.events.log("[info] resumed");
        }
    }

    /// Requests a graceful stop: no new fetches start, queued batches are
    /// discarded, in-flight fetches finish and are counted. Also injects the
    /// end-of-stream sentinel so the engine terminates even while discovery
    /// is still mid-scan. Must be called from within a Tokio runtime.
    pub fn stop(&self) {
        let tx = {
            let mut run = self.shared.run.lock().unwrap();
            match run.state {
                PipelineState::Running | PipelineState::Paused => {}
                _ => return,
            }
            run.signals.request_stop();
            run.state = PipelineState::Stopping;
            self.shared
                .events
                .log("[info] stop requested, draining in-flight downloads");
            run.batch_tx.clone()
        };
        if let Some(tx) = tx {
            tokio::spawn(async move {
                let _ = tx.send(BatchMessage::EndOfStream).await;
            });
        }
    }

    pub fn state(&self) -> PipelineState {
        self.shared.run.lock().unwrap().state
    }

    /// Pull-on-demand stats for the current (or finished) run.
    pub fn stats_snapshot(&self) -> crate::stats::StatsSnapshot {
        self.shared.run.lock().unwrap().stats.snapshot()
    }
}
