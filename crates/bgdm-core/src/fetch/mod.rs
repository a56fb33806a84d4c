//! Per-asset fetch unit: existence short-circuit, semaphore-bounded GET,
//! pause-aware retry loop, and stats recording.
//!
//! A fetch never escapes as `Err`: every terminal state is a [`FetchOutcome`]
//! and has already been recorded in the stats aggregator when it returns.

mod error;
mod http;

pub use error::FetchError;
pub use http::{get_bytes, HttpOptions};

use crate::assets::AssetMapper;
use crate::config::PlaceholderConfig;
use crate::control::ControlSignals;
use crate::event::EventSink;
use crate::retry::RetryPolicy;
use crate::stats::StatsAggregator;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Result of one asset's full attempt sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// File written, or already present on disk.
    Success {
        /// True when the existence check short-circuited (no network call).
        already_present: bool,
    },
    /// Attempts exhausted or placeholder hit; recorded in the failed list.
    Failed,
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }
}

/// Placeholder-body filter compiled from config.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderFilter {
    sizes: HashSet<u64>,
    sha256: HashSet<String>,
}

impl PlaceholderFilter {
    pub fn from_config(cfg: &PlaceholderConfig) -> Self {
        Self {
            sizes: cfg.sizes.iter().copied().collect(),
            sha256: cfg.sha256.iter().map(|h| h.to_ascii_lowercase()).collect(),
        }
    }

    /// True when the body is a known "missing asset" response. The size check
    /// is free; the hash is only computed when hash entries are configured.
    pub fn matches(&self, body: &[u8]) -> bool {
        if self.sizes.contains(&(body.len() as u64)) {
            return true;
        }
        if self.sha256.is_empty() {
            return false;
        }
        let digest = hex::encode(Sha256::digest(body));
        self.sha256.contains(&digest)
    }
}

/// Immutable per-run context shared by every fetch task.
#[derive(Debug)]
pub struct FetchContext {
    pub mapper: AssetMapper,
    pub http: HttpOptions,
    pub retry: RetryPolicy,
    pub min_content_len: u64,
    pub placeholder: PlaceholderFilter,
    pub signals: Arc<ControlSignals>,
    pub stats: Arc<StatsAggregator>,
    pub events: EventSink,
}

/// Downloads one asset. See module docs for the state machine; the semaphore
/// permit is the sole backpressure bounding in-flight requests and is held
/// for the whole attempt sequence.
pub async fn fetch_asset(
    ctx: &FetchContext,
    limiter: &Arc<Semaphore>,
    scenario: &str,
    asset: &str,
) -> FetchOutcome {
    let dest = ctx.mapper.dest_path(scenario, asset);
    if dest.exists() {
        ctx.events
            .log(format!("    [skip] {scenario}/{asset} already on disk"));
        ctx.stats.add_success();
        return FetchOutcome::Success {
            already_present: true,
        };
    }

    let url = match ctx.mapper.url_for(scenario, asset) {
        Ok(url) => url.to_string(),
        Err(e) => {
            // Bad mapping can never succeed on retry.
            tracing::warn!(scenario, asset, "asset URL mapping failed: {e:#}");
            ctx.events
                .log(format!("    [err] {scenario}/{asset}: unmappable asset"));
            ctx.stats.add_failure(scenario, asset);
            return FetchOutcome::Failed;
        }
    };

    let _permit = match Arc::clone(limiter).acquire_owned().await {
        Ok(permit) => permit,
        // Closed semaphore means the run is being torn down.
        Err(_) => return FetchOutcome::Failed,
    };

    let mut attempt = 1u32;
    loop {
        ctx.signals.wait_if_paused().await;

        let err = match attempt_once(ctx, &url, &dest).await {
            Ok(()) => {
                ctx.events
                    .log(format!("    [dl] {scenario}/{asset}  <- {url}"));
                ctx.stats.add_success();
                return FetchOutcome::Success {
                    already_present: false,
                };
            }
            Err(e) => e,
        };

        if err.is_terminal() {
            tracing::info!(scenario, asset, "skipping: {err}");
            ctx.events
                .log(format!("    [skip] {scenario}/{asset}: {err}"));
            ctx.stats.add_failure(scenario, asset);
            return FetchOutcome::Failed;
        }

        match ctx.retry.next_delay(attempt) {
            Some(delay) => {
                tracing::debug!(scenario, asset, attempt, "fetch failed: {err}");
                ctx.events.log(format!(
                    "    [warn] {scenario}/{asset} failed: {err} (attempt {attempt}/{})",
                    ctx.retry.max_attempts
                ));
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            None => {
                tracing::warn!(scenario, asset, "giving up after {attempt} attempts: {err}");
                ctx.events.log(format!(
                    "    [err] {scenario}/{asset} failed after {attempt} attempts"
                ));
                ctx.stats.add_failure(scenario, asset);
                return FetchOutcome::Failed;
            }
        }
    }
}

/// One GET plus validation plus persist. Any `Err` is a failed attempt.
async fn attempt_once(ctx: &FetchContext, url: &str, dest: &Path) -> Result<(), FetchError> {
    let body = {
        let url = url.to_string();
        let opts = ctx.http.clone();
        match tokio::task::spawn_blocking(move || get_bytes(&url, &opts)).await {
            Ok(result) => result?,
            Err(join_err) => {
                return Err(FetchError::Storage(std::io::Error::other(
                    join_err.to_string(),
                )))
            }
        }
    };

    if ctx.placeholder.matches(&body) {
        return Err(FetchError::Placeholder { size: body.len() });
    }
    if (body.len() as u64) < ctx.min_content_len {
        return Err(FetchError::Undersized(body.len()));
    }

    // Lazy, idempotent directory creation on first write.
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(FetchError::Storage)?;
    }
    tokio::fs::write(dest, &body)
        .await
        .map_err(FetchError::Storage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_filter_matches_size() {
        let filter = PlaceholderFilter::from_config(&PlaceholderConfig {
            sizes: vec![4],
            sha256: vec![],
        });
        assert!(filter.matches(b"abcd"));
        assert!(!filter.matches(b"abcde"));
    }

    #[test]
    fn placeholder_filter_matches_hash_case_insensitively() {
        let digest = hex::encode(Sha256::digest(b"missing"));
        let filter = PlaceholderFilter::from_config(&PlaceholderConfig {
            sizes: vec![],
            sha256: vec![digest.to_ascii_uppercase()],
        });
        assert!(filter.matches(b"missing"));
        assert!(!filter.matches(b"present"));
    }

    #[test]
    fn empty_filter_matches_nothing() {
        let filter = PlaceholderFilter::default();
        assert!(!filter.matches(b""));
        assert!(!filter.matches(b"anything"));
    }
}
