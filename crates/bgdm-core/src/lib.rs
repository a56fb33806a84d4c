//! Core pipeline for the BGDM scenario background downloader: a discovery
//! producer and a semaphore-bounded download engine joined by a bounded batch
//! channel, with cooperative pause/stop and thread-safe statistics.

pub mod assets;
pub mod batch;
pub mod config;
pub mod control;
pub mod controller;
pub mod discovery;
pub mod engine;
pub mod event;
pub mod fetch;
pub mod logging;
pub mod report;
pub mod retry;
pub mod stats;

pub use controller::{PipelineController, PipelineState, RunOptions};
pub use discovery::{RangeSource, ScenarioSource};
pub use event::{EventSink, PipelineEvent};
pub use stats::StatsSnapshot;
