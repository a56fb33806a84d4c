//! Batch hand-off between the discovery producer and the download engine.
//!
//! The channel message is an explicit enum rather than a nullable batch, so
//! the consumer matches the terminal case exhaustively. The sentinel is sent
//! exactly once per run, strictly after the last batch.

use tokio::sync::mpsc;

/// A group of scenarios with their asset keys, produced once by discovery and
/// consumed exactly once by the engine. Scenarios are unique within a batch
/// (discovery groups consecutive distinct scenarios) and the whole value is
/// immutable after it is placed on the channel.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Batch {
    entries: Vec<(String, Vec<String>)>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a scenario with its asset keys. The caller is responsible for
    /// not pushing the same scenario twice.
    pub fn push(&mut self, scenario: String, assets: Vec<String>) {
        self.entries.push((scenario, assets));
    }

    pub fn entries(&self) -> &[(String, Vec<String>)] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<(String, Vec<String>)> {
        self.entries
    }

    pub fn scenario_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of assets across all scenarios in the batch.
    pub fn asset_count(&self) -> usize {
        self.entries.iter().map(|(_, assets)| assets.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Message on the batch channel: either work or the end-of-stream sentinel.
#[derive(Debug)]
pub enum BatchMessage {
    Batch(Batch),
    EndOfStream,
}

pub type BatchSender = mpsc::Sender<BatchMessage>;
pub type BatchReceiver = mpsc::Receiver<BatchMessage>;

/// Bounded FIFO hand-off. A full channel blocks the producer, which is the
/// backpressure that throttles discovery when downloads lag.
pub fn batch_channel(capacity: usize) -> (BatchSender, BatchReceiver) {
    mpsc::channel(capacity.max(1))
}
