//! Push-based event stream consumed by the presentation layer.

use crate::stats::StatsSnapshot;
use tokio::sync::mpsc;

/// One event on the pipeline's output stream.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    /// Operator-facing log line (also mirrored into tracing).
    Log(String),
    /// Discovery progress tick: scenarios scanned out of total.
    Progress { scanned: usize, total: usize },
    /// Both activities have exited; carries the final stats.
    Done(StatsSnapshot),
}

/// Cloneable sender half of the event stream. Sends never fail loudly: a
/// dropped receiver just means nobody is watching.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<PipelineEvent>,
}

impl EventSink {
    pub fn channel() -> (EventSink, mpsc::UnboundedReceiver<PipelineEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (EventSink { tx }, rx)
    }

    /// Sink with no listener, for tests and headless use.
    pub fn disabled() -> EventSink {
        Self::channel().0
    }

    pub fn log(&self, line: impl Into<String>) {
        let _ = self.tx.send(PipelineEvent::Log(line.into()));
    }

    pub fn progress(&self, scanned: usize, total: usize) {
        let _ = self.tx.send(PipelineEvent::Progress { scanned, total });
    }

    pub fn done(&self, snapshot: StatsSnapshot) {
        let _ = self.tx.send(PipelineEvent::Done(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_order() {
        let (sink, mut rx) = EventSink::channel();
        sink.log("hello");
        sink.progress(1, 2);
        assert!(matches!(rx.recv().await, Some(PipelineEvent::Log(s)) if s == "hello"));
        assert!(matches!(
            rx.recv().await,
            Some(PipelineEvent::Progress { scanned: 1, total: 2 })
        ));
    }

    #[test]
    fn disabled_sink_swallows_events() {
        let sink = EventSink::disabled();
        sink.log("nobody listens");
    }
}
