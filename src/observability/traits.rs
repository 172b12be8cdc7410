use crate::memory_writer::RunOutcome;
use std::time::Duration;

/// Events the observer can record
#[derive(Debug, Clone)]
pub enum ObserverEvent {
    MemoryWriterRunStarted {
        workspace_id: String,
        message_id: String,
    },
    MemoryWriterRunFinished {
        workspace_id: String,
        outcome: RunOutcome,
        duration: Duration,
    },
    Error {
        component: String,
        message: String,
    },
}

/// Numeric metrics
#[derive(Debug, Clone)]
pub enum ObserverMetric {
    TurnsSinceLastRun { workspace_id: String, turns: u64 },
    MemoryWriterLifecycle(MemoryWriterLifecycleSignal),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoryWriterLifecycleSignal {
    TurnCounted,
    RunScheduled,
    RunDeferredInFlight,
    CrashRecovered,
    SchedulingFailed,
}

/// Sink for memory-writer events and metrics.
pub trait Observer: Send + Sync {
    /// Record a discrete event
    fn record_event(&self, event: &ObserverEvent);

    /// Record a numeric metric
    fn record_metric(&self, metric: &ObserverMetric);

    fn record_memory_writer_lifecycle(&self, signal: MemoryWriterLifecycleSignal) {
        self.record_metric(&ObserverMetric::MemoryWriterLifecycle(signal));
    }

    /// Flush any buffered data (no-op for most backends)
    fn flush(&self) {}

    /// Human-readable name of this observer
    fn name(&self) -> &str;
}
