use super::traits::{MemoryWriterLifecycleSignal, Observer, ObserverEvent, ObserverMetric};
use tracing::{debug, info, warn};

/// Observer that forwards to `tracing`.
pub struct LogObserver;

impl LogObserver {
    pub fn new() -> Self {
        Self
    }
}

impl Observer for LogObserver {
    fn record_event(&self, event: &ObserverEvent) {
        match event {
            ObserverEvent::MemoryWriterRunStarted {
                workspace_id,
                message_id,
            } => {
                info!(workspace_id = %workspace_id, message_id = %message_id, "memory_writer.run_started");
            }
            ObserverEvent::MemoryWriterRunFinished {
                workspace_id,
                outcome,
                duration,
            } => {
                let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
                info!(
                    workspace_id = %workspace_id,
                    outcome = outcome.as_str(),
                    duration_ms = ms,
                    "memory_writer.run_finished"
                );
            }
            ObserverEvent::Error { component, message } => {
                warn!(component = %component, error = %message, "error");
            }
        }
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        match metric {
            ObserverMetric::TurnsSinceLastRun {
                workspace_id,
                turns,
            } => {
                debug!(workspace_id = %workspace_id, turns = turns, "metric.turns_since_last_run");
            }
            ObserverMetric::MemoryWriterLifecycle(signal) => {
                debug!(signal = %lifecycle_signal_name(*signal), "metric.memory_writer_lifecycle");
            }
        }
    }

    fn name(&self) -> &str {
        "log"
    }
}

fn lifecycle_signal_name(signal: MemoryWriterLifecycleSignal) -> &'static str {
    match signal {
        MemoryWriterLifecycleSignal::TurnCounted => "turn_counted",
        MemoryWriterLifecycleSignal::RunScheduled => "run_scheduled",
        MemoryWriterLifecycleSignal::RunDeferredInFlight => "run_deferred_in_flight",
        MemoryWriterLifecycleSignal::CrashRecovered => "crash_recovered",
        MemoryWriterLifecycleSignal::SchedulingFailed => "scheduling_failed",
    }
}
