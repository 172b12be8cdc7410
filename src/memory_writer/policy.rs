use super::collaborators::{
    HistoryService, MemoryWriterTask, MemoryWriterTaskRequest, ModelFactory, ProviderOptions,
    RuntimeConfig,
};
use super::model::resolve_memory_writer_model;
use super::state::{MemoryWriterSchedulingState, SchedulingStateStore};
use crate::config::{Config, ConfigLoader};
use crate::error::MemoryWriterError;
use crate::observability::{
    MemoryWriterLifecycleSignal, Observer, ObserverEvent, ObserverMetric, create_observer,
};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Upper bound on a single summarization run.
pub const MEMORY_WRITER_TIMEOUT: Duration = Duration::from_secs(10);

/// What the chat pipeline knows about a turn that just finished streaming.
#[derive(Debug, Clone)]
pub struct MemoryWriterStreamContext {
    pub workspace_id: String,
    pub message_id: String,
    pub workspace_name: String,
    pub project_path: PathBuf,
    pub runtime_config: RuntimeConfig,
    /// Set for sub-agent workspaces, which never run the memory writer.
    pub parent_workspace_id: Option<String>,
    /// The workspace's current `provider:model`.
    pub model_string: Option<String>,
    pub provider_options: ProviderOptions,
    pub system1_enabled: bool,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No model could be resolved or created.
    Skipped,
    NoWrite,
    Wrote,
    TimedOut,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::NoWrite => "no_write",
            Self::Wrote => "wrote",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }
}

/// Collaborators and knobs for a [`MemoryWriterPolicy`].
pub struct MemoryWriterDeps {
    pub config: Arc<dyn ConfigLoader>,
    pub history: Arc<dyn HistoryService>,
    pub state_store: Arc<dyn SchedulingStateStore>,
    pub models: Arc<dyn ModelFactory>,
    pub task: Arc<dyn MemoryWriterTask>,
    pub observer: Arc<dyn Observer>,
    pub timeout: Duration,
    /// Cancelling this aborts every in-flight run (e.g. on shutdown).
    pub abort: CancellationToken,
}

impl MemoryWriterDeps {
    pub fn new(
        config: Arc<dyn ConfigLoader>,
        history: Arc<dyn HistoryService>,
        state_store: Arc<dyn SchedulingStateStore>,
        models: Arc<dyn ModelFactory>,
        task: Arc<dyn MemoryWriterTask>,
    ) -> Self {
        let observer = create_observer(&config.load_config_or_default().observability);
        Self {
            config,
            history,
            state_store,
            models,
            task,
            observer,
            timeout: MEMORY_WRITER_TIMEOUT,
            abort: CancellationToken::new(),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_abort_token(mut self, abort: CancellationToken) -> Self {
        self.abort = abort;
        self
    }
}

struct InFlightRun {
    run_id: u64,
    done: watch::Receiver<bool>,
}

struct PolicyInner {
    deps: MemoryWriterDeps,
    queues: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    states: Mutex<HashMap<String, MemoryWriterSchedulingState>>,
    in_flight: Mutex<HashMap<String, InFlightRun>>,
    next_run_id: AtomicU64,
}

/// Decides, after every assistant turn, whether to kick off a background
/// run that distills the conversation into project memory.
///
/// Per workspace: every `memory_writer_interval_messages` turns start one
/// run; at most one run is in flight; turns that land during a run are
/// counted but never start a second one. Nothing here ever fails the chat
/// turn that triggered it.
#[derive(Clone)]
pub struct MemoryWriterPolicy {
    inner: Arc<PolicyInner>,
}

impl MemoryWriterPolicy {
    pub fn new(deps: MemoryWriterDeps) -> Self {
        Self {
            inner: Arc::new(PolicyInner {
                deps,
                queues: Mutex::new(HashMap::new()),
                states: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                next_run_id: AtomicU64::new(1),
            }),
        }
    }

    /// Count the turn and maybe start a run. Returns once the decision is
    /// persisted; the run itself continues in the background.
    pub async fn on_assistant_stream_end(&self, ctx: MemoryWriterStreamContext) {
        if !ctx.system1_enabled {
            tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer skipped: system1 disabled");
            return;
        }
        if ctx.parent_workspace_id.is_some() {
            tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer skipped: child workspace");
            return;
        }
        let config = self.inner.deps.config.load_config_or_default();
        let Some(interval) = config.task_settings.memory_writer_interval() else {
            tracing::debug!(
                workspace_id = %ctx.workspace_id,
                interval = ?config.task_settings.memory_writer_interval_messages,
                "memory writer skipped: interval not configured"
            );
            return;
        };

        let inner = &self.inner;
        let workspace_id = ctx.workspace_id.clone();
        inner
            .with_workspace_queue(&workspace_id, false, || {
                inner.schedule_turn(&ctx, interval, &config)
            })
            .await;
    }

    /// Wait until the workspace has no run in flight.
    pub async fn wait_for_idle(&self, workspace_id: &str) {
        let done = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(workspace_id)
            .map(|run| run.done.clone());
        if let Some(mut done) = done {
            // A dropped sender means the run task is gone; either way it is idle.
            let _ = done.wait_for(|finished| *finished).await;
        }
    }

    /// Last state this policy loaded or wrote for `workspace_id`.
    pub fn scheduling_state(&self, workspace_id: &str) -> Option<MemoryWriterSchedulingState> {
        self.inner
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(workspace_id)
            .cloned()
    }

    pub fn is_run_in_flight(&self, workspace_id: &str) -> bool {
        self.inner.is_in_flight(workspace_id)
    }
}

impl PolicyInner {
    fn queue_for(&self, workspace_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues
            .entry(workspace_id.to_owned())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }

    /// Run `op` with the workspace's queue held. Failures are logged at debug
    /// and replaced by `fallback`.
    async fn with_workspace_queue<T>(
        &self,
        workspace_id: &str,
        fallback: T,
        op: impl FnOnce() -> Result<T>,
    ) -> T {
        let queue = self.queue_for(workspace_id);
        let _guard = queue.lock().await;
        match op() {
            Ok(value) => value,
            Err(error) => {
                tracing::debug!(
                    workspace_id = %workspace_id,
                    error = %format!("{error:#}"),
                    "memory writer scheduling step failed"
                );
                self.deps
                    .observer
                    .record_memory_writer_lifecycle(MemoryWriterLifecycleSignal::SchedulingFailed);
                fallback
            }
        }
    }

    fn is_in_flight(&self, workspace_id: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(workspace_id)
    }

    fn load_state(&self, workspace_id: &str) -> Result<MemoryWriterSchedulingState> {
        let cached = self
            .states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(workspace_id)
            .cloned();
        if let Some(state) = cached {
            return Ok(state);
        }
        let state = self
            .deps
            .state_store
            .load(workspace_id)
            .context("loading memory writer state")?
            .unwrap_or_default();
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(workspace_id.to_owned(), state.clone());
        Ok(state)
    }

    /// Durable first, then the cache, so the cache never runs ahead of disk.
    fn persist_state(&self, workspace_id: &str, state: MemoryWriterSchedulingState) -> Result<()> {
        self.deps
            .state_store
            .save(workspace_id, &state)
            .context("saving memory writer state")?;
        self.deps.observer.record_metric(&ObserverMetric::TurnsSinceLastRun {
            workspace_id: workspace_id.to_owned(),
            turns: state.turns_since_last_run,
        });
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(workspace_id.to_owned(), state);
        Ok(())
    }

    /// One turn's read-modify-write. Returns whether a run was started.
    fn schedule_turn(
        self: &Arc<Self>,
        ctx: &MemoryWriterStreamContext,
        interval: u64,
        config: &Config,
    ) -> Result<bool> {
        let workspace_id = ctx.workspace_id.as_str();
        let mut state = self.load_state(workspace_id)?;
        let in_flight = self.is_in_flight(workspace_id);

        // A started-but-never-completed run with nothing in flight here means
        // the process died mid-run: make this turn trigger a fresh one.
        if !in_flight && state.previous_run_crashed() {
            tracing::debug!(workspace_id = %workspace_id, "memory writer recovering interrupted run");
            state.turns_since_last_run = state.turns_since_last_run.max(interval - 1);
            self.deps
                .observer
                .record_memory_writer_lifecycle(MemoryWriterLifecycleSignal::CrashRecovered);
        }

        state.turns_since_last_run = state.turns_since_last_run.saturating_add(1);
        self.deps
            .observer
            .record_memory_writer_lifecycle(MemoryWriterLifecycleSignal::TurnCounted);

        if in_flight || state.turns_since_last_run < interval {
            self.persist_state(workspace_id, state)?;
            if in_flight {
                self.deps
                    .observer
                    .record_memory_writer_lifecycle(MemoryWriterLifecycleSignal::RunDeferredInFlight);
            }
            return Ok(false);
        }

        let started_at = state.next_start_stamp(now_millis());
        state.turns_since_last_run = 0;
        state.last_run_started_at = Some(started_at);
        state.last_run_message_id = Some(ctx.message_id.clone());
        self.persist_state(workspace_id, state)?;

        self.launch_run(ctx.clone(), config.clone(), started_at);
        self.deps
            .observer
            .record_memory_writer_lifecycle(MemoryWriterLifecycleSignal::RunScheduled);
        Ok(true)
    }

    fn launch_run(self: &Arc<Self>, ctx: MemoryWriterStreamContext, config: Config, started_at: i64) {
        let run_id = self.next_run_id.fetch_add(1, Ordering::Relaxed);
        let (done_tx, done_rx) = watch::channel(false);
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                ctx.workspace_id.clone(),
                InFlightRun {
                    run_id,
                    done: done_rx,
                },
            );

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let began = Instant::now();
            inner.deps.observer.record_event(&ObserverEvent::MemoryWriterRunStarted {
                workspace_id: ctx.workspace_id.clone(),
                message_id: ctx.message_id.clone(),
            });

            // A panicking collaborator must not strand the in-flight entry.
            let run = {
                let inner = Arc::clone(&inner);
                let ctx = ctx.clone();
                tokio::spawn(async move { inner.execute_run(&ctx, &config).await })
            };
            let outcome = match run.await {
                Ok(outcome) => outcome,
                Err(join_error) => {
                    tracing::warn!(
                        workspace_id = %ctx.workspace_id,
                        error = %join_error,
                        "memory writer run panicked"
                    );
                    inner.deps.observer.record_event(&ObserverEvent::Error {
                        component: "memory_writer".into(),
                        message: join_error.to_string(),
                    });
                    RunOutcome::Failed
                }
            };

            inner.deps.observer.record_event(&ObserverEvent::MemoryWriterRunFinished {
                workspace_id: ctx.workspace_id.clone(),
                outcome,
                duration: began.elapsed(),
            });
            inner.finish_run(&ctx.workspace_id, run_id, started_at).await;
            let _ = done_tx.send(true);
        });
    }

    async fn execute_run(&self, ctx: &MemoryWriterStreamContext, config: &Config) -> RunOutcome {
        match self.try_execute_run(ctx, config).await {
            Ok(outcome) => outcome,
            Err(error) if MemoryWriterError::is_abort(&error) => {
                tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer run aborted");
                RunOutcome::TimedOut
            }
            Err(error) => {
                tracing::warn!(
                    workspace_id = %ctx.workspace_id,
                    error = %format!("{error:#}"),
                    "memory writer run failed"
                );
                self.deps.observer.record_event(&ObserverEvent::Error {
                    component: "memory_writer".into(),
                    message: format!("{error:#}"),
                });
                RunOutcome::Failed
            }
        }
    }

    async fn try_execute_run(
        &self,
        ctx: &MemoryWriterStreamContext,
        config: &Config,
    ) -> Result<RunOutcome> {
        let history = self
            .deps
            .history
            .get_history(&ctx.workspace_id)
            .await
            .map_err(|error| MemoryWriterError::HistoryUnavailable {
                workspace_id: ctx.workspace_id.clone(),
                message: format!("{error:#}"),
            })?;

        let Some(resolved) = resolve_memory_writer_model(config, ctx.model_string.as_deref()) else {
            tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer skipped: no model configured");
            return Ok(RunOutcome::Skipped);
        };
        let Some(model) = self
            .deps
            .models
            .create_model(&resolved.model_string, &ctx.provider_options)
            .await
            .with_context(|| format!("creating model {}", resolved.model_string))?
        else {
            tracing::debug!(
                workspace_id = %ctx.workspace_id,
                model = %resolved.model_string,
                "memory writer skipped: model unavailable"
            );
            return Ok(RunOutcome::Skipped);
        };

        let request = MemoryWriterTaskRequest {
            workspace_id: ctx.workspace_id.clone(),
            workspace_name: ctx.workspace_name.clone(),
            project_path: ctx.project_path.clone(),
            runtime_config: ctx.runtime_config.clone(),
            model,
            model_string: resolved.model_string,
            thinking_level: resolved.thinking_level,
            history,
            timeout: self.deps.timeout,
        };

        // Child of the external token: shutdown aborts the run, while
        // cancelling the run on timeout leaves the parent untouched.
        let cancel = self.deps.abort.child_token();
        let result = tokio::select! {
            result = self.deps.task.run(request, cancel.clone()) => result,
            () = tokio::time::sleep(self.deps.timeout) => {
                cancel.cancel();
                tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer run timed out");
                return Ok(RunOutcome::TimedOut);
            }
            () = cancel.cancelled() => return Err(MemoryWriterError::Aborted.into()),
        };

        let outcome = match result.context("memory writer task")? {
            Some(result) if result.timed_out => RunOutcome::TimedOut,
            Some(result) if result.wrote_memory => RunOutcome::Wrote,
            Some(result) => {
                tracing::debug!(
                    workspace_id = %ctx.workspace_id,
                    finish_reason = ?result.finish_reason,
                    "memory writer finished without writing"
                );
                RunOutcome::NoWrite
            }
            None => {
                tracing::debug!(workspace_id = %ctx.workspace_id, "memory writer returned no result");
                RunOutcome::NoWrite
            }
        };
        Ok(outcome)
    }

    /// Stamp completion (unless a newer run restamped the state) and clear
    /// the in-flight entry if it still belongs to this run.
    async fn finish_run(&self, workspace_id: &str, run_id: u64, started_at: i64) {
        self.with_workspace_queue(workspace_id, (), || {
            {
                let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
                if in_flight.get(workspace_id).is_some_and(|run| run.run_id == run_id) {
                    in_flight.remove(workspace_id);
                }
            }
            let mut state = self.load_state(workspace_id)?;
            if state.mark_completed(started_at, now_millis()) {
                self.persist_state(workspace_id, state)?;
            }
            Ok(())
        })
        .await;
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
