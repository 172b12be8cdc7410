#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use mux_core::config::{Config, ThinkingLevel};
use mux_core::error::MemoryWriterError;
use mux_core::memory_writer::{
    HistoryMessage, HistoryService, LanguageModel, MemoryWriterDeps, MemoryWriterPolicy,
    MemoryWriterSchedulingState, MemoryWriterStreamContext, MemoryWriterTask,
    MemoryWriterTaskRequest, MemoryWriterTaskResult, MessageRole, ModelFactory, ProviderOptions,
    RunOutcome, RuntimeConfig, SchedulingStateStore,
};
use mux_core::observability::{
    MemoryWriterLifecycleSignal, Observer, ObserverEvent, ObserverMetric,
};
use mux_core::persistence::JsonFileStore;

pub struct FakeHistory {
    pub calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
    panics: bool,
}

impl FakeHistory {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            gate: None,
            panics: false,
        }
    }

    /// Each call blocks until [`FakeHistory::release`] hands out a permit.
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Every call panics after being counted.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Self::new()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl HistoryService for FakeHistory {
    fn get_history<'a>(
        &'a self,
        workspace_id: &'a str,
    ) -> BoxFuture<'a, anyhow::Result<Vec<HistoryMessage>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panics {
                panic!("history backend crashed");
            }
            if let Some(gate) = &self.gate {
                gate.acquire().await?.forget();
            }
            Ok(vec![HistoryMessage {
                id: format!("{workspace_id}-m1"),
                role: MessageRole::Assistant,
                content: "we decided to use sqlite".into(),
                created_at: None,
            }])
        })
    }
}

struct FakeModel(String);

impl LanguageModel for FakeModel {
    fn model_id(&self) -> &str {
        &self.0
    }
}

#[derive(Default)]
pub struct FakeModelFactory {
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
    pub unavailable: bool,
    pub fail: bool,
}

impl FakeModelFactory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ModelFactory for FakeModelFactory {
    fn create_model<'a>(
        &'a self,
        model_string: &'a str,
        _provider_options: &'a ProviderOptions,
    ) -> BoxFuture<'a, anyhow::Result<Option<Arc<dyn LanguageModel>>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requested.lock().unwrap().push(model_string.to_string());
            if self.fail {
                anyhow::bail!("provider exploded");
            }
            if self.unavailable {
                return Ok(None);
            }
            let model: Arc<dyn LanguageModel> = Arc::new(FakeModel(model_string.to_string()));
            Ok(Some(model))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBehaviour {
    Write,
    NoWrite,
    /// Never finishes on its own.
    Hang,
    /// Waits for cancellation and reports it as an abort.
    AbortOnCancel,
}

pub struct FakeTask {
    pub behaviour: TaskBehaviour,
    pub calls: AtomicUsize,
    pub thinking_levels: Mutex<Vec<ThinkingLevel>>,
}

impl FakeTask {
    pub fn new(behaviour: TaskBehaviour) -> Self {
        Self {
            behaviour,
            calls: AtomicUsize::new(0),
            thinking_levels: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MemoryWriterTask for FakeTask {
    fn run(
        &self,
        request: MemoryWriterTaskRequest,
        cancel: CancellationToken,
    ) -> BoxFuture<'_, anyhow::Result<Option<MemoryWriterTaskResult>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.thinking_levels
                .lock()
                .unwrap()
                .push(request.thinking_level);
            match self.behaviour {
                TaskBehaviour::Write => Ok(Some(MemoryWriterTaskResult {
                    finish_reason: Some("stop".into()),
                    timed_out: false,
                    wrote_memory: true,
                })),
                TaskBehaviour::NoWrite => Ok(Some(MemoryWriterTaskResult {
                    finish_reason: Some("stop".into()),
                    ..MemoryWriterTaskResult::default()
                })),
                TaskBehaviour::Hang => {
                    std::future::pending::<()>().await;
                    Ok(None)
                }
                TaskBehaviour::AbortOnCancel => {
                    cancel.cancelled().await;
                    Err(MemoryWriterError::Aborted.into())
                }
            }
        })
    }
}

#[derive(Default)]
pub struct RecordingObserver {
    pub events: Mutex<Vec<ObserverEvent>>,
    pub signals: Mutex<Vec<MemoryWriterLifecycleSignal>>,
}

impl RecordingObserver {
    pub fn outcomes(&self) -> Vec<RunOutcome> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter_map(|event| match event {
                ObserverEvent::MemoryWriterRunFinished { outcome, .. } => Some(*outcome),
                _ => None,
            })
            .collect()
    }

    pub fn saw(&self, signal: MemoryWriterLifecycleSignal) -> bool {
        self.signals.lock().unwrap().contains(&signal)
    }
}

impl Observer for RecordingObserver {
    fn record_event(&self, event: &ObserverEvent) {
        self.events.lock().unwrap().push(event.clone());
    }

    fn record_metric(&self, metric: &ObserverMetric) {
        if let ObserverMetric::MemoryWriterLifecycle(signal) = metric {
            self.signals.lock().unwrap().push(*signal);
        }
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Disk-backed state store whose loads and saves can be made to fail.
pub struct FaultyStore {
    inner: Arc<JsonFileStore>,
    pub fail_loads: AtomicBool,
    pub fail_saves: AtomicBool,
}

impl FaultyStore {
    pub fn new(inner: Arc<JsonFileStore>) -> Self {
        Self {
            inner,
            fail_loads: AtomicBool::new(false),
            fail_saves: AtomicBool::new(false),
        }
    }

    pub fn set_fail_loads(&self, fail: bool) {
        self.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SchedulingStateStore for FaultyStore {
    fn load(&self, workspace_id: &str) -> anyhow::Result<Option<MemoryWriterSchedulingState>> {
        if self.fail_loads.load(Ordering::SeqCst) {
            anyhow::bail!("state volume unavailable");
        }
        self.inner.load(workspace_id)
    }

    fn save(&self, workspace_id: &str, state: &MemoryWriterSchedulingState) -> anyhow::Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            anyhow::bail!("state volume is read-only");
        }
        self.inner.save(workspace_id, state)
    }
}

pub fn config_with_interval(interval: i64) -> Config {
    let mut config = Config::default();
    config.task_settings.memory_writer_interval_messages = Some(interval);
    config
}

pub struct Harness {
    pub temp: TempDir,
    pub store: Arc<JsonFileStore>,
    /// What the policy actually persists through; wraps `store`.
    pub faults: Arc<FaultyStore>,
    pub history: Arc<FakeHistory>,
    pub models: Arc<FakeModelFactory>,
    pub task: Arc<FakeTask>,
    pub observer: Arc<RecordingObserver>,
    pub abort: CancellationToken,
    pub policy: MemoryWriterPolicy,
}

pub struct HarnessBuilder {
    config: Config,
    history: FakeHistory,
    models: FakeModelFactory,
    task: FakeTask,
    timeout: Option<Duration>,
    temp: Option<TempDir>,
}

impl HarnessBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            history: FakeHistory::new(),
            models: FakeModelFactory::default(),
            task: FakeTask::new(TaskBehaviour::Write),
            timeout: None,
            temp: None,
        }
    }

    pub fn history(mut self, history: FakeHistory) -> Self {
        self.history = history;
        self
    }

    pub fn models(mut self, models: FakeModelFactory) -> Self {
        self.models = models;
        self
    }

    pub fn task(mut self, behaviour: TaskBehaviour) -> Self {
        self.task = FakeTask::new(behaviour);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reuse a store directory, simulating a process restart.
    pub fn store_dir(mut self, temp: TempDir) -> Self {
        self.temp = Some(temp);
        self
    }

    pub fn build(self) -> Harness {
        let temp = self
            .temp
            .unwrap_or_else(|| TempDir::new().expect("temp dir should be created"));
        let store = Arc::new(JsonFileStore::new(temp.path()));
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let history = Arc::new(self.history);
        let models = Arc::new(self.models);
        let task = Arc::new(self.task);
        let observer = Arc::new(RecordingObserver::default());
        let abort = CancellationToken::new();

        let mut deps = MemoryWriterDeps::new(
            Arc::new(self.config),
            history.clone(),
            faults.clone(),
            models.clone(),
            task.clone(),
        )
        .with_observer(observer.clone())
        .with_abort_token(abort.clone());
        if let Some(timeout) = self.timeout {
            deps = deps.with_timeout(timeout);
        }

        Harness {
            temp,
            store,
            faults,
            history,
            models,
            task,
            observer,
            abort,
            policy: MemoryWriterPolicy::new(deps),
        }
    }
}

pub fn stream_end(workspace_id: &str, message_id: &str) -> MemoryWriterStreamContext {
    MemoryWriterStreamContext {
        workspace_id: workspace_id.into(),
        message_id: message_id.into(),
        workspace_name: format!("{workspace_id}-name"),
        project_path: PathBuf::from("/tmp/project"),
        runtime_config: RuntimeConfig::Local,
        parent_workspace_id: None,
        model_string: Some("anthropic:claude-sonnet-4-5".into()),
        provider_options: serde_json::json!({}),
        system1_enabled: true,
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
