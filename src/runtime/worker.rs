//! Worker Host (C9): hosts scripts on off-thread execution contexts,
//! speaking a typed envelope protocol with the main context. Each script is
//! assigned to a context at load time and never migrates.

use super::commands::ScriptEvent;
use crate::config::RuntimeConfig;
use rustc_hash::FxHashMap;
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Inbound envelopes: main -> worker.
#[derive(Debug, Clone)]
pub enum WorkerInbound {
    Init { script_id: String, code: String, name: String, config: RuntimeConfig },
    Event { script_id: String, event: ScriptEvent },
    ApiResponse { call_id: u64, result: Option<serde_json::Value>, error: Option<String> },
    Terminate { script_id: String },
    Ping { timestamp: u64 },
}

/// Outbound envelopes: worker -> main.
#[derive(Debug, Clone)]
pub enum WorkerOutbound {
    ApiCall { script_id: String, call_id: u64, method: String, args: serde_json::Value },
    Log { script_id: String, level: LogLevel, args: Vec<String> },
    Error { script_id: String, error: String, stack: Option<String> },
    Ready { script_id: String },
    Pong { timestamp: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Log,
    Warn,
    Error,
}

/// The instantiation/invocation surface the host engine provides. The
/// worker resolves *which* method to call and in what order; actually
/// running script code happens beyond this crate's boundary.
pub trait ScriptExecutor: Send {
    /// Instantiates the script's class and returns its declared
    /// `states` table: state name -> set of event names it handles.
    fn init(&mut self, script_id: &str, code: &str, name: &str) -> Result<FxHashMap<String, FxHashSet<String>>, String>;
    /// Invokes `method` on the instance, returning whatever bookkeeping
    /// the instance's `transitionTo` calls changed in its current state.
    fn invoke(&mut self, script_id: &str, method: &str, event: &ScriptEvent) -> Result<(), String>;
    fn has_global_method(&self, script_id: &str, method: &str) -> bool;
    /// Reads back the instance's current state after a handler ran, so a
    /// `transitionTo()` call inside it is reflected in worker bookkeeping.
    fn current_state(&self, script_id: &str) -> Option<String>;
    fn terminate(&mut self, script_id: &str);
}

struct ScriptSlot {
    states_table: FxHashMap<String, FxHashSet<String>>,
    current_state: String,
}

/// One off-thread execution context. Owns its assigned scripts' bookkeeping
/// and the pluggable [`ScriptExecutor`] that actually runs them.
pub struct WorkerContext<E: ScriptExecutor> {
    executor: E,
    scripts: FxHashMap<String, ScriptSlot>,
    outbox: async_channel::Sender<WorkerOutbound>,
    next_call_id: u64,
    pending_calls: FxHashMap<u64, oneshot::Sender<ApiCallResult>>,
}

/// What a correlated `api-response` resolves the waiting [`WorkerContext::call_api`]
/// future with.
pub type ApiCallResult = Result<serde_json::Value, String>;

impl<E: ScriptExecutor> WorkerContext<E> {
    pub fn new(executor: E, outbox: async_channel::Sender<WorkerOutbound>) -> Self {
        Self { executor, scripts: FxHashMap::default(), outbox, next_call_id: 0, pending_calls: FxHashMap::default() }
    }

    pub async fn handle(&mut self, msg: WorkerInbound) {
        match msg {
            WorkerInbound::Init { script_id, code, name, .. } => self.handle_init(script_id, code, name).await,
            WorkerInbound::Event { script_id, event } => self.handle_event(script_id, event).await,
            WorkerInbound::ApiResponse { call_id, result, error } => {
                if let Some(sender) = self.pending_calls.remove(&call_id) {
                    let resolved = match error {
                        Some(message) => Err(message),
                        None => Ok(result.unwrap_or(serde_json::Value::Null)),
                    };
                    let _ = sender.send(resolved);
                }
            }
            WorkerInbound::Terminate { script_id } => {
                self.executor.terminate(&script_id);
                self.scripts.remove(&script_id);
            }
            WorkerInbound::Ping { timestamp } => {
                let _ = self.outbox.send(WorkerOutbound::Pong { timestamp }).await;
            }
        }
    }

    async fn handle_init(&mut self, script_id: String, code: String, name: String) {
        match self.executor.init(&script_id, &code, &name) {
            Ok(states_table) => {
                self.scripts.insert(script_id.clone(), ScriptSlot { states_table, current_state: "default".to_string() });
                let _ = self.outbox.send(WorkerOutbound::Ready { script_id }).await;
            }
            Err(error) => {
                let _ = self.outbox.send(WorkerOutbound::Error { script_id, error, stack: None }).await;
            }
        }
    }

    /// Resolves the handler for `event` by state-first then global, per the
    /// protocol: invoke the state handler if the current state declares it,
    /// then invoke a same-named global override if one exists distinct from
    /// it, then read back the (possibly transitioned) current state.
    async fn handle_event(&mut self, script_id: String, event: ScriptEvent) {
        let event_name = event_method_name(&event);
        let Some(slot) = self.scripts.get(&script_id) else { return };

        let state_has_handler = slot.states_table.get(&slot.current_state).is_some_and(|set| set.contains(event_name));
        let has_global = self.executor.has_global_method(&script_id, event_name);

        if state_has_handler {
            if let Err(error) = self.executor.invoke(&script_id, event_name, &event) {
                let _ = self.outbox.send(WorkerOutbound::Error { script_id: script_id.clone(), error, stack: None }).await;
            }
        }
        if has_global && (!state_has_handler || global_differs_from_state_handler()) {
            if let Err(error) = self.executor.invoke(&script_id, event_name, &event) {
                let _ = self.outbox.send(WorkerOutbound::Error { script_id: script_id.clone(), error, stack: None }).await;
            }
        }

        if let Some(new_state) = self.executor.current_state(&script_id) {
            if let Some(slot) = self.scripts.get_mut(&script_id) {
                slot.current_state = new_state;
            }
        }
    }

    /// Allocates the next call id for an outgoing `api-call` from this
    /// context; call ids are scoped per worker, unique within it.
    pub fn next_call_id(&mut self) -> u64 {
        self.next_call_id += 1;
        self.next_call_id
    }

    /// Issues an `api-call` for `script_id` and hands back a one-shot
    /// receiver that resolves once the matching `api-response` arrives back
    /// through [`WorkerContext::handle`], correlated by call id. The
    /// receiver is independent of this context, so the caller awaits it
    /// without holding `&mut self` across the wait while `handle` keeps
    /// draining the worker's inbox in the meantime.
    pub async fn begin_api_call(
        &mut self,
        script_id: String,
        method: String,
        args: serde_json::Value,
    ) -> oneshot::Receiver<ApiCallResult> {
        let call_id = self.next_call_id();
        let (tx, rx) = oneshot::channel();
        self.pending_calls.insert(call_id, tx);

        if self.outbox.send(WorkerOutbound::ApiCall { script_id, call_id, method, args }).await.is_err() {
            self.pending_calls.remove(&call_id);
        }
        rx
    }
}

/// Whether a global override is a distinct handler from the state handler.
/// Modeled as always-distinct: the abstraction layer has no notion of
/// function identity, so both are invoked whenever both are declared.
fn global_differs_from_state_handler() -> bool {
    true
}

fn event_method_name(event: &ScriptEvent) -> &'static str {
    use ScriptEvent::*;
    match event {
        TouchStart { .. } => "onTouchStart",
        Touch { .. } => "onTouch",
        TouchEnd { .. } => "onTouchEnd",
        CollisionStart { .. } => "onCollisionStart",
        Collision { .. } => "onCollision",
        CollisionEnd { .. } => "onCollisionEnd",
        Rez { .. } => "onRez",
        Changed { .. } => "onChanged",
        Money { .. } => "onMoney",
        Permissions { .. } => "onPermissions",
        Sensor { .. } => "onSensor",
        NoSensor => "onNoSensor",
        Listen { .. } => "onListen",
        HttpResponse { .. } => "onHttpResponse",
        Dataserver { .. } => "onDataserver",
        PlayerEnterZone { .. } => "onPlayerEnterZone",
        PlayerLeaveZone { .. } => "onPlayerLeaveZone",
        DayNightCycle { .. } => "onDayNightCycle",
        WeatherChange { .. } => "onWeatherChange",
        Timer { .. } => "onTimer",
        LinkMessage { .. } => "onLinkMessage",
    }
}

/// Main-context handle to a fixed pool of worker contexts. Assigns each
/// script to a context round-robin at `init` time; the assignment is
/// permanent for the script's lifetime.
pub struct WorkerHost {
    senders: Vec<async_channel::Sender<WorkerInbound>>,
    assignment: dashmap::DashMap<String, usize>,
    next_slot: AtomicUsize,
    outbound_rx: async_channel::Receiver<WorkerOutbound>,
}

impl WorkerHost {
    /// Spawns `worker_count` tokio tasks, each driven by an executor built
    /// from `make_executor`.
    pub fn spawn<E, F>(worker_count: usize, make_executor: F) -> Self
    where
        E: ScriptExecutor + 'static,
        F: Fn() -> E,
    {
        let (outbound_tx, outbound_rx) = async_channel::unbounded();
        let mut senders = Vec::with_capacity(worker_count);

        for _ in 0..worker_count {
            let (inbox_tx, inbox_rx) = async_channel::unbounded();
            let mut ctx = WorkerContext::new(make_executor(), outbound_tx.clone());
            tokio::spawn(async move {
                while let Ok(msg) = inbox_rx.recv().await {
                    ctx.handle(msg).await;
                }
            });
            senders.push(inbox_tx);
        }

        Self { senders, assignment: dashmap::DashMap::new(), next_slot: AtomicUsize::new(0), outbound_rx }
    }

    fn slot_for(&self, script_id: &str) -> usize {
        *self
            .assignment
            .entry(script_id.to_string())
            .or_insert_with(|| self.next_slot.fetch_add(1, Ordering::SeqCst) % self.senders.len().max(1))
    }

    pub async fn init(&self, script_id: &str, code: &str, name: &str, config: RuntimeConfig) {
        let slot = self.slot_for(script_id);
        let _ = self.senders[slot]
            .send(WorkerInbound::Init { script_id: script_id.to_string(), code: code.to_string(), name: name.to_string(), config })
            .await;
    }

    pub async fn dispatch_event(&self, script_id: &str, event: ScriptEvent) {
        let Some(slot) = self.assignment.get(script_id).map(|r| *r) else { return };
        let _ = self.senders[slot].send(WorkerInbound::Event { script_id: script_id.to_string(), event }).await;
    }

    /// Writes an `api-response` back to the worker that owns `script_id`,
    /// correlated by `call_id`.
    pub async fn reply_api_response(&self, script_id: &str, call_id: u64, result: Option<serde_json::Value>, error: Option<String>) {
        let Some(slot) = self.assignment.get(script_id).map(|r| *r) else { return };
        let _ = self.senders[slot].send(WorkerInbound::ApiResponse { call_id, result, error }).await;
    }

    pub async fn terminate(&self, script_id: &str) {
        if let Some((_, slot)) = self.assignment.remove(script_id) {
            let _ = self.senders[slot].send(WorkerInbound::Terminate { script_id: script_id.to_string() }).await;
        }
    }

    pub async fn recv_outbound(&self) -> Option<WorkerOutbound> {
        self.outbound_rx.recv().await.ok()
    }
}

pub type SharedWorkerHost = Arc<WorkerHost>;
