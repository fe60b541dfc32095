//! Bridge (C10): main-thread facade fronting the Worker Host transport,
//! batching outbound `api-call`s and replying with `api-response`.

use super::worker::{WorkerHost, WorkerOutbound};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A pending outbound API call awaiting a host-side handler result.
#[derive(Debug, Clone)]
pub struct PendingCall {
    pub script_id: String,
    pub call_id: u64,
    pub method: String,
    pub args: serde_json::Value,
}

pub type ApiResult = Result<serde_json::Value, String>;
type ApiHandlerFuture = Pin<Box<dyn Future<Output = ApiResult> + Send>>;

/// Invokes a script's API call against the host engine. May be async; the
/// bridge awaits it before writing the `api-response` back.
pub trait ApiHandler: Send + Sync {
    fn handle(&self, call: PendingCall) -> ApiHandlerFuture;
}

impl<F, Fut> ApiHandler for F
where
    F: Fn(PendingCall) -> Fut + Send + Sync,
    Fut: Future<Output = ApiResult> + Send + 'static,
{
    fn handle(&self, call: PendingCall) -> ApiHandlerFuture {
        Box::pin(self(call))
    }
}

/// Batches pending `api-call`s within one flush turn and replies to each
/// via the Worker Host once the handler resolves. Batching is bounded by
/// the flush call, not by a fixed count: callers decide the turn boundary
/// by when they invoke [`Bridge::flush`].
pub struct Bridge {
    worker_host: Arc<WorkerHost>,
    api_handler: Arc<dyn ApiHandler>,
    pending: Arc<Mutex<VecDeque<PendingCall>>>,
}

impl Bridge {
    pub fn new(worker_host: Arc<WorkerHost>, api_handler: Arc<dyn ApiHandler>) -> Self {
        Self { worker_host, api_handler, pending: Arc::new(Mutex::new(VecDeque::new())) }
    }

    /// Enqueues an `api-call` outbound envelope. Call [`Bridge::flush`] to
    /// process everything enqueued so far.
    pub async fn enqueue(&self, call: PendingCall) {
        self.pending.lock().await.push_back(call);
    }

    /// Drains whatever is enqueued at the moment of the call, invoking the
    /// API handler for each and replying to the worker with an
    /// `api-response`. This is the only place scripts wait on the host.
    pub async fn flush(&self) {
        let batch: Vec<PendingCall> = {
            let mut pending = self.pending.lock().await;
            pending.drain(..).collect()
        };

        for call in batch {
            let script_id = call.script_id.clone();
            let call_id = call.call_id;
            let result = self.api_handler.handle(call).await;
            let (ok, err) = match result {
                Ok(value) => (Some(value), None),
                Err(message) => (None, Some(message)),
            };
            self.worker_host.reply_api_response(&script_id, call_id, ok, err).await;
        }
    }

    /// Pumps one outbound envelope from the Worker Host, enqueuing
    /// `api-call`s for the next flush and returning the rest for the
    /// caller's own callbacks (log/error/ready).
    pub async fn pump_one(&self) -> Option<WorkerOutbound> {
        let msg = self.worker_host.recv_outbound().await?;
        if let WorkerOutbound::ApiCall { script_id, call_id, method, args } = &msg {
            self.enqueue(PendingCall { script_id: script_id.clone(), call_id: *call_id, method: method.clone(), args: args.clone() }).await;
            return None;
        }
        Some(msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::runtime::commands::ScriptEvent;
    use crate::runtime::worker::ScriptExecutor;
    use rustc_hash::{FxHashMap, FxHashSet};

    struct NoopExecutor;
    impl ScriptExecutor for NoopExecutor {
        fn init(&mut self, _: &str, _: &str, _: &str) -> Result<FxHashMap<String, FxHashSet<String>>, String> {
            Ok(FxHashMap::default())
        }
        fn invoke(&mut self, _: &str, _: &str, _: &ScriptEvent) -> Result<(), String> {
            Ok(())
        }
        fn has_global_method(&self, _: &str, _: &str) -> bool {
            false
        }
        fn current_state(&self, _: &str) -> Option<String> {
            None
        }
        fn terminate(&mut self, _: &str) {}
    }

    #[tokio::test]
    async fn flush_invokes_handler_and_replies_with_result() {
        let worker_host = Arc::new(WorkerHost::spawn(1, || NoopExecutor));
        worker_host.init("s1", "class S {}", "s1.tsl", RuntimeConfig::default()).await;
        let _ready = worker_host.recv_outbound().await;

        let handler: Arc<dyn ApiHandler> =
            Arc::new(|call: PendingCall| async move { Ok(serde_json::json!({"echo": call.method})) });
        let bridge = Bridge::new(worker_host.clone(), handler);

        bridge
            .enqueue(PendingCall { script_id: "s1".to_string(), call_id: 1, method: "world.say".to_string(), args: serde_json::json!([]) })
            .await;
        bridge.flush().await;

        // the reply went back through the worker host as an ApiResponse;
        // nothing outbound is produced for it, so just assert no panic and
        // the pending queue drained.
        assert!(bridge.pending.lock().await.is_empty());
    }
}
