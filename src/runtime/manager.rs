//! Script Manager & Command Router (C14): owns the script lifecycle and
//! routes outbound API calls either to in-process handling or to a
//! registered [`CommandHandler`] as a typed [`ScriptCommand`].

use super::commands::{ScriptCommand, ScriptCommandEnvelope};
use super::dispatcher::EventDispatcher;
use super::linkbus::LinkMessageBus;
use super::timer::TimerManager;
use super::worker::WorkerHost;
use crate::codegen::Diagnostic;
use crate::config::RuntimeConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Receives outbound API calls the Script Manager doesn't handle in-process.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, envelope: ScriptCommandEnvelope);
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    #[error("sandbox transform rejected the script: {0:?}")]
    SandboxRejected(Vec<Diagnostic>),
}

/// Owns script lifecycle state shared across the main context: the Worker
/// Host, Event Dispatcher, Timer Manager, and Link Message Bus, plus the
/// registered command handler outbound API calls route to.
pub struct ScriptManager {
    worker_host: Arc<WorkerHost>,
    dispatcher: Mutex<EventDispatcher>,
    timers: Mutex<TimerManager>,
    bus: Mutex<LinkMessageBus>,
    command_handler: Arc<dyn CommandHandler>,
    config: RuntimeConfig,
    next_call_id: AtomicU64,
}

impl ScriptManager {
    pub fn new(worker_host: Arc<WorkerHost>, command_handler: Arc<dyn CommandHandler>, config: RuntimeConfig) -> Self {
        let dispatcher = EventDispatcher::new(worker_host.clone());
        Self {
            worker_host,
            dispatcher: Mutex::new(dispatcher),
            timers: Mutex::new(TimerManager::new()),
            bus: Mutex::new(LinkMessageBus::new(config.link_queue_cap)),
            command_handler,
            config,
            next_call_id: AtomicU64::new(0),
        }
    }

    /// Applies the sandbox transform, then sends `init` to a worker slot.
    /// On transform failure, reports and refuses the load.
    pub async fn load_script(&self, script_id: &str, name: &str, source: &str) -> Result<(), LoadError> {
        let result = crate::sandbox::transform(source, &self.config);
        if !result.success {
            return Err(LoadError::SandboxRejected(result.diagnostics));
        }
        self.worker_host.init(script_id, &result.code, name, self.config).await;
        Ok(())
    }

    /// Call once a `ready` envelope for `script_id` is observed: registers
    /// it with the Link Message Bus and container index.
    pub async fn handle_ready(&self, script_id: &str, container_id: &str, link_number: i32) {
        self.bus.lock().await.register(script_id, container_id, link_number);
        self.dispatcher.lock().await.register_script(script_id, container_id);
    }

    /// Routes one outbound API call. Built-ins are handled in-process;
    /// everything else becomes a typed [`ScriptCommand`] via the
    /// method->variant table and is handed to the [`CommandHandler`].
    pub async fn route_call(&self, script_id: &str, container_id: &str, method: &str, args: serde_json::Value) {
        if self.handle_builtin(script_id, method, &args).await {
            return;
        }

        let call_id = self.next_call_id.fetch_add(1, Ordering::SeqCst);
        let command = build_command(method, args);
        self.command_handler.handle(ScriptCommandEnvelope {
            script_id: script_id.to_string(),
            container_id: container_id.to_string(),
            call_id,
            command,
        });
    }

    async fn handle_builtin(&self, script_id: &str, method: &str, args: &serde_json::Value) -> bool {
        match method {
            "world.setTimer" => {
                let interval = args.get("interval").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let timer_id = args.get("timerId").and_then(|v| v.as_str()).unwrap_or(super::timer::DEFAULT_TIMER);
                self.timers.lock().await.set_timer(script_id, interval, timer_id, 0);
                true
            }
            "world.clearTimer" => {
                let timer_id = args.get("timerId").and_then(|v| v.as_str()).unwrap_or(super::timer::DEFAULT_TIMER);
                self.timers.lock().await.clear_timer(script_id, timer_id);
                true
            }
            "world.setTimeout" => {
                let delay = args.get("delay").and_then(|v| v.as_f64()).unwrap_or(0.0);
                let timer_id = args.get("timerId").and_then(|v| v.as_str()).unwrap_or("__timeout");
                self.timers.lock().await.set_one_shot(script_id, delay, timer_id, 0);
                true
            }
            "world.listen" => {
                let channel = args.get("channel").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
                let name = args.get("name").and_then(|v| v.as_str()).map(str::to_string);
                let id = args.get("id").and_then(|v| v.as_str()).map(str::to_string);
                let message = args.get("message").and_then(|v| v.as_str()).map(str::to_string);
                self.dispatcher.lock().await.listen(script_id, channel, name, id, message);
                true
            }
            "world.log" => {
                let text = args.get("message").and_then(|v| v.as_str()).unwrap_or_default();
                log::info!("[{script_id}] {text}");
                true
            }
            "world.resetScript" => true,
            "container.sendLinkMessage" => {
                let target = args.get("target").and_then(|v| v.as_i64()).unwrap_or(super::linkbus::LINK_SET as i64) as i32;
                let num = args.get("num").and_then(|v| v.as_i64()).unwrap_or(0) as i32;
                let str_value = args.get("str").and_then(|v| v.as_str()).unwrap_or_default();
                let id_value = args.get("id").and_then(|v| v.as_str()).unwrap_or_default();

                let mut delivered = Vec::new();
                self.bus.lock().await.send(script_id, target, num, str_value, id_value, |msg| delivered.push(msg.clone()));

                let dispatcher = self.dispatcher.lock().await;
                for msg in &delivered {
                    dispatcher.dispatch_link_message(msg).await;
                }
                true
            }
            _ => false,
        }
    }

    /// Advances the Timer Manager and dispatches any fires through the
    /// Event Dispatcher.
    pub async fn tick(&self, now_ms: u64) {
        let fires = self.timers.lock().await.tick(now_ms);
        self.dispatcher.lock().await.dispatch_timer_fires(fires).await;
    }

    /// Dispatcher cleanup, worker drop, bus unregister.
    pub async fn terminate(&self, script_id: &str) {
        {
            let mut dispatcher = self.dispatcher.lock().await;
            let mut timers = self.timers.lock().await;
            let mut bus = self.bus.lock().await;
            dispatcher.cleanup_script(script_id, &mut timers, &mut bus);
        }
        self.worker_host.terminate(script_id).await;
    }
}

/// Maps an outbound method name to its `ScriptCommand` tag and builds the
/// typed variant by merging `args` with that tag. Unmapped methods become
/// [`ScriptCommand::Extension`], same as the NPC/media commands the wire
/// schema names in prose without a dedicated variant.
fn build_command(method: &str, args: serde_json::Value) -> ScriptCommand {
    let tag = method_to_tag(method);
    let Some(tag) = tag else {
        return ScriptCommand::Extension { method: method.to_string(), args };
    };

    let mut tagged = args;
    if let serde_json::Value::Object(map) = &mut tagged {
        map.insert("type".to_string(), serde_json::Value::String(tag.to_string()));
    }
    serde_json::from_value(tagged).unwrap_or_else(|_| ScriptCommand::Extension {
        method: method.to_string(),
        args: serde_json::Value::Null,
    })
}

fn method_to_tag(method: &str) -> Option<&'static str> {
    Some(match method {
        "object.setPosition" => "setPosition",
        "object.setRotation" => "setRotation",
        "object.setScale" => "setScale",
        "object.setColor" => "setColor",
        "object.setAlpha" => "setAlpha",
        "object.setTexture" => "setTexture",
        "object.setText" => "setText",
        "object.setGlow" => "setGlow",
        "world.say" => "say",
        "world.whisper" => "whisper",
        "world.shout" => "shout",
        "world.regionSay" => "regionSay",
        "world.instantMessage" => "instantMessage",
        "world.dialog" => "dialog",
        "object.playSound" => "playSound",
        "object.stopSound" => "stopSound",
        "object.setParticles" => "setParticles",
        "object.stopParticles" => "stopParticles",
        "object.playAnimation" => "playAnimation",
        "object.stopAnimation" => "stopAnimation",
        "object.applyForce" => "applyForce",
        "object.applyImpulse" => "applyImpulse",
        "object.setPhysics" => "setPhysics",
        "world.httpRequest" => "httpRequest",
        "world.requestPermissions" => "requestPermissions",
        "object.setMedia" => "setMedia",
        "object.stopMedia" => "stopMedia",
        "object.setMediaVolume" => "setMediaVolume",
        "world.sensor" => "sensor",
        "world.sensorRepeat" => "sensorRepeat",
        "world.sensorRemove" => "sensorRemove",
        "object.die" => "die",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::commands::ScriptEvent;
    use crate::runtime::worker::ScriptExecutor;
    use rustc_hash::{FxHashMap, FxHashSet};
    use std::sync::Mutex as StdMutex;

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

    struct RecordingHandler {
        received: StdMutex<Vec<ScriptCommandEnvelope>>,
    }
    impl CommandHandler for RecordingHandler {
        fn handle(&self, envelope: ScriptCommandEnvelope) {
            self.received.lock().unwrap().push(envelope);
        }
    }

    #[test]
    fn build_command_maps_a_known_method() {
        let cmd = build_command("world.say", serde_json::json!({"channel": 0, "message": "hi"}));
        assert!(matches!(cmd, ScriptCommand::Say { channel: 0, .. }));
    }

    #[test]
    fn build_command_falls_back_to_extension_for_unmapped_methods() {
        let cmd = build_command("object.npcWander", serde_json::json!({"range": 5}));
        assert!(matches!(cmd, ScriptCommand::Extension { ref method, .. } if method == "object.npcWander"));
    }

    #[tokio::test]
    async fn sandbox_rejection_refuses_the_load() {
        let host = Arc::new(WorkerHost::spawn(1, || NoopExecutor));
        let handler = Arc::new(RecordingHandler { received: StdMutex::new(Vec::new()) });
        let manager = ScriptManager::new(host, handler, RuntimeConfig::default());
        let result = manager.load_script("s1", "s1.tsl", "class S {").await;
        assert!(matches!(result, Err(LoadError::SandboxRejected(_))));
    }

    #[tokio::test]
    async fn unmapped_call_reaches_the_command_handler() {
        let host = Arc::new(WorkerHost::spawn(1, || NoopExecutor));
        let handler = Arc::new(RecordingHandler { received: StdMutex::new(Vec::new()) });
        let manager = ScriptManager::new(host, handler.clone(), RuntimeConfig::default());
        manager.route_call("s1", "c1", "object.npcCreate", serde_json::json!({"position": {"x":0,"y":0,"z":0}})).await;
        let received = handler.received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(matches!(received[0].command, ScriptCommand::Extension { .. }));
    }

    #[tokio::test]
    async fn builtin_set_timer_is_handled_in_process_not_routed() {
        let host = Arc::new(WorkerHost::spawn(1, || NoopExecutor));
        let handler = Arc::new(RecordingHandler { received: StdMutex::new(Vec::new()) });
        let manager = ScriptManager::new(host, handler.clone(), RuntimeConfig::default());
        manager.route_call("s1", "c1", "world.setTimer", serde_json::json!({"interval": 1.0})).await;
        assert!(handler.received.lock().unwrap().is_empty());
        assert!(manager.timers.lock().await.has_timer("s1", super::super::timer::DEFAULT_TIMER));
    }
}
