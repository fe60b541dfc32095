//! Event Dispatcher (C13): routes host events to scripts, in container
//! broadcast, script-targeted, or chat-listener-indexed form.

use super::commands::ScriptEvent;
use super::linkbus::{LinkMessage, LinkMessageBus};
use super::timer::{TimerFire, TimerManager};
use super::worker::WorkerHost;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A chat listener registration, indexed three ways for [`EventDispatcher::dispatch_chat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenRegistration {
    pub handle: u64,
    pub script_id: String,
    pub channel: i32,
    pub name_filter: Option<String>,
    pub id_filter: Option<String>,
    pub message_filter: Option<String>,
}

/// Routes events to scripts and owns the chat-listener registry. Holds only
/// ids into the Worker Host, Timer Manager, and Link Message Bus, never
/// owning references to script instances.
pub struct EventDispatcher {
    worker_host: Arc<WorkerHost>,
    container_index: FxHashMap<String, Vec<String>>,
    script_container: FxHashMap<String, String>,
    listens_by_handle: FxHashMap<u64, ListenRegistration>,
    listens_by_channel: FxHashMap<i32, Vec<u64>>,
    listens_by_script: FxHashMap<String, Vec<u64>>,
    next_handle: u64,
}

impl EventDispatcher {
    pub fn new(worker_host: Arc<WorkerHost>) -> Self {
        Self {
            worker_host,
            container_index: FxHashMap::default(),
            script_container: FxHashMap::default(),
            listens_by_handle: FxHashMap::default(),
            listens_by_channel: FxHashMap::default(),
            listens_by_script: FxHashMap::default(),
            next_handle: 0,
        }
    }

    pub fn register_script(&mut self, script_id: &str, container_id: &str) {
        self.container_index.entry(container_id.to_string()).or_default().push(script_id.to_string());
        self.script_container.insert(script_id.to_string(), container_id.to_string());
    }

    /// Container broadcast for touch/collision/rez/changed/money: finds
    /// every script in `container_id` and sends `event` to each.
    pub async fn dispatch_container_broadcast(&self, container_id: &str, event: ScriptEvent) {
        let Some(scripts) = self.container_index.get(container_id) else { return };
        for script_id in scripts {
            self.worker_host.dispatch_event(script_id, event.clone()).await;
        }
    }

    /// Script-targeted dispatch for timer, link message, sensor/noSensor,
    /// permissions, HTTP/dataserver responses.
    pub async fn dispatch_script_targeted(&self, script_id: &str, event: ScriptEvent) {
        self.worker_host.dispatch_event(script_id, event).await;
    }

    pub fn listen(
        &mut self,
        script_id: &str,
        channel: i32,
        name_filter: Option<String>,
        id_filter: Option<String>,
        message_filter: Option<String>,
    ) -> u64 {
        self.next_handle += 1;
        let handle = self.next_handle;
        let reg = ListenRegistration {
            handle,
            script_id: script_id.to_string(),
            channel,
            name_filter,
            id_filter,
            message_filter,
        };
        self.listens_by_handle.insert(handle, reg);
        self.listens_by_channel.entry(channel).or_default().push(handle);
        self.listens_by_script.entry(script_id.to_string()).or_default().push(handle);
        handle
    }

    pub fn listen_remove(&mut self, handle: u64) {
        if let Some(reg) = self.listens_by_handle.remove(&handle) {
            remove_handle(&mut self.listens_by_channel, reg.channel, handle);
            remove_handle_by_key(&mut self.listens_by_script, &reg.script_id, handle);
        }
    }

    /// Looks up listeners for `channel`, applies non-empty filters
    /// (name/id/message must equal-match if set), and targets each passing
    /// listener's script with a `Listen` event.
    pub async fn dispatch_chat(&self, channel: i32, sender_name: &str, sender_id: &str, message: &str) {
        let Some(handles) = self.listens_by_channel.get(&channel) else { return };
        for handle in handles {
            let Some(reg) = self.listens_by_handle.get(handle) else { continue };
            if !matches_filter(&reg.name_filter, sender_name) {
                continue;
            }
            if !matches_filter(&reg.id_filter, sender_id) {
                continue;
            }
            if !matches_filter(&reg.message_filter, message) {
                continue;
            }
            let event = ScriptEvent::Listen {
                channel,
                sender_name: sender_name.to_string(),
                sender_id: sender_id.to_string(),
                message: message.to_string(),
            };
            self.dispatch_script_targeted(&reg.script_id, event).await;
        }
    }

    /// Drains [`TimerManager::tick`]'s fires and dispatches an `onTimer`
    /// event to each.
    pub async fn dispatch_timer_fires(&self, fires: Vec<TimerFire>) {
        for fire in fires {
            self.dispatch_script_targeted(&fire.script_id, ScriptEvent::Timer { timer_id: fire.timer_id }).await;
        }
    }

    /// Forwards a delivered link message as an `onLinkMessage` event.
    pub async fn dispatch_link_message(&self, message: &LinkMessage) {
        let event = ScriptEvent::LinkMessage {
            sender_link: message.sender_link,
            num: message.num,
            str: message.str.clone(),
            id: message.id.clone(),
        };
        self.dispatch_script_targeted(&message.target_script_id, event).await;
    }

    /// On script termination: remove all listens, clear all timers,
    /// unregister from the message bus, and drop the container index entry.
    pub fn cleanup_script(&mut self, script_id: &str, timers: &mut TimerManager, bus: &mut LinkMessageBus) {
        if let Some(handles) = self.listens_by_script.remove(script_id) {
            for handle in handles {
                self.listens_by_handle.remove(&handle);
            }
            for handles in self.listens_by_channel.values_mut() {
                handles.retain(|h| self.listens_by_handle.contains_key(h));
            }
        }
        timers.cleanup_script(script_id);
        bus.cleanup_script(script_id);
        if let Some(container_id) = self.script_container.remove(script_id) {
            if let Some(scripts) = self.container_index.get_mut(&container_id) {
                scripts.retain(|s| s != script_id);
            }
        }
    }
}

fn matches_filter(filter: &Option<String>, value: &str) -> bool {
    match filter {
        None => true,
        Some(f) if f.is_empty() => true,
        Some(f) => f == value,
    }
}

fn remove_handle(map: &mut FxHashMap<i32, Vec<u64>>, key: i32, handle: u64) {
    if let Some(list) = map.get_mut(&key) {
        list.retain(|h| *h != handle);
    }
}

fn remove_handle_by_key(map: &mut FxHashMap<String, Vec<u64>>, key: &str, handle: u64) {
    if let Some(list) = map.get_mut(key) {
        list.retain(|h| *h != handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuntimeConfig;
    use crate::runtime::worker::ScriptExecutor;
    use rustc_hash::FxHashSet;

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

    async fn host() -> Arc<WorkerHost> {
        let host = Arc::new(WorkerHost::spawn(1, || NoopExecutor));
        host.init("s1", "c", "n", RuntimeConfig::default()).await;
        let _ = host.recv_outbound().await;
        host.init("s2", "c", "n", RuntimeConfig::default()).await;
        let _ = host.recv_outbound().await;
        host
    }

    #[test]
    fn listen_filter_semantics() {
        assert!(matches_filter(&Some(String::new()), "anything"));
        assert!(matches_filter(&None, "anything"));
        assert!(matches_filter(&Some("Bob".to_string()), "Bob"));
        assert!(!matches_filter(&Some("Bob".to_string()), "Alice"));
    }

    #[tokio::test]
    async fn dispatch_chat_targets_only_matching_listeners() {
        let host = host().await;
        let mut dispatcher = EventDispatcher::new(host);
        dispatcher.register_script("s1", "c1");
        dispatcher.register_script("s2", "c1");
        dispatcher.listen("s1", 0, Some("Bob".to_string()), None, None);
        dispatcher.listen("s2", 0, None, None, None);

        dispatcher.dispatch_chat(0, "Bob", "id1", "hi").await;
        dispatcher.dispatch_chat(0, "Alice", "id2", "hi").await;
    }

    #[tokio::test]
    async fn cleanup_removes_listens_and_container_membership() {
        let host = host().await;
        let mut dispatcher = EventDispatcher::new(host);
        let mut timers = TimerManager::new();
        let mut bus = LinkMessageBus::default();
        dispatcher.register_script("s1", "c1");
        dispatcher.listen("s1", 0, None, None, None);
        timers.set_timer("s1", 1.0, "default", 0);
        bus.register("s1", "c1", 0);

        dispatcher.cleanup_script("s1", &mut timers, &mut bus);

        assert!(!dispatcher.listens_by_script.contains_key("s1"));
        assert!(!timers.has_timer("s1", "default"));
        assert!(dispatcher.container_index.get("c1").is_none_or(|v| v.is_empty()));
    }
}
