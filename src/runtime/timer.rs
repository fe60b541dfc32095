//! Timer Manager (C11): per-script named timers, driven by a deterministic
//! `tick(now)` so tests don't depend on wall-clock time.

use rustc_hash::FxHashMap;

const DEFAULT_TIMER_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
struct TimerEntry {
    interval_ms: u64,
    repeating: bool,
    next_fire_ms: u64,
}

/// One timer fire, as reported to the caller-supplied callback in [`TimerManager::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFire {
    pub script_id: String,
    pub timer_id: String,
}

/// Tracks every armed timer, keyed first by script then by timer id within
/// that script.
#[derive(Debug, Default)]
pub struct TimerManager {
    timers: FxHashMap<String, FxHashMap<String, TimerEntry>>,
    running: bool,
}

impl TimerManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a repeating timer, replacing any existing entry with the same
    /// `(scriptId, timerId)`.
    pub fn set_timer(&mut self, script_id: &str, interval_sec: f64, timer_id: &str, now_ms: u64) {
        let interval_ms = (interval_sec * 1000.0).max(0.0) as u64;
        self.timers.entry(script_id.to_string()).or_default().insert(
            timer_id.to_string(),
            TimerEntry { interval_ms, repeating: true, next_fire_ms: now_ms + interval_ms },
        );
    }

    /// Arms a one-shot timer that fires once and auto-removes.
    pub fn set_one_shot(&mut self, script_id: &str, delay_sec: f64, timer_id: &str, now_ms: u64) {
        let interval_ms = (delay_sec * 1000.0).max(0.0) as u64;
        self.timers.entry(script_id.to_string()).or_default().insert(
            timer_id.to_string(),
            TimerEntry { interval_ms, repeating: false, next_fire_ms: now_ms + interval_ms },
        );
    }

    pub fn clear_timer(&mut self, script_id: &str, timer_id: &str) {
        if let Some(scoped) = self.timers.get_mut(script_id) {
            scoped.remove(timer_id);
        }
    }

    pub fn clear_all_timers(&mut self, script_id: &str) {
        self.timers.remove(script_id);
    }

    pub fn has_timer(&self, script_id: &str, timer_id: &str) -> bool {
        self.timers.get(script_id).is_some_and(|scoped| scoped.contains_key(timer_id))
    }

    pub fn get_timer_ids(&self, script_id: &str) -> Vec<String> {
        self.timers.get(script_id).map(|scoped| scoped.keys().cloned().collect()).unwrap_or_default()
    }

    /// Drops every timer registered to `script_id`. Called by the Event
    /// Dispatcher on script termination; the manager holds only ids, never
    /// owning references to script instances.
    pub fn cleanup_script(&mut self, script_id: &str) {
        self.timers.remove(script_id);
    }

    /// Best-effort attach to a host clock; no-op here since the manager owns
    /// no threads of its own. Exposed so callers that do drive a clock have
    /// a consistent start/stop pair to call.
    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Advances every entry with `nextFire <= now`: fires once per pulse,
    /// then either advances `nextFire += intervalMs` (repeating) or marks
    /// for removal (one-shot). Removal happens after the full sweep.
    pub fn tick(&mut self, now_ms: u64) -> Vec<TimerFire> {
        let mut fires = Vec::new();
        let mut to_remove: Vec<(String, String)> = Vec::new();

        for (script_id, scoped) in self.timers.iter_mut() {
            for (timer_id, entry) in scoped.iter_mut() {
                if entry.next_fire_ms <= now_ms {
                    fires.push(TimerFire { script_id: script_id.clone(), timer_id: timer_id.clone() });
                    if entry.repeating {
                        entry.next_fire_ms += entry.interval_ms;
                    } else {
                        to_remove.push((script_id.clone(), timer_id.clone()));
                    }
                }
            }
        }

        for (script_id, timer_id) in to_remove {
            if let Some(scoped) = self.timers.get_mut(&script_id) {
                scoped.remove(&timer_id);
            }
        }

        fires
    }
}

pub const DEFAULT_TIMER: &str = DEFAULT_TIMER_ID;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_multiplicity_scenario() {
        let mut mgr = TimerManager::new();
        mgr.set_timer("X", 1.0, "a", 0);
        mgr.set_timer("X", 2.0, "b", 0);
        mgr.set_timer("X", 5.0, "c", 0);

        let fires_1 = mgr.tick(1100);
        assert_eq!(fires_1, vec![TimerFire { script_id: "X".to_string(), timer_id: "a".to_string() }]);

        let fires_2 = mgr.tick(2100);
        assert_eq!(fires_2.len(), 2);
        assert_eq!(fires_1.len() + fires_2.len(), 3);
        assert!(fires_2.iter().all(|f| f.script_id == "X"));
    }

    #[test]
    fn clear_all_timers_is_isolated_per_script() {
        let mut mgr = TimerManager::new();
        mgr.set_timer("A", 1.0, DEFAULT_TIMER, 0);
        mgr.set_timer("B", 1.0, DEFAULT_TIMER, 0);
        mgr.clear_all_timers("A");
        assert!(!mgr.has_timer("A", DEFAULT_TIMER));
        assert!(mgr.has_timer("B", DEFAULT_TIMER));

        let fires = mgr.tick(2000);
        assert_eq!(fires, vec![TimerFire { script_id: "B".to_string(), timer_id: DEFAULT_TIMER.to_string() }]);
    }

    #[test]
    fn one_shot_timer_fires_once_then_is_removed() {
        let mut mgr = TimerManager::new();
        mgr.set_one_shot("X", 0.5, "once", 0);
        assert_eq!(mgr.tick(600).len(), 1);
        assert!(!mgr.has_timer("X", "once"));
        assert_eq!(mgr.tick(10_000).len(), 0);
    }

    #[test]
    fn cleanup_script_purges_all_its_timers() {
        let mut mgr = TimerManager::new();
        mgr.set_timer("X", 1.0, DEFAULT_TIMER, 0);
        mgr.cleanup_script("X");
        assert!(mgr.get_timer_ids("X").is_empty());
    }
}
