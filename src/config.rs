//! Runtime configuration: resource caps and tick cadence, loadable from a
//! TOML file for the `lslc bundle` host binary.

use serde::Deserialize;

/// Resource caps and scheduling knobs shared across the runtime components.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Per-evaluation loop iteration cap enforced by [`crate::sandbox`]'s
    /// injected `__checkLoop`. Spec default: 100 000.
    pub max_iterations: u32,
    /// Call-depth cap enforced by the `__checkCall` convention. Spec
    /// default: 32.
    pub max_call_depth: u32,
    /// Per-recipient Link Message Bus queue cap. Spec default: 64.
    pub link_queue_cap: usize,
    /// Timer Manager fallback tick period when no frame-rate clock is
    /// available. Spec default: ~16ms.
    pub timer_tick_ms: u64,
    /// Number of Worker Host execution contexts.
    pub worker_count: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            max_call_depth: 32,
            link_queue_cap: 64,
            timer_tick_ms: 16,
            worker_count: 4,
        }
    }
}

impl RuntimeConfig {
    /// Parses a `RuntimeConfig` from TOML text, falling back to
    /// [`Default`] values for any field the caller leaves out.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_caps() {
        let c = RuntimeConfig::default();
        assert_eq!(c.max_iterations, 100_000);
        assert_eq!(c.max_call_depth, 32);
        assert_eq!(c.link_queue_cap, 64);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let c = RuntimeConfig::from_toml("max_call_depth = 16\n").unwrap();
        assert_eq!(c.max_call_depth, 16);
        assert_eq!(c.max_iterations, 100_000);
    }
}
