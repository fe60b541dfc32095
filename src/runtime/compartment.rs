//! Compartment Host (C8): the hardened evaluation realm each script runs
//! in. The actual TSL evaluation happens in the out-of-scope host engine;
//! this module models the endowment set and lockdown/recovery contract the
//! host is required to honor, so the rest of the runtime can be built and
//! tested against it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// The curated subset of pure globals every compartment endows, regardless
/// of script.
pub const PURE_GLOBALS: &[&str] = &["Math", "JSON", "Date", "parseInt", "parseFloat", "encodeURIComponent", "decodeURIComponent"];

/// One-time, irreversible lockdown of a worker thread's intrinsics. Shared
/// across every compartment created on that thread afterward.
#[derive(Debug, Clone, Default)]
pub struct Lockdown {
    engaged: Arc<AtomicBool>,
}

impl Lockdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engages lockdown if not already engaged. Returns whether this call
    /// was the one that engaged it.
    pub fn engage(&self) -> bool {
        self.engaged.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}

/// The API surfaces endowed to a script's evaluation realm. Every property
/// access on these forwards `(scriptId, "namespace.method", args)` across
/// the worker boundary and awaits a correlated response; this type only
/// carries the identity needed to build that forwarding call, not live
/// references to host objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endowment {
    pub script_id: String,
    pub owner: String,
}

impl Endowment {
    pub fn new(script_id: impl Into<String>, owner: impl Into<String>) -> Self {
        Self { script_id: script_id.into(), owner: owner.into() }
    }
}

/// Per-script compartment state: its endowment, the class the evaluated
/// module exported, and whatever the `lockdown` its worker already engaged.
#[derive(Debug, Clone)]
pub struct Compartment {
    pub endowment: Endowment,
    pub lockdown: Lockdown,
    exported_class: Option<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CompartmentError {
    #[error("Script did not export a default class")]
    NoDefaultExport,
}

impl Compartment {
    /// Creates a compartment for `script_id`, engaging `lockdown` on first
    /// use (a no-op if the worker thread already engaged it for an earlier
    /// script sharing the realm).
    pub fn new(script_id: impl Into<String>, owner: impl Into<String>, lockdown: Lockdown) -> Self {
        lockdown.engage();
        Self { endowment: Endowment::new(script_id, owner), lockdown, exported_class: None }
    }

    /// Records what the evaluated module assigned to `__exports.default`.
    pub fn record_export(&mut self, class_name: Option<String>) {
        self.exported_class = class_name;
    }

    /// Script class recovery: the class the module exported, or an error
    /// if the module never populated `__exports.default`.
    pub fn recover_class(&self) -> Result<&str, CompartmentError> {
        self.exported_class.as_deref().ok_or(CompartmentError::NoDefaultExport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lockdown_engages_exactly_once() {
        let lockdown = Lockdown::new();
        assert!(lockdown.engage());
        assert!(!lockdown.engage());
        assert!(lockdown.is_engaged());
    }

    #[test]
    fn sharing_a_lockdown_across_compartments_does_not_re_engage() {
        let lockdown = Lockdown::new();
        let _c1 = Compartment::new("s1", "owner1", lockdown.clone());
        assert!(lockdown.is_engaged());
        let _c2 = Compartment::new("s2", "owner1", lockdown.clone());
        assert!(lockdown.is_engaged());
    }

    #[test]
    fn missing_default_export_is_reported() {
        let compartment = Compartment::new("s1", "owner1", Lockdown::new());
        assert_eq!(compartment.recover_class(), Err(CompartmentError::NoDefaultExport));
    }

    #[test]
    fn recovers_the_exported_class_name() {
        let mut compartment = Compartment::new("s1", "owner1", Lockdown::new());
        compartment.record_export(Some("Door".to_string()));
        assert_eq!(compartment.recover_class(), Ok("Door"));
    }
}
