//! Process-wide record of which local models have already been checked.
//!
//! Entries are never invalidated: a model removed from the Ollama server while
//! the process runs is only re-detected after a restart.

use std::collections::HashMap;
use std::sync::RwLock;

/// Injected into the local client so tests can observe or pre-seed checks.
pub trait ModelAvailability: Send + Sync {
    fn is_checked(&self, model: &str) -> bool;

    /// Last writer wins. Concurrent first requests for the same model may
    /// both run the check; the outcome is the same either way.
    fn mark_checked(&self, model: &str);
}

#[derive(Debug, Default)]
pub struct ModelAvailabilityCache {
    checked: RwLock<HashMap<String, bool>>,
}

impl ModelAvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModelAvailability for ModelAvailabilityCache {
    fn is_checked(&self, model: &str) -> bool {
        let checked = self.checked.read().unwrap_or_else(|e| e.into_inner());
        checked.get(model).copied().unwrap_or(false)
    }

    fn mark_checked(&self, model: &str) {
        let mut checked = self.checked.write().unwrap_or_else(|e| e.into_inner());
        checked.insert(model.to_string(), true);
    }
}
