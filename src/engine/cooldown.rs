//! Cooldown Tracker
//!
//! Last-fired stamps keyed by a rule's position in the current rule list.
//! Positions are only meaningful within one load cycle, so the whole map
//! must be cleared on every reload; otherwise stamps for vanished rules
//! linger and newly loaded rules inherit another rule's cooldown.

use crate::rules::Rule;
use parking_lot::RwLock;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_fired: RwLock<HashMap<usize, u64>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff the rule fired less than `cooldown_seconds` ago.
    pub fn is_on_cooldown(&self, index: usize, rule: &Rule, now_ms: u64) -> bool {
        match self.last_fired.read().get(&index) {
            Some(&last) => {
                now_ms.saturating_sub(last) < (rule.cooldown_seconds * 1000.0) as u64
            }
            None => false,
        }
    }

    /// Record a firing. Called at schedule time, before any send delay, so
    /// the delay window cannot queue repeat sends for the same rule.
    pub fn mark_fired(&self, index: usize, now_ms: u64) {
        self.last_fired.write().insert(index, now_ms);
    }

    /// Drop every stamp. Accompanies every rule reload.
    pub fn clear(&self) {
        self.last_fired.write().clear();
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.last_fired.read().len()
    }
}
