//! Per-class announcement cooldown

use std::collections::HashMap;

/// Minimum time between two announcements of the same class
pub const DEFAULT_COOLDOWN_MS: u64 = 30_000;

/// Remembers when each class label was last announced.
///
/// One entry per label, never evicted. Entries only move forward in time.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    period_ms: u64,
    registry: HashMap<String, u64>,
}

impl CooldownTracker {
    pub fn new(period_ms: u64) -> Self {
        Self {
            period_ms,
            registry: HashMap::new(),
        }
    }

    pub fn period_ms(&self) -> u64 {
        self.period_ms
    }

    /// True if `label` was never announced or strictly more than the
    /// cooldown period has elapsed since its last announcement
    pub fn should_announce(&self, label: &str, now_ms: u64) -> bool {
        match self.registry.get(label) {
            None => true,
            Some(&last) => now_ms.saturating_sub(last) > self.period_ms,
        }
    }

    /// Record an announcement; an older timestamp never replaces a newer one
    pub fn record(&mut self, label: &str, now_ms: u64) {
        match self.registry.get_mut(label) {
            Some(last) => *last = (*last).max(now_ms),
            None => {
                self.registry.insert(label.to_string(), now_ms);
            }
        }
    }

    /// Check and record in one step
    pub fn try_acquire(&mut self, label: &str, now_ms: u64) -> bool {
        if !self.should_announce(label, now_ms) {
            return false;
        }
        self.record(label, now_ms);
        true
    }

    pub fn last_announced(&self, label: &str) -> Option<u64> {
        self.registry.get(label).copied()
    }

    /// Time left before `label` may be announced again (zero once elapsed)
    pub fn remaining_ms(&self, label: &str, now_ms: u64) -> Option<u64> {
        self.registry
            .get(label)
            .map(|&last| self.period_ms.saturating_sub(now_ms.saturating_sub(last)))
    }

    /// All entries, sorted by label
    pub fn snapshot(&self) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self
            .registry
            .iter()
            .map(|(label, &at)| (label.clone(), at))
            .collect();
        entries.sort();
        entries
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN_MS)
    }
}
