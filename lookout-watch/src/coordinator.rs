//! Cooldown-gated announcement of filtered detections

use crate::cooldown::CooldownTracker;
use crate::dispatcher::{AnnouncementDispatcher, AnnouncementEvent, DispatchRoute};
use lookout_eye::Detection;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

/// An announcement together with the route it took
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub event: AnnouncementEvent,
    pub route: DispatchRoute,
}

/// Cooldown state of one label for status displays
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CooldownStatus {
    pub label: String,
    pub remaining_secs: u64,
    pub ready: bool,
}

/// Owns the cooldown registry and feeds allowed announcements to the dispatcher
pub struct AnnouncementCoordinator {
    cooldown: Mutex<CooldownTracker>,
    dispatcher: AnnouncementDispatcher,
}

impl AnnouncementCoordinator {
    pub fn new(cooldown: CooldownTracker, dispatcher: AnnouncementDispatcher) -> Self {
        Self {
            cooldown: Mutex::new(cooldown),
            dispatcher,
        }
    }

    pub fn dispatcher(&self) -> &AnnouncementDispatcher {
        &self.dispatcher
    }

    /// Announce `label` unless it is cooling down. The cooldown entry is
    /// recorded before dispatch so a slow utterance cannot let a duplicate through.
    pub fn announce(&self, label: &str, confidence_percent: u32, now_ms: u64) -> Option<Announcement> {
        let acquired = {
            let mut cooldown = self.cooldown.lock();
            if cooldown.try_acquire(label, now_ms) {
                None
            } else {
                Some(cooldown.remaining_ms(label, now_ms).unwrap_or(0))
            }
        };

        if let Some(remaining) = acquired {
            debug!(
                "Announcement cooldown: {} - {}s remaining",
                label,
                (remaining as f64 / 1000.0).round() as u64
            );
            return None;
        }

        let event = AnnouncementEvent::new(label, confidence_percent);
        let route = self.dispatcher.dispatch(&event);
        Some(Announcement { event, route })
    }

    /// Announce every detection of a filtered batch, in order
    pub fn announce_all(&self, detections: &[Detection], now_ms: u64) -> Vec<Announcement> {
        detections
            .iter()
            .filter_map(|d| self.announce(&d.label, d.confidence_percent(), now_ms))
            .collect()
    }

    /// Remaining cooldown per label, sorted by label
    pub fn cooldowns(&self, now_ms: u64) -> Vec<CooldownStatus> {
        let cooldown = self.cooldown.lock();
        cooldown
            .snapshot()
            .into_iter()
            .map(|(label, _)| {
                let remaining = cooldown.remaining_ms(&label, now_ms).unwrap_or(0);
                CooldownStatus {
                    ready: cooldown.should_announce(&label, now_ms),
                    remaining_secs: remaining.div_ceil(1000),
                    label,
                }
            })
            .collect()
    }
}
