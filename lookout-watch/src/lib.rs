//! lookout-watch: periodic detection with cooldown-gated announcements
//!
//! Ties a frame source and detector from `lookout-eye` to the speech and
//! notification channels of `lookout-spk`:
//! - Per-class announcement cooldown
//! - Speech-first dispatch with a notification fallback
//! - The serialized polling loop and viewer status

pub mod config;
pub mod cooldown;
pub mod coordinator;
pub mod dispatcher;
pub mod error;
pub mod watcher;

pub use config::WatchConfig;
pub use cooldown::{CooldownTracker, DEFAULT_COOLDOWN_MS};
pub use coordinator::{Announcement, AnnouncementCoordinator, CooldownStatus};
pub use dispatcher::{AnnouncementDispatcher, AnnouncementEvent, DispatchRoute};
pub use error::WatchError;
pub use watcher::{CycleReport, DetectionWatcher, WatchStatus};
