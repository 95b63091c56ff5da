//! lookout-spk: spoken announcements with a visual fallback
//!
//! Provides:
//! - A speech engine capability with a single utterance event stream
//! - The voice unlock state machine for platforms that gate audio on a gesture
//! - Auto-expiring notifications used when speech is unavailable or fails

pub mod config;
pub mod engines;
pub mod error;
pub mod notifications;
pub mod unlock;

pub use config::{SpeechConfig, VoiceConfig};
pub use engines::{SpeechEngine, SpeechEvent, SpeechHandle, Utterance};
pub use error::SpeechError;
pub use notifications::{Notification, NotificationCenter};
pub use unlock::{Interaction, VoiceState, VoiceUnlock};
