//! Announcement dispatch: speech first, notification as fallback

use lookout_spk::engines::SpeechEvent;
use lookout_spk::{NotificationCenter, SpeechConfig, VoiceUnlock};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// One announcement that passed the cooldown gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnouncementEvent {
    pub label: String,
    pub confidence_percent: u32,
    pub text: String,
}

impl AnnouncementEvent {
    pub fn new(label: impl Into<String>, confidence_percent: u32) -> Self {
        let label = label.into();
        let text = format!("{} detected with {} percent confidence", label, confidence_percent);
        Self {
            label,
            confidence_percent,
            text,
        }
    }

    /// Short form shown when the announcement cannot be spoken
    pub fn notification_message(&self) -> String {
        format!("🎯 {} detected ({}%)", self.label.to_uppercase(), self.confidence_percent)
    }
}

/// Channel an announcement was sent through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchRoute {
    /// Handed to the speech engine; a later failure still falls back to a notification
    Speech,
    /// Shown as a notification right away
    Notification,
}

pub struct AnnouncementDispatcher {
    config: Arc<SpeechConfig>,
    voice: Arc<VoiceUnlock>,
    notifications: NotificationCenter,
}

impl AnnouncementDispatcher {
    pub fn new(config: Arc<SpeechConfig>, voice: Arc<VoiceUnlock>, notifications: NotificationCenter) -> Self {
        Self {
            config,
            voice,
            notifications,
        }
    }

    /// Announce without blocking. Never fails: every problem degrades to the
    /// notification path, and a notification that cannot be shown is only logged.
    pub fn dispatch(&self, event: &AnnouncementEvent) -> DispatchRoute {
        let engine = match self.voice.engine() {
            Some(engine) if self.config.enabled && self.voice.is_unlocked() => engine.clone(),
            _ => {
                info!("Voice not available, showing notification: {}", event.text);
                self.notifications.push(event.notification_message());
                return DispatchRoute::Notification;
            }
        };

        engine.cancel();

        let utterance = self.config.announcement(event.text.clone());
        let fallback = event.notification_message();
        let notifications = self.notifications.clone();
        let delay = Duration::from_millis(self.config.speech_delay_ms);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let mut handle = match engine.speak(&utterance).await {
                Ok(handle) => handle,
                Err(e) => {
                    error!("Speech error: {}", e);
                    notifications.push(fallback);
                    return;
                }
            };

            while let Some(outcome) = handle.next_event().await {
                match outcome {
                    SpeechEvent::Started => debug!("Voice started: {}", utterance.text),
                    SpeechEvent::Completed => {
                        debug!("Voice announcement completed");
                        break;
                    }
                    SpeechEvent::Failed(reason) => {
                        warn!("Speech synthesis error: {}", reason);
                        notifications.push(fallback);
                        break;
                    }
                }
            }
        });

        info!("Detection announcement: {}", event.text);
        DispatchRoute::Speech
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn voice(&self) -> &Arc<VoiceUnlock> {
        &self.voice
    }
}
