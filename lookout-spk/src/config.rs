//! Configuration for speech announcements

use crate::engines::Utterance;
use serde::{Deserialize, Serialize};

/// Speech announcement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak announcements at all; when off every announcement becomes a notification
    pub enabled: bool,

    /// Voice settings
    pub voice: VoiceConfig,

    /// Speech rate multiplier (0.1-10.0, 1.0 is normal)
    pub rate: f32,

    /// Pitch (0.0-2.0, 1.0 is normal)
    pub pitch: f32,

    /// Volume (0.0-1.0)
    pub volume: f32,

    /// Pause between cancelling the current utterance and speaking (ms)
    pub speech_delay_ms: u64,

    /// Pause before the unlock probe utterance (ms)
    pub unlock_delay_ms: u64,

    /// Text of the unlock probe utterance
    pub probe_text: String,

    /// Volume of the unlock probe utterance
    pub probe_volume: f32,

    /// How long a fallback notification stays visible (ms)
    pub notification_ttl_ms: u64,

    /// Speech command override (defaults to espeak-ng, then espeak)
    pub command: Option<String>,
}

/// Voice configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Voice name/identifier
    pub name: Option<String>,

    /// Language code (e.g., "en-US", "es-ES")
    pub language: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            voice: VoiceConfig::default(),
            rate: 0.7,
            pitch: 1.0,
            volume: 1.0,
            speech_delay_ms: 200,
            unlock_delay_ms: 100,
            probe_text: "Voice enabled".to_string(),
            probe_volume: 0.1,
            notification_ttl_ms: 3000,
            command: None,
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            name: None,
            language: "en-US".to_string(),
        }
    }
}

impl VoiceConfig {
    /// Validate voice configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.language.is_empty() {
            return Err("Language code cannot be empty".to_string());
        }

        if self.language.len() > 32 {
            return Err("Language code too long (max 32 chars)".to_string());
        }

        if !self.language.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err("Language code contains invalid characters (only alphanumeric and '-' allowed)".to_string());
        }

        if let Some(ref name) = self.name {
            if name.is_empty() {
                return Err("Voice name cannot be empty if provided".to_string());
            }

            if name.len() > 256 {
                return Err("Voice name too long (max 256 chars)".to_string());
            }

            if name.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("Voice name contains invalid characters".to_string());
            }
        }

        Ok(())
    }
}

impl SpeechConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0.1..=10.0).contains(&self.rate) {
            return Err("Speech rate must be between 0.1 and 10.0".to_string());
        }

        if !(0.0..=2.0).contains(&self.pitch) {
            return Err("Pitch must be between 0.0 and 2.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.volume) {
            return Err("Volume must be between 0.0 and 1.0".to_string());
        }

        if !(0.0..=1.0).contains(&self.probe_volume) {
            return Err("Probe volume must be between 0.0 and 1.0".to_string());
        }

        if self.probe_text.trim().is_empty() {
            return Err("Probe text cannot be empty".to_string());
        }

        if self.speech_delay_ms > 10_000 || self.unlock_delay_ms > 10_000 {
            return Err("Speech delays too large (max 10000 ms)".to_string());
        }

        if self.notification_ttl_ms == 0 {
            return Err("Notification TTL must be greater than 0".to_string());
        }

        if let Some(ref command) = self.command {
            if command.trim().is_empty() || command.chars().any(|c| c == '\0' || c.is_control()) {
                return Err("Speech command is invalid".to_string());
            }
        }

        self.voice.validate()
    }

    /// Utterance for a detection announcement
    pub fn announcement(&self, text: impl Into<String>) -> Utterance {
        Utterance {
            text: text.into(),
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            language: self.voice.language.clone(),
            voice: self.voice.name.clone(),
        }
    }

    /// Near-silent utterance used to unlock audio after a user gesture
    pub fn probe(&self) -> Utterance {
        Utterance {
            text: self.probe_text.clone(),
            rate: 1.0,
            pitch: 1.0,
            volume: self.probe_volume,
            language: self.voice.language.clone(),
            voice: self.voice.name.clone(),
        }
    }
}
