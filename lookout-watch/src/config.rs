//! Configuration for the detection watcher

use crate::cooldown::DEFAULT_COOLDOWN_MS;
use crate::error::WatchError;
use lookout_eye::VisionConfig;
use lookout_spk::SpeechConfig;
use serde::{Deserialize, Serialize};

/// Watcher configuration: cooldown plus the vision and speech sections
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Minimum time between announcements of the same class (milliseconds)
    pub cooldown_ms: u64,

    pub vision: VisionConfig,

    pub speech: SpeechConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            cooldown_ms: DEFAULT_COOLDOWN_MS,
            vision: VisionConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl WatchConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.cooldown_ms > 86_400_000 {
            return Err(WatchError::Config("Cooldown too large (max 24 hours)".to_string()));
        }

        self.vision.validate().map_err(WatchError::Config)?;
        self.speech.validate().map_err(WatchError::Config)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = WatchConfig::default();
        assert_eq!(config.cooldown_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_nested_errors_surface() {
        let mut config = WatchConfig::default();
        config.vision.poll_interval_ms = 0;
        assert!(matches!(config.validate(), Err(WatchError::Config(_))));

        let mut config = WatchConfig::default();
        config.speech.volume = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cooldown_bound() {
        let config = WatchConfig {
            cooldown_ms: 100_000_000,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
