//! Configuration for lookout-eye

use serde::{Deserialize, Serialize};

/// Vision pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    /// Interval between detection passes (milliseconds)
    pub poll_interval_ms: u64,
    /// Delay before the first detection pass (milliseconds)
    pub initial_delay_ms: u64,
    /// Class labels that are kept after detection
    pub allowed_labels: Vec<String>,
    /// Upper bound on raw detections considered per frame
    pub max_detections: usize,
    /// Resolution of the synthetic fallback scene (width, height)
    pub synthetic_resolution: (u32, u32),
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            initial_delay_ms: 3000,
            allowed_labels: vec!["person".to_string(), "chair".to_string()],
            max_detections: 100,
            synthetic_resolution: (640, 480),
        }
    }
}

impl VisionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_ms == 0 {
            return Err("Poll interval must be greater than 0".to_string());
        }

        if self.poll_interval_ms > 3_600_000 {
            return Err("Poll interval too large (max 1 hour)".to_string());
        }

        if self.initial_delay_ms > 3_600_000 {
            return Err("Initial delay too large (max 1 hour)".to_string());
        }

        if self.allowed_labels.is_empty() {
            return Err("At least one label must be allowed".to_string());
        }

        if self.allowed_labels.iter().any(|l| l.trim().is_empty()) {
            return Err("Allowed labels cannot be empty".to_string());
        }

        if self.max_detections == 0 || self.max_detections > 10_000 {
            return Err("Max detections must be between 1 and 10000".to_string());
        }

        let (width, height) = self.synthetic_resolution;
        if width == 0 || height == 0 {
            return Err("Synthetic resolution must be non-zero".to_string());
        }

        if width > 7680 || height > 4320 {
            return Err("Synthetic resolution too large (max 8K)".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = VisionConfig::default();
        assert_eq!(config.poll_interval_ms, 3000);
        assert_eq!(config.initial_delay_ms, 3000);
        assert_eq!(config.allowed_labels, vec!["person", "chair"]);
        assert_eq!(config.max_detections, 100);
        assert_eq!(config.synthetic_resolution, (640, 480));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_poll_interval_zero() {
        let mut config = VisionConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_labels() {
        let mut config = VisionConfig::default();
        config.allowed_labels.clear();
        assert!(config.validate().is_err());

        config.allowed_labels = vec!["person".to_string(), "  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_resolution() {
        let mut config = VisionConfig::default();
        config.synthetic_resolution = (0, 480);
        assert!(config.validate().is_err());

        config.synthetic_resolution = (7681, 4320);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: VisionConfig = serde_json::from_str(r#"{"poll_interval_ms": 500}"#).unwrap();
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.allowed_labels, vec!["person", "chair"]);
    }
}
