//! Error types for lookout-watch

use lookout_eye::VisionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Vision error: {0}")]
    Vision(#[from] VisionError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Watcher is already running")]
    AlreadyRunning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_error_wraps_vision() {
        let err = WatchError::from(VisionError::Camera("no device".to_string()));
        assert_eq!(err.to_string(), "Vision error: Camera error: no device");
    }

    #[test]
    fn test_already_running_display() {
        assert_eq!(WatchError::AlreadyRunning.to_string(), "Watcher is already running");
    }
}
