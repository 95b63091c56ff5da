//! Error types for lookout-eye

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Camera error: {0}")]
    Camera(String),

    #[error("Camera permission denied: {0}")]
    PermissionDenied(String),

    #[error("Detector error: {0}")]
    Detector(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VisionError {
    /// Whether recovering requires the user to change a permission setting
    pub fn is_permission_denied(&self) -> bool {
        match self {
            VisionError::PermissionDenied(_) => true,
            VisionError::Io(e) => e.kind() == std::io::ErrorKind::PermissionDenied,
            _ => false,
        }
    }
}
