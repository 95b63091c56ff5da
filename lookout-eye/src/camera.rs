//! Frame sources and camera selection with synthetic fallback

use crate::error::VisionError;
use crate::frame::{Frame, FrameOrigin};
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn, error};

/// Capability that yields the current video frame
#[async_trait]
pub trait FrameSource: Send + Sync {
    /// Acquire the underlying device or file
    async fn open(&self) -> Result<(), VisionError>;

    /// Latest frame in native pixel space
    fn current_frame(&self) -> Result<Frame, VisionError>;

    /// Release the source
    fn close(&self) {}

    fn name(&self) -> &str;
}

/// Camera connection state as shown to the viewer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum CameraStatus {
    Requesting,
    Connected,
    Error(String),
}

impl CameraStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, CameraStatus::Connected)
    }
}

/// Still image replayed as if it were a camera feed
pub struct StillImageSource {
    path: PathBuf,
    name: String,
    image: RwLock<Option<RgbImage>>,
}

impl StillImageSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            name: format!("still:{}", path.display()),
            path,
            image: RwLock::new(None),
        }
    }
}

#[async_trait]
impl FrameSource for StillImageSource {
    async fn open(&self) -> Result<(), VisionError> {
        if self.image.read().is_some() {
            return Ok(());
        }

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                VisionError::PermissionDenied(format!("{}: {}", self.path.display(), e))
            } else {
                VisionError::Camera(format!("Failed to open {}: {}", self.path.display(), e))
            }
        })?;

        let decoded = image::load_from_memory(&bytes)?.to_rgb8();
        info!(
            "Still source {} opened at {}x{}",
            self.path.display(),
            decoded.width(),
            decoded.height()
        );
        *self.image.write() = Some(decoded);
        Ok(())
    }

    fn current_frame(&self) -> Result<Frame, VisionError> {
        let guard = self.image.read();
        let image = guard
            .as_ref()
            .ok_or_else(|| VisionError::Camera(format!("{} not opened", self.name)))?;
        Ok(Frame::new(image.clone(), FrameOrigin::Still))
    }

    fn close(&self) {
        *self.image.write() = None;
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Test scene used when no camera can be opened: a person block and a chair block
pub struct SyntheticFrameSource {
    scene: RgbImage,
}

const BACKGROUND: Rgb<u8> = Rgb([0x1a, 0x1a, 0x1a]);
const PERSON_FILL: Rgb<u8> = Rgb([0xff, 0x6b, 0x6b]);
const CHAIR_FILL: Rgb<u8> = Rgb([0x4e, 0xcd, 0xc4]);

/// Person block in the default 640x480 scene (x, y, width, height)
pub const SYNTHETIC_PERSON: (u32, u32, u32, u32) = (200, 150, 80, 200);
/// Chair block in the default 640x480 scene (x, y, width, height)
pub const SYNTHETIC_CHAIR: (u32, u32, u32, u32) = (350, 250, 100, 80);

impl SyntheticFrameSource {
    pub fn new(width: u32, height: u32) -> Self {
        let mut scene = RgbImage::from_pixel(width, height, BACKGROUND);
        fill_rect(&mut scene, SYNTHETIC_PERSON, PERSON_FILL);
        fill_rect(&mut scene, SYNTHETIC_CHAIR, CHAIR_FILL);
        Self { scene }
    }
}

impl Default for SyntheticFrameSource {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

fn fill_rect(image: &mut RgbImage, rect: (u32, u32, u32, u32), color: Rgb<u8>) {
    let (x, y, w, h) = rect;
    let x_end = x.saturating_add(w).min(image.width());
    let y_end = y.saturating_add(h).min(image.height());
    for py in y.min(y_end)..y_end {
        for px in x.min(x_end)..x_end {
            image.put_pixel(px, py, color);
        }
    }
}

#[async_trait]
impl FrameSource for SyntheticFrameSource {
    async fn open(&self) -> Result<(), VisionError> {
        Ok(())
    }

    fn current_frame(&self) -> Result<Frame, VisionError> {
        Ok(Frame::new(self.scene.clone(), FrameOrigin::Synthetic))
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Open the first candidate that succeeds, falling back to the synthetic scene.
///
/// Candidates are tried in order (preferred camera first). When every
/// candidate fails the returned status carries the last error message so the
/// viewer can surface it; a permission denial stops the search immediately
/// since the remaining devices sit behind the same permission.
pub async fn open_with_fallback(
    candidates: Vec<Arc<dyn FrameSource>>,
    fallback: Arc<dyn FrameSource>,
) -> (Arc<dyn FrameSource>, CameraStatus) {
    let mut last_error: Option<VisionError> = None;

    for candidate in candidates {
        match candidate.open().await {
            Ok(()) => {
                info!("Frame source {} connected", candidate.name());
                return (candidate, CameraStatus::Connected);
            }
            Err(e) => {
                let denied = e.is_permission_denied();
                warn!("Frame source {} failed: {}", candidate.name(), e);
                last_error = Some(e);
                if denied {
                    break;
                }
            }
        }
    }

    let message = last_error
        .map(|e| e.to_string())
        .unwrap_or_else(|| "No camera available".to_string());

    if let Err(e) = fallback.open().await {
        error!("Fallback source {} failed: {}", fallback.name(), e);
    } else {
        info!("Using {} source for demo", fallback.name());
    }

    (fallback, CameraStatus::Error(message))
}
