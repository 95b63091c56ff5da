//! Detector capability and the stand-in detectors shipped with the crate

use crate::camera::{SYNTHETIC_CHAIR, SYNTHETIC_PERSON};
use crate::error::VisionError;
use crate::frame::{BoundingBox, Detection, Frame, FrameOrigin};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::Path;
use tracing::debug;

/// Pretrained object detector treated as a black box
#[async_trait]
pub trait Detector: Send + Sync {
    /// Detect objects in a frame. Boxes are in the frame's native pixels.
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError>;

    fn name(&self) -> &str;
}

/// Replays recorded detection batches, one batch per call, wrapping around
pub struct ReplayDetector {
    batches: Vec<Vec<Detection>>,
    cursor: Mutex<usize>,
}

impl ReplayDetector {
    pub fn new(batches: Vec<Vec<Detection>>) -> Self {
        Self {
            batches,
            cursor: Mutex::new(0),
        }
    }

    /// Load batches from a JSON array of arrays of detections
    pub fn from_json(json: &str) -> Result<Self, VisionError> {
        let batches: Vec<Vec<Detection>> = serde_json::from_str(json)?;
        if batches.is_empty() {
            return Err(VisionError::Detector("replay contains no detection batches".to_string()));
        }
        Ok(Self::new(batches))
    }

    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, VisionError> {
        let json = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json(&json)
    }

    pub fn batch_count(&self) -> usize {
        self.batches.len()
    }
}

#[async_trait]
impl Detector for ReplayDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        if self.batches.is_empty() {
            return Ok(Vec::new());
        }

        let index = {
            let mut cursor = self.cursor.lock();
            let index = *cursor % self.batches.len();
            *cursor = cursor.wrapping_add(1);
            index
        };
        debug!("Replaying detection batch {}", index);
        Ok(self.batches[index].clone())
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Reports the objects painted into the synthetic test scene.
///
/// Frames from any other origin yield no detections.
pub struct SceneDetector {
    person_confidence: f32,
    chair_confidence: f32,
}

impl SceneDetector {
    pub fn new(person_confidence: f32, chair_confidence: f32) -> Self {
        Self {
            person_confidence,
            chair_confidence,
        }
    }
}

impl Default for SceneDetector {
    fn default() -> Self {
        Self::new(0.87, 0.74)
    }
}

/// Clip a scene block to the frame; `None` when nothing of it is visible
fn visible_bbox(rect: (u32, u32, u32, u32), width: u32, height: u32) -> Option<BoundingBox> {
    let (x, y, w, h) = rect;
    let x_end = x.saturating_add(w).min(width);
    let y_end = y.saturating_add(h).min(height);
    if x >= x_end || y >= y_end {
        return None;
    }
    Some(BoundingBox::new(
        x as f32,
        y as f32,
        (x_end - x) as f32,
        (y_end - y) as f32,
    ))
}

#[async_trait]
impl Detector for SceneDetector {
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        if frame.origin != FrameOrigin::Synthetic {
            return Ok(Vec::new());
        }

        let (width, height) = frame.dimensions();
        let objects = [
            ("person", self.person_confidence, SYNTHETIC_PERSON),
            ("chair", self.chair_confidence, SYNTHETIC_CHAIR),
        ];

        Ok(objects
            .into_iter()
            .filter_map(|(label, confidence, rect)| {
                visible_bbox(rect, width, height).map(|bbox| Detection::new(label, confidence, bbox))
            })
            .collect())
    }

    fn name(&self) -> &str {
        "scene"
    }
}
