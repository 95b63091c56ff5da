//! Object detection pipeline

use crate::config::VisionConfig;
use crate::detector::Detector;
use crate::error::VisionError;
use crate::frame::{Detection, Frame};
use crate::processing::filter::DetectionFilter;
use std::sync::Arc;
use tracing::debug;

/// Runs the detector on a frame and narrows the result to allowed classes
pub struct DetectionPipeline {
    detector: Arc<dyn Detector>,
    filter: DetectionFilter,
    max_detections: usize,
}

impl DetectionPipeline {
    pub fn new(detector: Arc<dyn Detector>, config: &VisionConfig) -> Self {
        Self {
            detector,
            filter: DetectionFilter::new(config.allowed_labels.iter().cloned()),
            max_detections: config.max_detections,
        }
    }

    pub fn filter(&self) -> &DetectionFilter {
        &self.filter
    }

    pub fn detector_name(&self) -> &str {
        self.detector.name()
    }

    /// Detect objects in a frame and keep the allowed ones
    pub async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        debug!("Running {} detector on {}x{} frame", self.detector.name(), frame.width(), frame.height());
        let raw = self.detector.detect(frame).await?;
        let raw = limit_detections(raw, self.max_detections);
        let relevant = self.filter.filter(&raw);
        debug!("Detected {} objects, {} relevant", raw.len(), relevant.len());
        Ok(relevant)
    }
}

/// Keep the `max` most confident detections, preserving their original order
fn limit_detections(detections: Vec<Detection>, max: usize) -> Vec<Detection> {
    if detections.len() <= max {
        return detections;
    }

    let mut ranked: Vec<usize> = (0..detections.len()).collect();
    ranked.sort_by(|&a, &b| {
        detections[b]
            .confidence
            .partial_cmp(&detections[a].confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(max);
    ranked.sort_unstable();

    ranked.into_iter().map(|i| detections[i].clone()).collect()
}
