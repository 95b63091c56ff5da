//! Allow-list filtering of detections

use crate::frame::Detection;
use std::collections::HashSet;

/// Keeps only detections whose label is in a fixed allow-list
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    allowed: HashSet<String>,
}

impl DetectionFilter {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, label: &str) -> bool {
        self.allowed.contains(label)
    }

    /// Subsequence of `detections` with allowed labels, order preserved
    pub fn filter(&self, detections: &[Detection]) -> Vec<Detection> {
        detections
            .iter()
            .filter(|d| self.allows(&d.label))
            .cloned()
            .collect()
    }
}

impl Default for DetectionFilter {
    fn default() -> Self {
        Self::new(["person", "chair"])
    }
}
