//! Projection of detection boxes into display space

use crate::frame::{BoundingBox, Detection};
use serde::{Deserialize, Serialize};

/// Displayed size divided by native size, per axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scale {
    pub x: f32,
    pub y: f32,
}

impl Scale {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// `None` when the native frame has a zero dimension
    pub fn from_sizes(displayed: (f32, f32), native: (u32, u32)) -> Option<Self> {
        if native.0 == 0 || native.1 == 0 {
            return None;
        }
        Some(Self {
            x: displayed.0 / native.0 as f32,
            y: displayed.1 / native.1 as f32,
        })
    }
}

/// One box to draw over the displayed frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayBox {
    pub rect: BoundingBox,
    pub caption: String,
}

/// Map detections to screen-space rectangles with captions
pub fn render(detections: &[Detection], scale: Scale) -> Vec<OverlayBox> {
    detections
        .iter()
        .map(|d| OverlayBox {
            rect: d.bbox.scaled(scale.x, scale.y),
            caption: format!("{} ({}%)", d.label, d.confidence_percent()),
        })
        .collect()
}

/// Render against a frame's native size; a zero-sized frame renders nothing
pub fn render_for_frame(
    detections: &[Detection],
    displayed: (f32, f32),
    native: (u32, u32),
) -> Vec<OverlayBox> {
    match Scale::from_sizes(displayed, native) {
        Some(scale) => render(detections, scale),
        None => Vec::new(),
    }
}
