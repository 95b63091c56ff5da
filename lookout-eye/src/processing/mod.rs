//! Detection post-processing

pub mod detection;
pub mod filter;
pub mod overlay;

pub use detection::DetectionPipeline;
pub use filter::DetectionFilter;
pub use overlay::{render, render_for_frame, OverlayBox, Scale};
