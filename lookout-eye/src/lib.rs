//! lookout-eye: frame acquisition and detection overlay
//!
//! Acquires frames from a camera-like source (or the synthetic test scene),
//! hands them to a pluggable detector, narrows the results to the classes of
//! interest and projects their boxes into display space.

pub mod camera;
pub mod config;
pub mod detector;
pub mod error;
pub mod frame;
pub mod processing;

pub use camera::{open_with_fallback, CameraStatus, FrameSource, StillImageSource, SyntheticFrameSource};
pub use config::VisionConfig;
pub use detector::{Detector, ReplayDetector, SceneDetector};
pub use error::VisionError;
pub use frame::{BoundingBox, Detection, Frame, FrameOrigin};
pub use processing::{DetectionFilter, DetectionPipeline, OverlayBox, Scale};
