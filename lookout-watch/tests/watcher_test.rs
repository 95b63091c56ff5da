//! Tests for the detection watcher cycle and polling loop

use async_trait::async_trait;
use image::RgbImage;
use lookout_eye::{
    BoundingBox, CameraStatus, Detection, Detector, Frame, FrameOrigin, FrameSource,
    ReplayDetector, SceneDetector, SyntheticFrameSource, VisionError,
};
use lookout_spk::engines::CustomSpeechEngine;
use lookout_spk::{Interaction, SpeechEngine, VoiceState};
use lookout_watch::{CycleReport, DetectionWatcher, DispatchRoute, WatchConfig, WatchError};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct SlowDetector;

#[async_trait]
impl Detector for SlowDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        tokio::time::sleep(Duration::from_millis(500)).await;
        Ok(vec![Detection::new("person", 0.8, BoundingBox::new(0.0, 0.0, 10.0, 10.0))])
    }

    fn name(&self) -> &str {
        "slow"
    }
}

struct BrokenDetector;

#[async_trait]
impl Detector for BrokenDetector {
    async fn detect(&self, _frame: &Frame) -> Result<Vec<Detection>, VisionError> {
        Err(VisionError::Detector("model not loaded".to_string()))
    }

    fn name(&self) -> &str {
        "broken"
    }
}

/// Camera-like source that only yields frames while open
#[derive(Default)]
struct ToggleSource {
    open: AtomicBool,
    opens: AtomicUsize,
    unavailable: AtomicBool,
}

#[async_trait]
impl FrameSource for ToggleSource {
    async fn open(&self) -> Result<(), VisionError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(VisionError::Camera("device unplugged".to_string()));
        }
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn current_frame(&self) -> Result<Frame, VisionError> {
        if !self.open.load(Ordering::SeqCst) {
            return Err(VisionError::Camera("not open".to_string()));
        }
        Ok(Frame::new(RgbImage::new(64, 48), FrameOrigin::Camera))
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn name(&self) -> &str {
        "toggle"
    }
}

fn watcher(detector: Arc<dyn Detector>, engine: Option<Arc<dyn SpeechEngine>>) -> DetectionWatcher {
    DetectionWatcher::new(
        WatchConfig::default(),
        Arc::new(SyntheticFrameSource::default()),
        CameraStatus::Error("No camera available".to_string()),
        detector,
        engine,
    )
    .unwrap()
}

fn det(label: &str, confidence: f32, bbox: BoundingBox) -> Detection {
    Detection::new(label, confidence, bbox)
}

#[tokio::test]
async fn test_scene_cycle_announces_both_classes() {
    let watcher = watcher(Arc::new(SceneDetector::default()), None);

    match watcher.run_once_at(0).await {
        CycleReport::Completed {
            detections,
            announcements,
        } => {
            assert_eq!(detections.len(), 2);
            let texts: Vec<_> = announcements.iter().map(|a| a.event.text.as_str()).collect();
            assert_eq!(
                texts,
                vec![
                    "person detected with 87 percent confidence",
                    "chair detected with 74 percent confidence"
                ]
            );
            assert!(announcements.iter().all(|a| a.route == DispatchRoute::Notification));
        }
        other => panic!("unexpected report {:?}", other),
    }

    assert_eq!(watcher.runs(), 1);
    assert_eq!(watcher.notifications().len(), 2);
}

#[tokio::test]
async fn test_irrelevant_classes_leave_overlay_empty() {
    let detector = ReplayDetector::new(vec![vec![det("dog", 0.95, BoundingBox::new(1.0, 1.0, 5.0, 5.0))]]);
    let watcher = watcher(Arc::new(detector), None);

    match watcher.run_once_at(0).await {
        CycleReport::Completed {
            detections,
            announcements,
        } => {
            assert!(detections.is_empty());
            assert!(announcements.is_empty());
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert!(watcher.overlay((640.0, 480.0)).is_empty());
    assert!(watcher.notifications().is_empty());
}

#[tokio::test]
async fn test_overlay_scales_latest_detections() {
    let detector = ReplayDetector::new(vec![vec![det("person", 0.85, BoundingBox::new(10.0, 20.0, 30.0, 40.0))]]);
    let watcher = watcher(Arc::new(detector), None);
    watcher.run_once_at(0).await;

    let boxes = watcher.overlay((1280.0, 480.0));
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].rect, BoundingBox::new(20.0, 20.0, 60.0, 40.0));
    assert_eq!(boxes[0].caption, "person (85%)");
}

#[tokio::test]
async fn test_detector_failure_clears_overlay() {
    let watcher = DetectionWatcher::new(
        WatchConfig::default(),
        Arc::new(SyntheticFrameSource::default()),
        CameraStatus::Connected,
        Arc::new(BrokenDetector),
        None,
    )
    .unwrap();

    match watcher.run_once_at(0).await {
        CycleReport::Completed {
            detections,
            announcements,
        } => {
            assert!(detections.is_empty());
            assert!(announcements.is_empty());
        }
        other => panic!("unexpected report {:?}", other),
    }
    assert!(watcher.latest_detections().is_empty());
}

#[tokio::test]
async fn test_zero_sized_frame_is_not_ready() {
    let watcher = DetectionWatcher::new(
        WatchConfig::default(),
        Arc::new(SyntheticFrameSource::new(0, 0)),
        CameraStatus::Connected,
        Arc::new(SceneDetector::default()),
        None,
    )
    .unwrap();

    assert_eq!(watcher.run_once_at(0).await, CycleReport::NotReady);
    assert_eq!(watcher.runs(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_cycle_is_skipped() {
    let watcher = watcher(Arc::new(SlowDetector), None);

    let (first, second) = tokio::join!(watcher.run_once_at(0), watcher.run_once_at(0));
    assert!(matches!(first, CycleReport::Completed { .. }));
    assert_eq!(second, CycleReport::InFlight);
    assert_eq!(watcher.runs(), 1);

    // the in-flight marker is released once the cycle ends
    assert!(matches!(watcher.run_once_at(100_000).await, CycleReport::Completed { .. }));
}

#[tokio::test]
async fn test_cooldown_spans_cycles() {
    let watcher = watcher(Arc::new(SceneDetector::default()), None);

    watcher.run_once_at(0).await;
    match watcher.run_once_at(3_000).await {
        CycleReport::Completed { announcements, .. } => assert!(announcements.is_empty()),
        other => panic!("unexpected report {:?}", other),
    }
    match watcher.run_once_at(33_000).await {
        CycleReport::Completed { announcements, .. } => assert_eq!(announcements.len(), 2),
        other => panic!("unexpected report {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_polling_loop_runs_after_initial_delay() {
    let watcher = watcher(Arc::new(SceneDetector::default()), None);
    watcher.start().await.unwrap();
    assert!(watcher.is_running());
    assert!(matches!(watcher.start().await, Err(WatchError::AlreadyRunning)));

    tokio::time::sleep(Duration::from_millis(2_900)).await;
    assert_eq!(watcher.runs(), 0);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(watcher.runs(), 1);

    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(watcher.runs(), 2);

    watcher.stop();
    assert!(!watcher.is_running());

    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(watcher.runs(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_gesture_unlocks_voice_for_announcements() {
    let engine = Arc::new(CustomSpeechEngine::always_succeeds("mobile").with_gesture_lock(true));
    let watcher = watcher(Arc::new(SceneDetector::default()), Some(engine.clone()));
    assert_eq!(watcher.status().voice_status, "Click to enable voice");

    assert_eq!(watcher.interact(Interaction::Click).await, VoiceState::Unlocked);
    assert_eq!(watcher.test_voice(), DispatchRoute::Speech);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert_eq!(engine.spoken_count(), 2);
    assert!(watcher.notifications().is_empty());
}

#[tokio::test]
async fn test_test_voice_ignores_cooldown() {
    let watcher = watcher(Arc::new(SceneDetector::default()), None);
    watcher.run_once_at(0).await;

    assert_eq!(watcher.test_voice(), DispatchRoute::Notification);
    let messages: Vec<_> = watcher
        .notifications()
        .active()
        .into_iter()
        .map(|n| n.message)
        .collect();
    assert_eq!(messages.last().map(String::as_str), Some("🎯 PERSON detected (85%)"));
}

#[tokio::test]
async fn test_status_serializes() {
    let watcher = watcher(Arc::new(SceneDetector::default()), None);
    watcher.run_once_at(0).await;

    let status = watcher.status();
    assert_eq!(status.voice, VoiceState::Unsupported);
    assert_eq!(status.source, "synthetic");
    assert_eq!(status.detector, "scene");

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["camera"]["state"], "error");
    assert_eq!(json["voice"], "unsupported");
    assert_eq!(json["voice_status"], "Voice: Not supported");
    assert_eq!(json["runs"], 1);
    assert_eq!(json["detections"].as_array().unwrap().len(), 2);
}

#[test]
fn test_invalid_config_rejected() {
    let mut config = WatchConfig::default();
    config.vision.allowed_labels.clear();
    let result = DetectionWatcher::new(
        config,
        Arc::new(SyntheticFrameSource::default()),
        CameraStatus::Requesting,
        Arc::new(SceneDetector::default()),
        None,
    );
    assert!(matches!(result, Err(WatchError::Config(_))));
}

#[tokio::test(start_paused = true)]
async fn test_restart_reopens_source() {
    let source = Arc::new(ToggleSource::default());
    let detector = ReplayDetector::new(vec![vec![det("chair", 0.7, BoundingBox::new(1.0, 1.0, 5.0, 5.0))]]);
    let watcher = DetectionWatcher::new(
        WatchConfig::default(),
        source.clone(),
        CameraStatus::Connected,
        Arc::new(detector),
        None,
    )
    .unwrap();

    watcher.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    assert_eq!(watcher.runs(), 1);

    watcher.stop();
    assert_eq!(watcher.run_once_at(0).await, CycleReport::NotReady);

    watcher.start().await.unwrap();
    assert_eq!(source.opens.load(Ordering::SeqCst), 2);
    tokio::time::sleep(Duration::from_millis(3_100)).await;
    assert_eq!(watcher.runs(), 2);
    watcher.stop();
}

#[tokio::test]
async fn test_start_fails_when_source_cannot_open() {
    let source = Arc::new(ToggleSource::default());
    source.unavailable.store(true, Ordering::SeqCst);
    let watcher = DetectionWatcher::new(
        WatchConfig::default(),
        source,
        CameraStatus::Connected,
        Arc::new(SceneDetector::default()),
        None,
    )
    .unwrap();

    assert!(matches!(watcher.start().await, Err(WatchError::Vision(_))));
    assert!(!watcher.is_running());
    assert!(matches!(watcher.camera_status(), CameraStatus::Error(_)));
}
