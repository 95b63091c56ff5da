//! Detection watcher: polls the frame source, runs detection and announces

use crate::config::WatchConfig;
use crate::coordinator::{Announcement, AnnouncementCoordinator, CooldownStatus};
use crate::cooldown::CooldownTracker;
use crate::dispatcher::{AnnouncementDispatcher, DispatchRoute};
use crate::error::WatchError;
use chrono::Utc;
use lookout_eye::processing::render_for_frame;
use lookout_eye::{CameraStatus, Detection, DetectionPipeline, Detector, FrameSource, OverlayBox};
use lookout_spk::{
    Interaction, Notification, NotificationCenter, SpeechEngine, VoiceState, VoiceUnlock,
};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Outcome of one detection cycle
#[derive(Debug, Clone, PartialEq)]
pub enum CycleReport {
    /// Detection ran; `detections` replaced the overlay
    Completed {
        detections: Vec<Detection>,
        announcements: Vec<Announcement>,
    },
    /// Another cycle was still running, so this one was skipped
    InFlight,
    /// The source has no usable frame yet
    NotReady,
}

/// Snapshot of everything the viewer displays
#[derive(Debug, Clone, Serialize)]
pub struct WatchStatus {
    pub camera: CameraStatus,
    pub voice: VoiceState,
    pub voice_status: String,
    pub source: String,
    pub detector: String,
    pub running: bool,
    pub runs: u64,
    pub detections: Vec<Detection>,
    pub cooldowns: Vec<CooldownStatus>,
    pub notifications: Vec<Notification>,
}

#[derive(Default)]
struct LatestDetections {
    detections: Vec<Detection>,
    native: (u32, u32),
}

struct WatcherInner {
    config: WatchConfig,
    source: Arc<dyn FrameSource>,
    camera_status: RwLock<CameraStatus>,
    pipeline: DetectionPipeline,
    coordinator: AnnouncementCoordinator,
    voice: Arc<VoiceUnlock>,
    notifications: NotificationCenter,
    latest: RwLock<LatestDetections>,
    runs: AtomicU64,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs detection on a schedule and announces relevant objects
pub struct DetectionWatcher {
    inner: Arc<WatcherInner>,
    is_running: Arc<RwLock<bool>>,
    handle: RwLock<Option<JoinHandle<()>>>,
}

impl DetectionWatcher {
    /// `source` should already be opened (see `open_with_fallback`) and
    /// `camera_status` is what opening it reported.
    pub fn new(
        config: WatchConfig,
        source: Arc<dyn FrameSource>,
        camera_status: CameraStatus,
        detector: Arc<dyn Detector>,
        engine: Option<Arc<dyn SpeechEngine>>,
    ) -> Result<Self, WatchError> {
        config.validate()?;

        let speech = Arc::new(config.speech.clone());
        let notifications =
            NotificationCenter::new(Duration::from_millis(config.speech.notification_ttl_ms));
        let voice = Arc::new(VoiceUnlock::new(engine, speech.clone()));
        let dispatcher = AnnouncementDispatcher::new(speech, voice.clone(), notifications.clone());
        let coordinator =
            AnnouncementCoordinator::new(CooldownTracker::new(config.cooldown_ms), dispatcher);
        let pipeline = DetectionPipeline::new(detector, &config.vision);

        voice.probe();

        Ok(Self {
            inner: Arc::new(WatcherInner {
                config,
                source,
                camera_status: RwLock::new(camera_status),
                pipeline,
                coordinator,
                voice,
                notifications,
                latest: RwLock::new(LatestDetections::default()),
                runs: AtomicU64::new(0),
                in_flight: AtomicBool::new(false),
            }),
            is_running: Arc::new(RwLock::new(false)),
            handle: RwLock::new(None),
        })
    }

    /// Start the polling loop: one pass after the initial delay, then one per interval.
    ///
    /// The source is (re)opened first, so a watcher can be restarted after `stop`.
    pub async fn start(&self) -> Result<(), WatchError> {
        {
            let mut is_running = self.is_running.write();
            if *is_running {
                return Err(WatchError::AlreadyRunning);
            }
            *is_running = true;
        }

        if let Err(e) = self.inner.source.open().await {
            error!("Failed to open {}: {}", self.inner.source.name(), e);
            *self.inner.camera_status.write() = CameraStatus::Error(e.to_string());
            *self.is_running.write() = false;
            return Err(e.into());
        }

        let inner = self.inner.clone();
        let is_running = self.is_running.clone();
        let initial_delay = Duration::from_millis(inner.config.vision.initial_delay_ms);
        let poll_interval = Duration::from_millis(inner.config.vision.poll_interval_ms);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(initial_delay).await;

            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                if !*is_running.read() {
                    break;
                }
                inner.run_cycle(now_ms()).await;
            }
        });

        *self.handle.write() = Some(handle);
        info!(
            "Detection watcher started ({}ms interval, source {})",
            poll_interval.as_millis(),
            self.inner.source.name()
        );
        Ok(())
    }

    /// Stop the loop and release the frame source
    pub fn stop(&self) {
        {
            let mut is_running = self.is_running.write();
            if !*is_running {
                return;
            }
            *is_running = false;
        }

        if let Some(handle) = self.handle.write().take() {
            handle.abort();
        }
        self.inner.source.close();
        info!("Detection watcher stopped");
    }

    pub fn is_running(&self) -> bool {
        *self.is_running.read()
    }

    /// Run one detection cycle now
    pub async fn run_once(&self) -> CycleReport {
        self.inner.run_cycle(now_ms()).await
    }

    /// Run one detection cycle with an explicit clock reading (milliseconds)
    pub async fn run_once_at(&self, now_ms: u64) -> CycleReport {
        self.inner.run_cycle(now_ms).await
    }

    /// Forward a user gesture to the voice unlock
    pub async fn interact(&self, interaction: Interaction) -> VoiceState {
        self.inner.voice.on_interaction(interaction).await
    }

    /// Announce a sample person detection, bypassing the cooldown
    pub fn test_voice(&self) -> DispatchRoute {
        let event = crate::dispatcher::AnnouncementEvent::new("person", 85);
        self.inner.coordinator.dispatcher().dispatch(&event)
    }

    /// Overlay boxes for the latest detections at the given displayed size
    pub fn overlay(&self, displayed: (f32, f32)) -> Vec<OverlayBox> {
        let latest = self.inner.latest.read();
        render_for_frame(&latest.detections, displayed, latest.native)
    }

    /// Native size of the frame the latest detections came from
    pub fn native_size(&self) -> (u32, u32) {
        self.inner.latest.read().native
    }

    pub fn latest_detections(&self) -> Vec<Detection> {
        self.inner.latest.read().detections.clone()
    }

    pub fn camera_status(&self) -> CameraStatus {
        self.inner.camera_status.read().clone()
    }

    pub fn set_camera_status(&self, status: CameraStatus) {
        *self.inner.camera_status.write() = status;
    }

    pub fn voice(&self) -> &Arc<VoiceUnlock> {
        &self.inner.voice
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.inner.notifications
    }

    pub fn runs(&self) -> u64 {
        self.inner.runs.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> WatchStatus {
        let latest = self.inner.latest.read();
        WatchStatus {
            camera: self.camera_status(),
            voice: self.inner.voice.state(),
            voice_status: self.inner.voice.status_line().to_string(),
            source: self.inner.source.name().to_string(),
            detector: self.inner.pipeline.detector_name().to_string(),
            running: self.is_running(),
            runs: self.runs(),
            detections: latest.detections.clone(),
            cooldowns: self.inner.coordinator.cooldowns(now_ms()),
            notifications: self.inner.notifications.active(),
        }
    }
}

impl Drop for DetectionWatcher {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.write().take() {
            handle.abort();
        }
    }
}

impl WatcherInner {
    async fn run_cycle(&self, now_ms: u64) -> CycleReport {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Detection still running, skipping cycle");
            return CycleReport::InFlight;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let frame = match self.source.current_frame() {
            Ok(frame) if frame.is_ready() => frame,
            Ok(_) => {
                debug!("Frame not ready for detection");
                return CycleReport::NotReady;
            }
            Err(e) => {
                warn!("No frame from {}: {}", self.source.name(), e);
                return CycleReport::NotReady;
            }
        };

        let detections = match self.pipeline.detect(&frame).await {
            Ok(detections) => detections,
            Err(e) => {
                error!("Detection error: {}", e);
                Vec::new()
            }
        };

        *self.latest.write() = LatestDetections {
            detections: detections.clone(),
            native: frame.dimensions(),
        };
        self.runs.fetch_add(1, Ordering::SeqCst);

        if !detections.is_empty() {
            debug!(
                "Detected: {}",
                detections
                    .iter()
                    .map(|d| format!("{} ({}%)", d.label, d.confidence_percent()))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        let announcements = self.coordinator.announce_all(&detections, now_ms);
        CycleReport::Completed {
            detections,
            announcements,
        }
    }
}

fn now_ms() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
