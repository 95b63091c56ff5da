// Lookout Command Line Interface
// Live detection viewer: watches a frame source and announces people and chairs

use anyhow::Context;
use clap::{Parser, Subcommand};
use lookout_eye::{
    open_with_fallback, CameraStatus, Detector, FrameSource, ReplayDetector, SceneDetector,
    StillImageSource, SyntheticFrameSource,
};
use lookout_spk::engines::{CommandSpeechEngine, SpeechEvent};
use lookout_spk::{SpeechEngine, VoiceState, VoiceUnlock};
use lookout_watch::{AnnouncementEvent, CycleReport, DetectionWatcher, WatchConfig};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lookout")]
#[command(about = "Lookout - live person and chair detection with spoken announcements", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (TOML)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the detection loop
    Watch {
        /// Image files tried in order as camera sources
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        /// Recorded detection batches (JSON) replayed instead of the scene detector
        #[arg(long)]
        detections: Option<PathBuf>,

        /// Stop after this many seconds (default: until Ctrl-C)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Show notifications only
        #[arg(long)]
        no_voice: bool,

        /// Displayed frame size used for overlay boxes, e.g. 1280x960
        #[arg(long, value_parser = parse_size)]
        display: Option<(f32, f32)>,
    },

    /// Run a single detection pass and print the overlay as JSON
    Detect {
        #[arg(long = "image")]
        images: Vec<PathBuf>,

        #[arg(long)]
        detections: Option<PathBuf>,

        #[arg(long, value_parser = parse_size)]
        display: Option<(f32, f32)>,
    },

    /// Speak a sample announcement
    Speak,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Watch {
            images,
            detections,
            duration_secs,
            no_voice,
            display,
        } => {
            let watcher = build_watcher(config, images, detections.as_deref(), !no_voice).await?;
            watch(watcher, duration_secs, display).await?;
        }
        Commands::Detect {
            images,
            detections,
            display,
        } => {
            let watcher = build_watcher(config, images, detections.as_deref(), false).await?;
            detect_once(&watcher, display).await?;
        }
        Commands::Speak => {
            speak_sample(&config).await?;
        }
    }

    Ok(())
}

/// Read the TOML configuration, or the defaults when no file is given
fn load_config(path: Option<&Path>) -> anyhow::Result<WatchConfig> {
    let config = match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            parse_config(&text).with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => WatchConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn parse_config(text: &str) -> anyhow::Result<WatchConfig> {
    Ok(toml::from_str(text)?)
}

fn parse_size(value: &str) -> Result<(f32, f32), String> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {}", value))?;
    let w: f32 = w.trim().parse().map_err(|_| format!("invalid width {}", w))?;
    let h: f32 = h.trim().parse().map_err(|_| format!("invalid height {}", h))?;
    if w <= 0.0 || h <= 0.0 {
        return Err("display size must be positive".to_string());
    }
    Ok((w, h))
}

async fn build_watcher(
    config: WatchConfig,
    images: Vec<PathBuf>,
    detections: Option<&Path>,
    voice: bool,
) -> anyhow::Result<DetectionWatcher> {
    let candidates: Vec<Arc<dyn FrameSource>> = images
        .into_iter()
        .map(|path| Arc::new(StillImageSource::new(path)) as Arc<dyn FrameSource>)
        .collect();
    let (width, height) = config.vision.synthetic_resolution;
    let fallback: Arc<dyn FrameSource> = Arc::new(SyntheticFrameSource::new(width, height));

    let (source, status) = open_with_fallback(candidates, fallback).await;
    if let CameraStatus::Error(ref message) = status {
        warn!("Camera unavailable ({}), using {} source", message, source.name());
    }

    let detector: Arc<dyn Detector> = match detections {
        Some(path) => Arc::new(
            ReplayDetector::from_file(path)
                .await
                .with_context(|| format!("Failed to load detections {}", path.display()))?,
        ),
        None => Arc::new(SceneDetector::default()),
    };

    let engine: Option<Arc<dyn SpeechEngine>> = if voice && config.speech.enabled {
        Some(Arc::new(CommandSpeechEngine::new(&config.speech)))
    } else {
        None
    };

    Ok(DetectionWatcher::new(config, source, status, detector, engine)?)
}

async fn watch(
    watcher: DetectionWatcher,
    duration_secs: Option<u64>,
    display: Option<(f32, f32)>,
) -> anyhow::Result<()> {
    let status = watcher.status();
    println!("Camera: {:?}", status.camera);
    println!("{}", status.voice_status);

    watcher.start().await?;

    let deadline = async {
        match duration_secs {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut report = tokio::time::interval(Duration::from_secs(1));
    let mut last_runs = 0;

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = report.tick() => {
                if watcher.runs() == last_runs {
                    continue;
                }
                last_runs = watcher.runs();
                print_cycle(&watcher, display)?;
            }
        }
    }

    watcher.stop();
    println!("{}", serde_json::to_string_pretty(&watcher.status())?);
    Ok(())
}

fn print_cycle(watcher: &DetectionWatcher, display: Option<(f32, f32)>) -> anyhow::Result<()> {
    let status = watcher.status();
    if status.detections.is_empty() {
        println!("[{}] no relevant objects", status.runs);
    } else {
        let names: Vec<_> = status
            .detections
            .iter()
            .map(|d| format!("{} ({}%)", d.label, d.confidence_percent()))
            .collect();
        println!("[{}] {}", status.runs, names.join(", "));
    }

    if let Some(display) = display {
        println!("{}", serde_json::to_string(&watcher.overlay(display))?);
    }
    for notification in &status.notifications {
        println!("  {}", notification.message);
    }
    Ok(())
}

async fn detect_once(watcher: &DetectionWatcher, display: Option<(f32, f32)>) -> anyhow::Result<()> {
    match watcher.run_once().await {
        CycleReport::Completed { .. } => {}
        CycleReport::NotReady => anyhow::bail!("Frame source has no frame to analyze"),
        CycleReport::InFlight => anyhow::bail!("Detection already running"),
    }

    let display = display.unwrap_or_else(|| {
        let (w, h) = watcher.native_size();
        (w as f32, h as f32)
    });
    println!("{}", serde_json::to_string_pretty(&watcher.overlay(display))?);
    Ok(())
}

async fn speak_sample(config: &WatchConfig) -> anyhow::Result<()> {
    let event = AnnouncementEvent::new("person", 85);
    let engine: Arc<dyn SpeechEngine> = Arc::new(CommandSpeechEngine::new(&config.speech));
    let voice = VoiceUnlock::new(Some(engine.clone()), Arc::new(config.speech.clone()));

    if !config.speech.enabled || voice.probe() == VoiceState::Unsupported {
        println!("{}", voice.status_line());
        println!("{}", event.notification_message());
        return Ok(());
    }

    engine.cancel();
    tokio::time::sleep(Duration::from_millis(config.speech.speech_delay_ms)).await;

    let outcome = match engine.speak(&config.speech.announcement(event.text.clone())).await {
        Ok(handle) => handle.outcome().await,
        Err(e) => SpeechEvent::Failed(e.to_string()),
    };

    match outcome {
        SpeechEvent::Failed(reason) => {
            warn!("Speech synthesis error: {}", reason);
            println!("{}", event.notification_message());
        }
        _ => println!("{}", event.text),
    }
    Ok(())
}
