//! Speech through the espeak-ng / espeak command line synthesizer

use crate::config::SpeechConfig;
use crate::engines::{SpeechEngine, SpeechHandle, Utterance};
use crate::error::SpeechError;
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

const CANDIDATE_COMMANDS: &[&str] = &["espeak-ng", "espeak"];

/// espeak's own default speed in words per minute
const BASE_WPM: f32 = 175.0;

const MAX_TEXT_LENGTH: usize = 10_000;

/// Speaks by spawning a command line synthesizer per utterance.
///
/// Utterances are queued: one synthesizer runs at a time, in the order
/// `speak` was called. Only `cancel` interrupts, and it interrupts the running
/// utterance together with everything still queued.
pub struct CommandSpeechEngine {
    program: Option<String>,
    turn: Arc<Mutex<()>>,
    generation: watch::Sender<u64>,
}

impl CommandSpeechEngine {
    /// Locate the synthesizer, honouring the configured override
    pub fn new(config: &SpeechConfig) -> Self {
        let program = match config.command {
            Some(ref command) => probe(command).then(|| command.clone()),
            None => CANDIDATE_COMMANDS
                .iter()
                .find(|candidate| probe(candidate))
                .map(|candidate| candidate.to_string()),
        };

        match program {
            Some(ref p) => info!("Speech command {} available", p),
            None => warn!("No speech command found, speech unavailable"),
        }

        Self {
            program,
            turn: Arc::new(Mutex::new(())),
            generation: watch::channel(0).0,
        }
    }

    pub fn program(&self) -> Option<&str> {
        self.program.as_deref()
    }
}

fn probe(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Strip control characters and cap length; the text is passed as one argv entry
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .take(MAX_TEXT_LENGTH)
        .collect()
}

/// Command line arguments for an utterance (speed, amplitude, pitch, voice)
pub(crate) fn espeak_args(utterance: &Utterance, text: &str) -> Vec<String> {
    // Speed in words per minute, espeak accepts 80-450
    let speed = (BASE_WPM * utterance.rate).round().clamp(80.0, 450.0) as u32;
    // Amplitude 0-200
    let amplitude = (utterance.volume.clamp(0.0, 1.0) * 200.0).round() as u32;
    // Pitch 0-99 with 50 as normal; utterance pitch 1.0 is normal
    let pitch = (utterance.pitch.clamp(0.0, 2.0) * 50.0).round().min(99.0) as u32;
    let voice = utterance
        .voice
        .clone()
        .unwrap_or_else(|| utterance.language.to_lowercase());

    vec![
        "-s".to_string(),
        speed.to_string(),
        "-a".to_string(),
        amplitude.to_string(),
        "-p".to_string(),
        pitch.to_string(),
        "-v".to_string(),
        voice,
        "--".to_string(),
        text.to_string(),
    ]
}

#[async_trait]
impl SpeechEngine for CommandSpeechEngine {
    async fn speak(&self, utterance: &Utterance) -> Result<SpeechHandle, SpeechError> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| SpeechError::Unavailable("no speech command found".to_string()))?;

        let text = sanitize(&utterance.text);
        if text.trim().is_empty() {
            return Err(SpeechError::Engine("Text is empty after sanitization".to_string()));
        }

        let mut cancelled = self.generation.subscribe();
        cancelled.borrow_and_update();
        let (events, handle) = SpeechHandle::channel();

        let turn = tokio::select! {
            turn = self.turn.clone().lock_owned() => turn,
            _ = cancelled.changed() => {
                debug!("Queued utterance cancelled: {}", text);
                events.failed("interrupted");
                return Ok(handle);
            }
        };

        let mut child = Command::new(program)
            .args(espeak_args(utterance, &text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        events.started();
        debug!("Speaking via {}: {}", program, text);

        tokio::spawn(async move {
            let finished = tokio::select! {
                status = child.wait() => Some(status),
                _ = cancelled.changed() => None,
            };

            match finished {
                Some(Ok(status)) if status.success() => {
                    events.completed();
                }
                Some(Ok(status)) => {
                    events.failed(format!("synthesizer exited with {}", status));
                }
                Some(Err(e)) => {
                    events.failed(format!("synthesizer wait failed: {}", e));
                }
                None => {
                    let _ = child.kill().await;
                    events.failed("interrupted");
                }
            }
            drop(turn);
        });

        Ok(handle)
    }

    fn cancel(&self) {
        self.generation.send_modify(|generation| *generation = generation.wrapping_add(1));
    }

    fn is_available(&self) -> bool {
        self.program.is_some()
    }

    fn name(&self) -> &str {
        self.program.as_deref().unwrap_or("command")
    }
}
