//! Voice unlock state machine
//!
//! Some platforms refuse to emit audio until a user gesture has happened in
//! the current session. The first interaction plays a near-silent probe
//! utterance; once it reports `Started` the voice is unlocked for good.

use crate::config::SpeechConfig;
use crate::engines::{SpeechEngine, SpeechEvent};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceState {
    Unknown,
    Unsupported,
    Locked,
    Unlocked,
}

/// User gesture that may unlock audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interaction {
    Click,
    Tap,
    Key,
}

pub struct VoiceUnlock {
    engine: Option<Arc<dyn SpeechEngine>>,
    config: Arc<SpeechConfig>,
    state: RwLock<VoiceState>,
    probing: AtomicBool,
}

impl VoiceUnlock {
    pub fn new(engine: Option<Arc<dyn SpeechEngine>>, config: Arc<SpeechConfig>) -> Self {
        Self {
            engine,
            config,
            state: RwLock::new(VoiceState::Unknown),
            probing: AtomicBool::new(false),
        }
    }

    pub fn state(&self) -> VoiceState {
        *self.state.read()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state() == VoiceState::Unlocked
    }

    pub fn engine(&self) -> Option<&Arc<dyn SpeechEngine>> {
        self.engine.as_ref()
    }

    /// Resolve `Unknown` from the engine's capabilities; other states are kept
    pub fn probe(&self) -> VoiceState {
        let mut state = self.state.write();
        if *state != VoiceState::Unknown {
            return *state;
        }

        *state = match self.engine {
            Some(ref engine) if engine.is_available() => {
                if engine.requires_gesture() {
                    VoiceState::Locked
                } else {
                    VoiceState::Unlocked
                }
            }
            _ => VoiceState::Unsupported,
        };
        info!("Voice capability probed: {:?}", *state);
        *state
    }

    /// Handle a user gesture. Only a `Locked` voice reacts; the probe
    /// utterance decides whether it becomes `Unlocked`.
    pub async fn on_interaction(&self, interaction: Interaction) -> VoiceState {
        if self.probe() != VoiceState::Locked {
            return self.state();
        }

        let engine = match self.engine {
            Some(ref engine) => engine.clone(),
            None => return self.state(),
        };

        if self.probing.swap(true, Ordering::SeqCst) {
            debug!("Unlock probe already in flight, ignoring {:?}", interaction);
            return self.state();
        }

        debug!("Unlocking voice after {:?}", interaction);
        engine.cancel();
        tokio::time::sleep(Duration::from_millis(self.config.unlock_delay_ms)).await;

        let started = match engine.speak(&self.config.probe()).await {
            Ok(mut handle) => loop {
                match handle.next_event().await {
                    Some(SpeechEvent::Started) => break true,
                    Some(SpeechEvent::Failed(reason)) => {
                        warn!("Voice unlock probe failed: {}", reason);
                        break false;
                    }
                    Some(SpeechEvent::Completed) | None => break false,
                }
            },
            Err(e) => {
                warn!("Voice unlock probe rejected: {}", e);
                false
            }
        };

        if started {
            let mut state = self.state.write();
            if *state == VoiceState::Locked {
                *state = VoiceState::Unlocked;
                info!("Voice enabled");
            }
        }

        self.probing.store(false, Ordering::SeqCst);
        self.state()
    }

    /// Short status text for the viewer
    pub fn status_line(&self) -> &'static str {
        match self.state() {
            VoiceState::Unknown => "Voice: checking",
            VoiceState::Unsupported => "Voice: Not supported",
            VoiceState::Locked => "Click to enable voice",
            VoiceState::Unlocked => "Voice: ON",
        }
    }
}
