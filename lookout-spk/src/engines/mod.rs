//! Speech engine capability and implementations

pub mod command;
pub mod custom;

use crate::error::SpeechError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

pub use command::CommandSpeechEngine;
pub use custom::CustomSpeechEngine;

/// Text plus voice settings for one utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub language: String,
    pub voice: Option<String>,
}

/// Lifecycle event of a spoken utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechEvent {
    Started,
    Completed,
    Failed(String),
}

impl SpeechEvent {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SpeechEvent::Started)
    }
}

/// Receiving end of an utterance's event stream
#[derive(Debug)]
pub struct SpeechHandle {
    events: mpsc::UnboundedReceiver<SpeechEvent>,
}

/// Sending end held by the engine while the utterance plays
#[derive(Debug, Clone)]
pub struct SpeechEventSender {
    events: mpsc::UnboundedSender<SpeechEvent>,
}

impl SpeechHandle {
    pub fn channel() -> (SpeechEventSender, SpeechHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        (SpeechEventSender { events: tx }, SpeechHandle { events: rx })
    }

    /// Next event, or `None` once the engine dropped the utterance
    pub async fn next_event(&mut self) -> Option<SpeechEvent> {
        self.events.recv().await
    }

    /// Wait for the terminal event. A stream that ends early counts as a failure.
    pub async fn outcome(mut self) -> SpeechEvent {
        while let Some(event) = self.next_event().await {
            if event.is_terminal() {
                return event;
            }
        }
        SpeechEvent::Failed("utterance dropped without completing".to_string())
    }
}

impl SpeechEventSender {
    /// Returns false once the listener is gone
    pub fn send(&self, event: SpeechEvent) -> bool {
        self.events.send(event).is_ok()
    }

    pub fn started(&self) -> bool {
        self.send(SpeechEvent::Started)
    }

    pub fn completed(&self) -> bool {
        self.send(SpeechEvent::Completed)
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.send(SpeechEvent::Failed(reason.into()))
    }
}

/// Speech synthesis capability.
///
/// `speak` returns as soon as the utterance is queued; success or failure is
/// reported only through the returned handle. An `Err` means the engine
/// refused the utterance outright.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    async fn speak(&self, utterance: &Utterance) -> Result<SpeechHandle, SpeechError>;

    /// Stop whatever is currently being spoken
    fn cancel(&self);

    /// Whether the platform has a usable speech capability
    fn is_available(&self) -> bool;

    /// Whether audio stays blocked until a user gesture in the current session
    fn requires_gesture(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}
