//! Custom speech engine implementation
//! Lets embedders plug in their own speech backend through closures

use crate::engines::{SpeechEngine, SpeechEvent, SpeechHandle, Utterance};
use crate::error::SpeechError;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

type SpeakFn = dyn Fn(&Utterance) -> Result<Vec<SpeechEvent>, SpeechError> + Send + Sync;

/// Closure-backed speech engine.
///
/// The speak closure returns the events the utterance produces; they are
/// delivered on the handle in order, after which the stream ends.
pub struct CustomSpeechEngine {
    name: String,
    speak_fn: Arc<SpeakFn>,
    is_available_fn: Arc<dyn Fn() -> bool + Send + Sync>,
    requires_gesture: bool,
    cancels: AtomicUsize,
    spoken: AtomicUsize,
}

impl CustomSpeechEngine {
    pub fn new<F1, F2>(name: impl Into<String>, speak_fn: F1, is_available_fn: F2) -> Self
    where
        F1: Fn(&Utterance) -> Result<Vec<SpeechEvent>, SpeechError> + Send + Sync + 'static,
        F2: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            speak_fn: Arc::new(speak_fn),
            is_available_fn: Arc::new(is_available_fn),
            requires_gesture: false,
            cancels: AtomicUsize::new(0),
            spoken: AtomicUsize::new(0),
        }
    }

    /// Engine whose every utterance starts and completes
    pub fn always_succeeds(name: impl Into<String>) -> Self {
        Self::new(
            name,
            |_| Ok(vec![SpeechEvent::Started, SpeechEvent::Completed]),
            || true,
        )
    }

    /// Engine whose every utterance fails with the given reason
    pub fn always_fails(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self::new(name, move |_| Ok(vec![SpeechEvent::Failed(reason.clone())]), || true)
    }

    /// Mark audio as blocked until a user gesture
    pub fn with_gesture_lock(mut self, requires_gesture: bool) -> Self {
        self.requires_gesture = requires_gesture;
        self
    }

    /// Number of times `cancel` was called
    pub fn cancel_count(&self) -> usize {
        self.cancels.load(Ordering::SeqCst)
    }

    /// Number of utterances accepted by `speak`
    pub fn spoken_count(&self) -> usize {
        self.spoken.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechEngine for CustomSpeechEngine {
    async fn speak(&self, utterance: &Utterance) -> Result<SpeechHandle, SpeechError> {
        if utterance.text.is_empty() {
            return Err(SpeechError::Engine("Text cannot be empty".to_string()));
        }

        let events = (self.speak_fn)(utterance)?;
        self.spoken.fetch_add(1, Ordering::SeqCst);

        let (sender, handle) = SpeechHandle::channel();
        for event in events {
            sender.send(event);
        }
        Ok(handle)
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }

    fn is_available(&self) -> bool {
        (self.is_available_fn)()
    }

    fn requires_gesture(&self) -> bool {
        self.requires_gesture
    }

    fn name(&self) -> &str {
        &self.name
    }
}
