//! Platform speech adapter boundary.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persona::VoiceProfile;

/// What the platform can do, probed once when the adapter is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SpeechCapabilities {
    pub can_listen: bool,
    pub can_speak: bool,
}

/// Failure of a one-shot speech capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SpeechError {
    #[error("speech recognition is not supported on this platform")]
    Unsupported,
    #[error("no speech was detected")]
    NoSpeechDetected,
    #[error("microphone access was denied")]
    Denied,
}

/// Playback lifecycle notification, tagged with the utterance it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechEvent {
    Started(u64),
    Ended(u64),
    Failed(u64),
}

impl SpeechEvent {
    pub fn utterance_id(&self) -> u64 {
        match self {
            SpeechEvent::Started(id) | SpeechEvent::Ended(id) | SpeechEvent::Failed(id) => *id,
        }
    }
}

/// Callback receiving playback events. May be invoked from any thread.
pub type SpeechEventSink = Arc<dyn Fn(SpeechEvent) + Send + Sync>;

/// A single text-to-speech request.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub id: u64,
    pub text: String,
    pub voice: VoiceProfile,
}

/// Speech-to-text capture and text-to-speech playback.
///
/// `speak` must never overlap two utterances: if one is active it is
/// cancelled before the new one begins. Every started utterance eventually
/// emits exactly one of `Ended` or `Failed`, unless it was cancelled.
#[async_trait::async_trait]
pub trait SpeechIo: Send + Sync {
    fn capabilities(&self) -> SpeechCapabilities;

    /// Captures one utterance. Non-continuous: resolves with exactly one
    /// result or one failure.
    async fn listen_once(&self) -> Result<String, SpeechError>;

    /// Aborts an active capture; the pending `listen_once` resolves with
    /// [`SpeechError::NoSpeechDetected`].
    fn stop_listening(&self);

    fn speak(&self, utterance: Utterance, sink: SpeechEventSink);

    /// Stops playback immediately. No further events are emitted for the
    /// cancelled utterance.
    fn cancel(&self);
}

/// Adapter for platforms with no speech support at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSpeech;

#[async_trait::async_trait]
impl SpeechIo for NoSpeech {
    fn capabilities(&self) -> SpeechCapabilities {
        SpeechCapabilities::default()
    }

    async fn listen_once(&self) -> Result<String, SpeechError> {
        Err(SpeechError::Unsupported)
    }

    fn stop_listening(&self) {}

    fn speak(&self, utterance: Utterance, sink: SpeechEventSink) {
        sink(SpeechEvent::Failed(utterance.id));
    }

    fn cancel(&self) {}
}
