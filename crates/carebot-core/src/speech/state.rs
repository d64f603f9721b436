//! Speech I/O state machine.
//!
//! Listening and speaking are mutually exclusive. Every input is run through
//! [`transition`], which returns the next state plus the side effects the
//! caller must perform against its [`SpeechIo`](super::SpeechIo) adapter.
//!
//! ```text
//! state        | input                 | next          | effects
//! -------------+-----------------------+---------------+---------------------------------
//! Idle         | BeginListening(c)     | Listening(c)  | -
//! Speaking     | BeginListening(c)     | Listening(c)  | CancelPlayback
//! Listening(c) | EndListening(c)       | Idle          | -
//! Idle         | BeginPlayback(u)      | Speaking(u)   | StartPlayback(u)
//! Listening    | BeginPlayback(u)      | Speaking(u)   | StopListening, StartPlayback(u)
//! Speaking     | BeginPlayback(u)      | Speaking(u)   | CancelPlayback, StartPlayback(u)
//! Speaking     | StopPlayback          | Idle          | CancelPlayback
//! Speaking(u)  | Ended(u) / Failed(u)  | Idle          | -
//! ```
//!
//! Anything not listed leaves the state unchanged with no effects. That is
//! how stale playback events from a cancelled utterance, and the end of a
//! capture that was already superseded, are dropped.

use serde::{Deserialize, Serialize};

use super::io::SpeechEvent;

/// Current speech activity of a session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SpeechState {
    #[default]
    Idle,
    Listening { capture_id: u64 },
    Speaking { utterance_id: u64, text: String },
}

impl SpeechState {
    pub fn is_listening(&self) -> bool {
        matches!(self, SpeechState::Listening { .. })
    }

    pub fn is_speaking(&self) -> bool {
        matches!(self, SpeechState::Speaking { .. })
    }

    /// Text currently being read aloud, if any.
    pub fn speaking_text(&self) -> Option<&str> {
        match self {
            SpeechState::Speaking { text, .. } => Some(text),
            _ => None,
        }
    }
}

/// Inputs accepted by the speech state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechInput {
    BeginListening { capture_id: u64 },
    EndListening { capture_id: u64 },
    BeginPlayback { utterance_id: u64, text: String },
    StopPlayback,
    Playback(SpeechEvent),
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEffect {
    StopListening,
    CancelPlayback,
    StartPlayback { utterance_id: u64, text: String },
}

/// Computes the next state and the effects to run. Pure.
pub fn transition(state: &SpeechState, input: SpeechInput) -> (SpeechState, Vec<SpeechEffect>) {
    use SpeechEffect as E;
    use SpeechState as S;

    match (state, input) {
        (S::Idle, SpeechInput::BeginListening { capture_id }) => {
            (S::Listening { capture_id }, vec![])
        }
        (S::Speaking { .. }, SpeechInput::BeginListening { capture_id }) => {
            (S::Listening { capture_id }, vec![E::CancelPlayback])
        }
        (S::Listening { capture_id }, SpeechInput::EndListening { capture_id: ended })
            if *capture_id == ended =>
        {
            (S::Idle, vec![])
        }

        (current, SpeechInput::BeginPlayback { utterance_id, text }) => {
            let mut effects = match current {
                S::Idle => vec![],
                S::Listening { .. } => vec![E::StopListening],
                S::Speaking { .. } => vec![E::CancelPlayback],
            };
            effects.push(E::StartPlayback {
                utterance_id,
                text: text.clone(),
            });
            (S::Speaking { utterance_id, text }, effects)
        }

        (S::Speaking { .. }, SpeechInput::StopPlayback) => (S::Idle, vec![E::CancelPlayback]),

        (
            S::Speaking { utterance_id, .. },
            SpeechInput::Playback(SpeechEvent::Ended(id) | SpeechEvent::Failed(id)),
        ) if *utterance_id == id => (S::Idle, vec![]),

        (current, _) => (current.clone(), vec![]),
    }
}
