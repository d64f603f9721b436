//! Speech domain module.
//!
//! - `io`: the platform adapter trait (`SpeechIo`) and its event types
//! - `state`: the explicit Idle/Listening/Speaking state machine

mod io;
mod state;

pub use io::{
    NoSpeech, SpeechCapabilities, SpeechError, SpeechEvent, SpeechEventSink, SpeechIo, Utterance,
};
pub use state::{SpeechEffect, SpeechInput, SpeechState, transition};
