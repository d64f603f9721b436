//! Domain layer of CareBot.
//!
//! Holds the transcript and persona models, the speech state machine, and
//! the traits the outer crates implement (`ResponseClient`, `SpeechIo`,
//! `SecretService`, `UserService`, lookup services).

pub mod config;
pub mod error;
pub mod generation;
pub mod lookup;
pub mod persona;
pub mod secret;
pub mod session;
pub mod speech;
pub mod user;

// Re-export common error type
pub use error::CareError;
