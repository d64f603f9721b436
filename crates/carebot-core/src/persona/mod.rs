//! Persona domain module.

mod model;

pub use model::{PersonaConfig, VoiceProfile};
