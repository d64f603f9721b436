//! Outbound adapters for CareBot: prompt rendering, the Gemini client,
//! platform speech, and the built-in personas.

pub mod gemini_api_client;
pub mod presets;
pub mod prompt;
pub mod system_speech;

pub use gemini_api_client::GeminiApiClient;
pub use presets::{DADI_ID, DADI_PERSONA, TRIAGE_ID, TRIAGE_PERSONA, resolve_personas};
pub use prompt::render_prompt;
pub use system_speech::SystemSpeech;
