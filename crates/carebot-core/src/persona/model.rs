//! Persona domain model.
//!
//! A persona is the fixed instruction template and tone configuration that
//! distinguishes one assistant variant from another. Sessions hold personas
//! behind an `Arc` and never mutate them.

use serde::{Deserialize, Serialize};

use crate::generation::GenerationParams;

/// Text-to-speech voice settings for a persona.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    /// BCP-47 language tag (e.g. `en-IN`)
    pub language: String,
    /// Playback rate, 1.0 is the platform default
    pub rate: f32,
    /// Playback pitch, 1.0 is the platform default
    pub pitch: f32,
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            rate: 1.0,
            pitch: 1.0,
        }
    }
}

/// Configuration of an assistant persona.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PersonaConfig {
    /// Stable identifier used on the command line and in config files
    pub id: String,
    /// Display name of the assistant
    pub name: String,
    /// Instructions placed before the user's text
    pub system_instructions: String,
    /// Label introducing the user's text in the prompt (e.g. "User Symptoms")
    #[serde(default = "default_utterance_label")]
    pub utterance_label: String,
    /// Instructions placed after the user's text
    #[serde(default)]
    pub response_guidance: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    /// First message of every fresh transcript
    pub greeting: String,
    /// Reply substituted whenever the generation call fails
    pub fallback_message: String,
    #[serde(default)]
    pub voice: VoiceProfile,
}

fn default_utterance_label() -> String {
    "User Message".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

impl PersonaConfig {
    /// Sampling parameters sent with every request for this persona.
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            temperature: self.temperature,
            top_k: self.top_k,
            top_p: self.top_p,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_persona_uses_defaults() {
        let toml_str = r#"
            id = "nurse"
            name = "Nurse Asha"
            system_instructions = "You are a community nurse."
            greeting = "Hello!"
            fallback_message = "Please see a nurse in person."
        "#;
        let persona: PersonaConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(persona.utterance_label, "User Message");
        assert_eq!(persona.top_k, 40);
        assert_eq!(persona.max_output_tokens, 1024);
        assert_eq!(persona.voice, VoiceProfile::default());
        assert!(persona.response_guidance.is_empty());
    }

    #[test]
    fn test_generation_params_mirror_persona() {
        let persona: PersonaConfig = toml::from_str(
            r#"
            id = "triage"
            name = "Triage"
            system_instructions = "x"
            greeting = "g"
            fallback_message = "f"
            temperature = 0.4
            top_p = 0.9
            "#,
        )
        .unwrap();

        let params = persona.generation_params();
        assert_eq!(params.temperature, 0.4);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.top_k, 40);
    }
}
