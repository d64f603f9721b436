//! Prompt rendering.
//!
//! A prompt is the persona's instructions, an optional line naming the user,
//! the labelled user utterance, and the persona's response guidance. The
//! utterance is inserted verbatim.

use carebot_core::error::{CareError, Result};
use carebot_core::persona::PersonaConfig;
use minijinja::{Environment, context};
use once_cell::sync::Lazy;

const PROMPT_TEMPLATE: &str = "{{ instructions }}

{% if user_name -%}
You are speaking with {{ user_name }}. Address them by name when it feels natural.

{% endif -%}
{{ label }}: {{ utterance }}
{%- if guidance %}

{{ guidance }}
{%- endif %}
";

// No auto-escaping: the template has no file extension.
static PROMPT_ENV: Lazy<Environment<'static>> = Lazy::new(Environment::new);

/// Renders the prompt sent to the generation backend for one user turn.
///
/// Deterministic and side-effect free; the same inputs always produce the
/// same string.
pub fn render_prompt(
    persona: &PersonaConfig,
    utterance: &str,
    user_name: Option<&str>,
) -> Result<String> {
    PROMPT_ENV
        .render_str(
            PROMPT_TEMPLATE,
            context! {
                instructions => persona.system_instructions.trim(),
                user_name => user_name,
                label => persona.utterance_label.as_str(),
                utterance => utterance,
                guidance => persona.response_guidance.trim(),
            },
        )
        .map_err(|e| CareError::prompt(format!("Failed to render prompt for '{}': {e}", persona.id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets::{DADI_PERSONA, TRIAGE_PERSONA};

    fn bare_persona() -> PersonaConfig {
        PersonaConfig {
            system_instructions: "Be kind.".into(),
            utterance_label: "User Message".into(),
            response_guidance: "Answer briefly.".into(),
            ..DADI_PERSONA.clone()
        }
    }

    #[test]
    fn test_exact_layout_without_user_name() {
        let prompt = render_prompt(&bare_persona(), "I feel dizzy", None).unwrap();
        assert_eq!(prompt, "Be kind.\n\nUser Message: I feel dizzy\n\nAnswer briefly.");
    }

    #[test]
    fn test_user_name_line_is_added() {
        let prompt = render_prompt(&bare_persona(), "hello", Some("Priya")).unwrap();
        assert_eq!(
            prompt,
            "Be kind.\n\nYou are speaking with Priya. Address them by name when it feels natural.\n\nUser Message: hello\n\nAnswer briefly."
        );
    }

    #[test]
    fn test_empty_guidance_is_omitted() {
        let persona = PersonaConfig {
            response_guidance: "   ".into(),
            ..bare_persona()
        };
        let prompt = render_prompt(&persona, "hi", None).unwrap();
        assert_eq!(prompt, "Be kind.\n\nUser Message: hi");
    }

    #[test]
    fn test_utterance_is_verbatim() {
        let utterance = "Pain <level 7/10> & \"sharp\" {{ not a tag }}\nsince Monday".repeat(50);
        let prompt = render_prompt(&TRIAGE_PERSONA, &utterance, None).unwrap();
        assert!(prompt.contains(&format!("User Symptoms: {utterance}")));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = render_prompt(&DADI_PERSONA, "I have a mild headache", Some("Ravi")).unwrap();
        let b = render_prompt(&DADI_PERSONA, "I have a mild headache", Some("Ravi")).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("You are Dadi"));
        assert!(a.contains("User Message: I have a mild headache"));
    }
}
