use anyhow::Result;
use carebot_core::config::AppConfig;
use carebot_interaction::resolve_personas;
use colored::Colorize;

/// Lists the built-in and configured personas.
pub fn list(config: &AppConfig) -> Result<()> {
    for persona in resolve_personas(&config.personas) {
        println!(
            "{}  {}",
            format!("{:<10}", persona.id).bright_cyan(),
            persona.name.bold()
        );
        println!(
            "{}",
            format!(
                "            temperature {}, voice {} (rate {}, pitch {})",
                persona.temperature, persona.voice.language, persona.voice.rate, persona.voice.pitch
            )
            .bright_black()
        );
    }
    Ok(())
}
