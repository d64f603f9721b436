use std::sync::Arc;

use carebot_core::error::{CareError, Result};
use carebot_core::generation::ResponseClient;
use carebot_core::persona::PersonaConfig;
use carebot_core::speech::SpeechIo;
use carebot_core::user::UserService;

use crate::assistant_session::AssistantSession;

/// Builds [`AssistantSession`]s for a fixed set of personas.
///
/// Every session it creates shares the same generation client, speech
/// adapter and user service.
pub struct SessionFactory {
    personas: Vec<Arc<PersonaConfig>>,
    user_service: Arc<dyn UserService>,
    client: Arc<dyn ResponseClient>,
    speech: Arc<dyn SpeechIo>,
}

impl SessionFactory {
    /// Creates a factory.
    ///
    /// # Arguments
    ///
    /// * `personas` - Available personas, in display order
    /// * `user_service` - Source of the display name used in prompts
    /// * `client` - Generation backend
    /// * `speech` - Platform speech adapter
    pub fn new(
        personas: Vec<PersonaConfig>,
        user_service: Arc<dyn UserService>,
        client: Arc<dyn ResponseClient>,
        speech: Arc<dyn SpeechIo>,
    ) -> Self {
        Self {
            personas: personas.into_iter().map(Arc::new).collect(),
            user_service,
            client,
            speech,
        }
    }

    pub fn personas(&self) -> impl Iterator<Item = &PersonaConfig> {
        self.personas.iter().map(|p| p.as_ref())
    }

    /// Starts a fresh session with the persona named `persona_id`.
    pub fn create(&self, persona_id: &str) -> Result<AssistantSession> {
        let persona = self
            .personas
            .iter()
            .find(|p| p.id == persona_id)
            .cloned()
            .ok_or_else(|| {
                let known: Vec<&str> = self.personas.iter().map(|p| p.id.as_str()).collect();
                CareError::validation(format!(
                    "Unknown persona '{persona_id}' (available: {})",
                    known.join(", ")
                ))
            })?;

        Ok(AssistantSession::new(
            persona,
            self.user_service.clone(),
            self.client.clone(),
            self.speech.clone(),
        ))
    }
}
