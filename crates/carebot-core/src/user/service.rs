//! User service for identity information.
//!
//! The assistant only needs an optional display name, which personalizes
//! the prompt. Authentication stays with the host application.

/// Service for retrieving information about the current user.
pub trait UserService: Send + Sync {
    /// Returns the signed-in user's display name, if there is one.
    fn get_user_name(&self) -> Option<String>;
}

/// Anonymous user. Prompts carry no personalization.
///
/// # Example
///
/// ```
/// use carebot_core::user::{UserService, DefaultUserService};
///
/// let service = DefaultUserService::default();
/// assert_eq!(service.get_user_name(), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefaultUserService;

impl UserService for DefaultUserService {
    fn get_user_name(&self) -> Option<String> {
        None
    }
}

/// User with a fixed display name (e.g. from the CLI `--name` flag).
#[derive(Debug, Clone)]
pub struct StaticUserService {
    name: String,
}

impl StaticUserService {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl UserService for StaticUserService {
    fn get_user_name(&self) -> Option<String> {
        let trimmed = self.name.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
