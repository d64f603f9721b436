//! Application layer for CareBot.
//!
//! Ties the domain types to the outbound adapters: an [`AssistantSession`]
//! runs one conversation, a [`SessionFactory`] creates sessions per persona.

pub mod assistant_session;
pub mod session_factory;

pub use assistant_session::{AssistantSession, RejectReason, SubmitOutcome, TurnFailure};
pub use session_factory::SessionFactory;
