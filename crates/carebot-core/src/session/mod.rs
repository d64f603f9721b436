//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `Message`)
//! - `model`: Transcript and request lifecycle (`Transcript`, `RequestState`)

mod message;
mod model;

pub use message::{Message, MessageRole};
pub use model::{RequestState, Transcript};
