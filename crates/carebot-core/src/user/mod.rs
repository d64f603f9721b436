//! User domain module.

mod service;

pub use service::{DefaultUserService, StaticUserService, UserService};
