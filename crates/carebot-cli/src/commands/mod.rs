pub mod chat;
pub mod hospitals;
pub mod personas;
pub mod verify;
