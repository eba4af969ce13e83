pub mod chat;

pub use chat::{ChatMessage, Message, Role, Session};
