pub mod engine;
pub mod escalation;
pub mod reaper;
pub mod store;

pub use engine::{ChatBackend, ConversationEngine, QueryOutcome};
pub use reaper::SessionReaper;
pub use store::SessionStore;
