use std::sync::Arc;

use crate::config::Settings;
use crate::security::RateLimiter;
use crate::services::conversation::{ConversationEngine, SessionStore};

/// Application state shared across handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<SessionStore>,
    pub engine: Arc<ConversationEngine>,
    pub rate_limiter: Arc<RateLimiter>,
    pub settings: Settings,
}
