pub mod chat;
pub mod faq;
pub mod health;

use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::security;
use crate::state::AppState;

/// Assemble the full route table with CORS, tracing, the rate-limit gate,
/// and the blanket panic-to-500 handler.
pub fn build_router(state: AppState) -> Result<Router> {
    let allowed_origin = state
        .settings
        .cors
        .allowed_origin
        .parse::<HeaderValue>()
        .context("Invalid CORS origin")?;

    let router = Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/chat/new-session", post(chat::new_session))
        .route("/chat/query", post(chat::process_query))
        .route("/chat/session/{session_id}", get(chat::get_session))
        .route("/chat/escalate", post(chat::escalate_session))
        .route("/faqs", get(faq::all_faqs))
        .route("/faqs/{category}", get(faq::category_faqs))
        // Admission control wraps every route
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security::rate_limit::rate_limit_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origin)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CatchPanicLayer::new())
        .with_state(state);

    Ok(router)
}
