use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::models::chat::{
    EscalationRequest, EscalationResponse, NewSessionRequest, NewSessionResponse, QueryRequest,
    QueryResponse, Session,
};
use crate::state::AppState;
use crate::utils::error::ApiError;

/// `POST /chat/new-session` — create a session seeded with the greeting.
/// `customer_name` rides in the query string, so the body may be empty.
pub async fn new_session(
    State(state): State<AppState>,
    Query(params): Query<NewSessionRequest>,
) -> Json<NewSessionResponse> {
    let customer_name = params.customer_name;
    let session_id = Uuid::new_v4().to_string();
    state
        .store
        .get_or_create(&session_id, customer_name, Utc::now());
    info!("Session {} created", session_id);

    Json(NewSessionResponse {
        session_id,
        message: "Session created".to_string(),
    })
}

/// `POST /chat/query` — one conversation turn.
pub async fn process_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    let outcome = state
        .engine
        .handle_query(
            &request.session_id,
            request.customer_name,
            &request.message,
            Utc::now(),
        )
        .await;

    Json(QueryResponse {
        session_id: request.session_id,
        response: outcome.response,
        escalated: outcome.escalated,
        escalation_reason: outcome.escalation_reason,
        message_count: outcome.message_count,
    })
}

/// `GET /chat/session/{session_id}` — full snapshot; touches `last_activity`.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Session>, ApiError> {
    let slot = state
        .store
        .get(&session_id)
        .ok_or_else(|| ApiError::NotFound("Session not found".to_string()))?;
    let mut session = slot.lock().await;
    session.touch(Utc::now());
    Ok(Json(session.clone()))
}

/// `POST /chat/escalate` — force the hand-off with a caller-supplied reason.
pub async fn escalate_session(
    State(state): State<AppState>,
    Json(request): Json<EscalationRequest>,
) -> Result<Json<EscalationResponse>, ApiError> {
    state
        .engine
        .force_escalate(&request.session_id, &request.reason, Utc::now())
        .await?;

    Ok(Json(EscalationResponse {
        session_id: request.session_id,
        status: "escalated".to_string(),
        message: "Your issue has been escalated to support.".to_string(),
    }))
}
