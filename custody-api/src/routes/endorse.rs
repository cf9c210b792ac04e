use axum::Json;
use axum::extract::State;
use axum::http::HeaderMap;
use custody_ledger::Action;

use crate::dto::{EndorseRequest, EndorseResponse};
use crate::error::ApiError;
use crate::routes::authorize;
use crate::state::SharedState;

/// `POST /evidence/endorse`
pub async fn endorse(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<EndorseRequest>,
) -> Result<Json<EndorseResponse>, ApiError> {
    let principal = authorize(&state, &headers, Action::RecordEvent)?;

    // Ensure the evidence exists before touching the ledger (404, not 500).
    state.store.get(&req.evidence_id)?;

    let mut ledger = state.ledger.lock().await;
    let event = ledger.endorse_event(&req.tx_id, &req.evidence_id, &principal)?;

    Ok(Json(EndorseResponse {
        tx_id: event.tx_id,
        endorsed_tx_id: req.tx_id,
        evidence_id: req.evidence_id,
        endorser_user_id: event.actor_user_id,
        endorser_role: event.actor_role,
        endorser_org_id: event.actor_org_id,
        timestamp: event.timestamp,
    }))
}
