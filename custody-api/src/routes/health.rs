use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::HealthResponse;
use crate::state::SharedState;

/// `GET /health`
///
/// Returns liveness plus the current hash-chain validity. No principal is
/// required.
pub async fn health(State(state): State<SharedState>) -> (StatusCode, Json<HealthResponse>) {
    let ledger = state.ledger.lock().await;
    let validation = match ledger.validate_chain() {
        Ok(v) => v,
        Err(e) => {
            return (
                StatusCode::OK,
                Json(HealthResponse {
                    status: "ok",
                    ledger_chain_valid: false,
                    ledger: e.to_string(),
                }),
            );
        }
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok",
            ledger_chain_valid: validation.valid,
            ledger: validation.reason,
        }),
    )
}
