pub mod case;
pub mod endorse;
pub mod evidence;
pub mod health;

use axum::http::HeaderMap;
use custody_ledger::{Action, LedgerError, Principal};

use crate::error::ApiError;
use crate::state::SharedState;

/// Resolves the `X-User-Id` header into a [`Principal`] and checks it is
/// permitted to perform `action`. 401 on missing/unknown user, 403 on
/// disallowed action.
pub fn authorize(state: &SharedState, headers: &HeaderMap, action: Action) -> Result<Principal, ApiError> {
    let user_id = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or(LedgerError::AuthRequired)?;

    let principal = state
        .identity
        .resolve(user_id)
        .ok_or(LedgerError::AuthUnknown)?;

    if !custody_ledger::rbac::is_permitted(principal.role, action) {
        return Err(ApiError(LedgerError::Forbidden));
    }
    Ok(principal)
}
