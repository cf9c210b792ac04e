//! Maps [`custody_ledger::LedgerError`] onto HTTP status codes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use custody_ledger::LedgerError;
use serde::Serialize;

/// Wrapper so `?` works in handlers that return `axum::response::Result`.
pub struct ApiError(pub LedgerError);

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        ApiError(e)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(e: std::io::Error) -> Self {
        ApiError(LedgerError::from(e))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LedgerError::NotFound(_) => StatusCode::NOT_FOUND,
            LedgerError::AuthRequired | LedgerError::AuthUnknown => StatusCode::UNAUTHORIZED,
            LedgerError::Forbidden => StatusCode::FORBIDDEN,
            LedgerError::DuplicateEndorsement => StatusCode::CONFLICT,
            LedgerError::ChainInvalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::CryptoFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            LedgerError::StorageFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}
