//! Error taxonomy for the custody ledger.
//!
//! Each variant carries a stable, user-visible meaning. Integrity mismatches
//! are never represented here because they are recorded inside a
//! [`crate::ledger::LedgerEvent`], not raised as errors.

use thiserror::Error;

/// Errors that can be returned by any `custody-ledger` operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Evidence or transaction id is unknown.
    #[error("not found: {0}")]
    NotFound(String),

    /// No principal was supplied for a request that requires one.
    #[error("authentication required")]
    AuthRequired,

    /// The supplied principal does not correspond to a known identity.
    #[error("unknown principal")]
    AuthUnknown,

    /// The principal's role does not permit the requested action.
    #[error("role not permitted to perform this action")]
    Forbidden,

    /// The same organization has already endorsed this transaction.
    #[error("duplicate endorsement from org")]
    DuplicateEndorsement,

    /// Hash-chain validation failed; carries the labelled reason.
    #[error("chain invalid: {0}")]
    ChainInvalid(String),

    /// Envelope decryption failed (MAC mismatch or malformed ciphertext).
    #[error("crypto failure: {0}")]
    CryptoFailure(String),

    /// Underlying storage (SQLite, filesystem) failure.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::StorageFailure(e.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::StorageFailure(e.to_string())
    }
}
