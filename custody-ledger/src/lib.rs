//! Tamper-evident custody ledger for digital evidence: an append-only,
//! hash-chained, cryptographically signed log of custody events, coupled
//! with role- and organization-scoped authorization and a multi-party
//! endorsement protocol.
//!
//! This crate is the core (everything but HTTP transport); see the
//! `custody-api` crate for the service boundary.

pub mod canonical;
pub mod cipher;
pub mod config;
pub mod error;
pub mod hash;
pub mod ledger;
pub mod rbac;
pub mod reporting;
pub mod signing;
pub mod store;

pub use config::LedgerConfig;
pub use error::LedgerError;
pub use ledger::{ActionType, ChainValidation, EndorsementStatus, Ledger, LedgerEvent};
pub use rbac::{Action, Principal, Role};
pub use signing::{Ed25519FileSigner, Signer};
pub use store::{EvidenceRow, EvidenceStore};
