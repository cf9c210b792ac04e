//! Shared application state held by request handlers.

use std::sync::Arc;

use custody_ledger::cipher::EvidenceCipher;
use custody_ledger::{Ed25519FileSigner, EvidenceStore, Ledger};
use tokio::sync::Mutex;

use crate::auth::IdentityProvider;
use crate::config::ApiConfig;

/// Shared state held by request handlers. This is wrapped in an [`Arc`] and
/// passed through Axum's `State` extractor.
pub struct AppState {
    /// Single-writer ledger; every append/endorse takes its own
    /// exclusive file lock, but handler-level serialization through this
    /// mutex keeps tx_id allocation and testing simpler.
    pub ledger: Mutex<Ledger<Ed25519FileSigner>>,
    pub store: EvidenceStore,
    pub cipher: Option<EvidenceCipher>,
    pub identity: IdentityProvider,
}

/// Thread-safe alias for `AppState`.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: &ApiConfig) -> Result<Self, custody_ledger::LedgerError> {
        let signer = Ed25519FileSigner::new(&config.ledger.base_dir)?;
        let ledger = Ledger::open(&config.ledger.ledger_path, signer)?;
        let store = EvidenceStore::open(&config.ledger.db_path, &config.ledger.evidence_store_dir)?;
        let cipher = if config.ledger.encryption_enabled {
            Some(EvidenceCipher::new(&config.ledger.base_dir)?)
        } else {
            None
        };

        Ok(Self {
            ledger: Mutex::new(ledger),
            store,
            cipher,
            identity: IdentityProvider::new(),
        })
    }
}
