//! API gateway configuration.
//!
//! HTTP listen address plus the on-disk layout for the embedded
//! `custody-ledger` instance this process owns.

use std::net::SocketAddr;
use std::path::PathBuf;

use custody_ledger::LedgerConfig;

/// Configuration for the custody API HTTP server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP server to.
    pub listen_addr: SocketAddr,
    /// Filesystem layout for the ledger, evidence store, and key material.
    pub ledger: LedgerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let addr: SocketAddr = "0.0.0.0:8090"
            .parse()
            .expect("hard-coded API listen address should parse");
        let base_dir = std::env::var("SENTINEL_BASE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./sentinel-data"));
        let encryption_enabled = std::env::var("SENTINEL_ENCRYPT_EVIDENCE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Self {
            listen_addr: addr,
            ledger: LedgerConfig::new(base_dir, encryption_enabled),
        }
    }
}
