//! Filesystem layout configuration.
//!
//! Everything the ledger, evidence store, key manager, and cipher touch on
//! disk hangs off a single `base_dir`, mirroring the persisted-state layout:
//! `data/ledger.jsonl`, `data/sentinel.db`, `data/keys/`, `evidence_store/`.

use std::path::{Path, PathBuf};

/// Resolved paths for one custody-ledger instance.
#[derive(Clone, Debug)]
pub struct LedgerConfig {
    pub base_dir: PathBuf,
    pub data_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub db_path: PathBuf,
    pub evidence_store_dir: PathBuf,
    pub encryption_enabled: bool,
}

impl LedgerConfig {
    /// Derives the standard layout rooted at `base_dir`.
    pub fn new(base_dir: impl Into<PathBuf>, encryption_enabled: bool) -> Self {
        let base_dir = base_dir.into();
        let data_dir = base_dir.join("data");
        Self {
            ledger_path: data_dir.join("ledger.jsonl"),
            db_path: data_dir.join("sentinel.db"),
            evidence_store_dir: base_dir.join("evidence_store"),
            data_dir,
            base_dir,
            encryption_enabled,
        }
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_dir.join("keys")
    }
}

impl Default for LedgerConfig {
    /// Defaults to `./sentinel-data`, with encryption disabled (an opt-in
    /// concern per component C5).
    fn default() -> Self {
        Self::new(default_base_dir(), false)
    }
}

fn default_base_dir() -> PathBuf {
    Path::new(".").join("sentinel-data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_standard_layout() {
        let cfg = LedgerConfig::new("/srv/sentinel", true);
        assert_eq!(cfg.ledger_path, Path::new("/srv/sentinel/data/ledger.jsonl"));
        assert_eq!(cfg.db_path, Path::new("/srv/sentinel/data/sentinel.db"));
        assert_eq!(cfg.evidence_store_dir, Path::new("/srv/sentinel/evidence_store"));
        assert_eq!(cfg.keys_dir(), Path::new("/srv/sentinel/data/keys"));
        assert!(cfg.encryption_enabled);
    }
}
