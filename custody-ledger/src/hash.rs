//! Hashing and timestamp utilities.
//!
//! All content hashes in the custody ledger are SHA-256, rendered as
//! lowercase hex. Timestamps are RFC 3339 in UTC with microsecond
//! resolution, matching what the ledger writes into every event.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use sha2::{Digest, Sha256};

use crate::error::LedgerError;

/// Chunk size used when streaming a file through the hasher.
const HASH_CHUNK_SIZE: usize = 1024 * 1024;

/// Returns the lowercase hex SHA-256 digest of `data`.
pub fn sha256_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Returns the lowercase hex SHA-256 digest of the file at `path`,
/// streaming it in chunks so the whole file is never loaded into memory.
pub fn sha256_file(path: &Path) -> Result<String, LedgerError> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Returns the current UTC time as an RFC 3339 string with microsecond
/// resolution and an explicit `Z` suffix.
pub fn utcnow_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
