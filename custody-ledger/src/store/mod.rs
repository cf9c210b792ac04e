//! Evidence metadata store and content-addressed file storage.
//!
//! Metadata lives in a single-file SQLite database (`rusqlite`, bundled);
//! payload bytes live on disk under `<evidence_store_dir>/<evidence_id>/`.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::LedgerError;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS evidence (
    evidence_id TEXT PRIMARY KEY,
    case_id TEXT NOT NULL,
    description TEXT NOT NULL,
    source_device TEXT,
    acquisition_method TEXT NOT NULL,
    file_name TEXT NOT NULL,
    sha256 TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS evidence_file (
    evidence_id TEXT PRIMARY KEY,
    file_path TEXT NOT NULL,
    FOREIGN KEY (evidence_id) REFERENCES evidence(evidence_id)
);
";

/// A row in the `evidence` table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvidenceRow {
    pub evidence_id: String,
    pub case_id: String,
    pub description: String,
    pub source_device: Option<String>,
    pub acquisition_method: String,
    pub file_name: String,
    pub sha256: String,
    pub created_at: String,
}

/// Embedded relational store for evidence metadata, plus the on-disk
/// content-addressed payload layout.
pub struct EvidenceStore {
    db_path: PathBuf,
    evidence_store_dir: PathBuf,
}

impl EvidenceStore {
    /// Opens (creating if necessary) the evidence database at `db_path`,
    /// with payload files rooted at `evidence_store_dir`.
    pub fn open(db_path: &Path, evidence_store_dir: &Path) -> Result<Self, LedgerError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::create_dir_all(evidence_store_dir)?;

        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            db_path: db_path.to_path_buf(),
            evidence_store_dir: evidence_store_dir.to_path_buf(),
        })
    }

    fn connect(&self) -> Result<Connection, LedgerError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Writes `payload` to `<evidence_store_dir>/<evidence_id>/<file_name>`,
    /// create-exclusive: overwriting an existing payload is an error.
    pub fn write_payload(
        &self,
        evidence_id: &str,
        file_name: &str,
        payload: &[u8],
    ) -> Result<PathBuf, LedgerError> {
        let dir = self.evidence_store_dir.join(evidence_id);
        fs::create_dir_all(&dir)?;
        let path = dir.join(file_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| {
                LedgerError::StorageFailure(format!("evidence payload already exists or could not be created: {e}"))
            })?;
        file.write_all(payload)?;
        file.sync_all()?;
        Ok(path)
    }

    /// Inserts the evidence row and its file-path mapping in one
    /// transaction.
    pub fn insert_evidence(&self, row: &EvidenceRow, file_path: &Path) -> Result<(), LedgerError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO evidence
                (evidence_id, case_id, description, source_device, acquisition_method, file_name, sha256, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                row.evidence_id,
                row.case_id,
                row.description,
                row.source_device,
                row.acquisition_method,
                row.file_name,
                row.sha256,
                row.created_at,
            ],
        )?;
        tx.execute(
            "INSERT INTO evidence_file (evidence_id, file_path) VALUES (?1, ?2)",
            params![row.evidence_id, file_path.to_string_lossy()],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Fetches a single evidence row; fails with `NotFound` if absent.
    pub fn get(&self, evidence_id: &str) -> Result<EvidenceRow, LedgerError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT evidence_id, case_id, description, source_device, acquisition_method, file_name, sha256, created_at
             FROM evidence WHERE evidence_id = ?1",
            params![evidence_id],
            |r| {
                Ok(EvidenceRow {
                    evidence_id: r.get(0)?,
                    case_id: r.get(1)?,
                    description: r.get(2)?,
                    source_device: r.get(3)?,
                    acquisition_method: r.get(4)?,
                    file_name: r.get(5)?,
                    sha256: r.get(6)?,
                    created_at: r.get(7)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| LedgerError::NotFound(format!("evidence {evidence_id} not found")))
    }

    /// Returns all evidence rows for `case_id`, in arbitrary order; callers
    /// that need chronological order should sort by `created_at`.
    pub fn list_by_case(&self, case_id: &str) -> Result<Vec<EvidenceRow>, LedgerError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT evidence_id, case_id, description, source_device, acquisition_method, file_name, sha256, created_at
             FROM evidence WHERE case_id = ?1",
        )?;
        let rows = stmt
            .query_map(params![case_id], |r| {
                Ok(EvidenceRow {
                    evidence_id: r.get(0)?,
                    case_id: r.get(1)?,
                    description: r.get(2)?,
                    source_device: r.get(3)?,
                    acquisition_method: r.get(4)?,
                    file_name: r.get(5)?,
                    sha256: r.get(6)?,
                    created_at: r.get(7)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Returns the absolute payload path for `evidence_id`.
    pub fn get_file_path(&self, evidence_id: &str) -> Result<PathBuf, LedgerError> {
        let conn = self.connect()?;
        conn.query_row(
            "SELECT file_path FROM evidence_file WHERE evidence_id = ?1",
            params![evidence_id],
            |r| r.get::<_, String>(0),
        )
        .optional()?
        .map(PathBuf::from)
        .ok_or_else(|| LedgerError::NotFound(format!("evidence file for {evidence_id} not found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(id: &str, case_id: &str) -> EvidenceRow {
        EvidenceRow {
            evidence_id: id.to_string(),
            case_id: case_id.to_string(),
            description: "a disk image".to_string(),
            source_device: Some("Dell Latitude".to_string()),
            acquisition_method: "dd".to_string(),
            file_name: "disk.E01".to_string(),
            sha256: "deadbeef".to_string(),
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn insert_and_get_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(&dir.path().join("data/sentinel.db"), &dir.path().join("evidence_store")).unwrap();

        let row = sample_row("ev-1", "case-1");
        let path = store.write_payload(&row.evidence_id, &row.file_name, b"disk bytes").unwrap();
        store.insert_evidence(&row, &path).unwrap();

        let fetched = store.get("ev-1").unwrap();
        assert_eq!(fetched, row);

        let file_path = store.get_file_path("ev-1").unwrap();
        assert_eq!(fs::read(file_path).unwrap(), b"disk bytes");
    }

    #[test]
    fn get_missing_evidence_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(&dir.path().join("data/sentinel.db"), &dir.path().join("evidence_store")).unwrap();
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[test]
    fn list_by_case_returns_all_matching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(&dir.path().join("data/sentinel.db"), &dir.path().join("evidence_store")).unwrap();

        for (id, case) in [("ev-1", "case-a"), ("ev-2", "case-a"), ("ev-3", "case-b")] {
            let row = sample_row(id, case);
            let path = store.write_payload(&row.evidence_id, &row.file_name, b"x").unwrap();
            store.insert_evidence(&row, &path).unwrap();
        }

        let case_a = store.list_by_case("case-a").unwrap();
        assert_eq!(case_a.len(), 2);
        let case_b = store.list_by_case("case-b").unwrap();
        assert_eq!(case_b.len(), 1);
    }

    #[test]
    fn overwriting_payload_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = EvidenceStore::open(&dir.path().join("data/sentinel.db"), &dir.path().join("evidence_store")).unwrap();

        store.write_payload("ev-1", "f.bin", b"first").unwrap();
        let result = store.write_payload("ev-1", "f.bin", b"second");
        assert!(result.is_err());
    }
}
