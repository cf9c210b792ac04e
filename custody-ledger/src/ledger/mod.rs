//! Append-only, hash-chained, signed custody ledger.
//!
//! The ledger file is the sole source of truth: no index is persisted. Every
//! append and endorse takes an exclusive OS-level lock on the ledger file for
//! "compute prev_hash -> write line -> fsync -> release," which is what
//! guarantees no two committed lines ever share a `prev_hash`. Readers never
//! lock; they just read to end-of-file.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::canonical::canonical_bytes;
use crate::error::LedgerError;
use crate::hash::{sha256_bytes, utcnow_iso};
use crate::rbac::{self, Principal};
use crate::signing::Signer;

/// The closed set of custody actions. Quorum policy is a lookup over the
/// wire string ([`rbac::required_endorser_org_count`]), not a class per
/// variant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ActionType {
    Intake,
    Transfer,
    Access,
    Analysis,
    Storage,
    CourtSubmission,
    Endorse,
}

impl ActionType {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ActionType::Intake => "INTAKE",
            ActionType::Transfer => "TRANSFER",
            ActionType::Access => "ACCESS",
            ActionType::Analysis => "ANALYSIS",
            ActionType::Storage => "STORAGE",
            ActionType::CourtSubmission => "COURT_SUBMISSION",
            ActionType::Endorse => "ENDORSE",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "INTAKE" => ActionType::Intake,
            "TRANSFER" => ActionType::Transfer,
            "ACCESS" => ActionType::Access,
            "ANALYSIS" => ActionType::Analysis,
            "STORAGE" => ActionType::Storage,
            "COURT_SUBMISSION" => ActionType::CourtSubmission,
            "ENDORSE" => ActionType::Endorse,
            _ => return None,
        })
    }
}

/// Write-time or read-time snapshot of an event's endorsement state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EndorsementStatus {
    Final,
    PendingEndorsement,
}

impl EndorsementStatus {
    pub fn as_wire(&self) -> &'static str {
        match self {
            EndorsementStatus::Final => "FINAL",
            EndorsementStatus::PendingEndorsement => "PENDING_ENDORSEMENT",
        }
    }
}

/// One `{org_id, user_id}` endorsement pair attached to an event at write
/// time.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Endorsement {
    pub org_id: String,
    pub user_id: String,
}

/// One line of the append-only ledger.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub tx_id: String,
    pub evidence_id: String,
    pub action_type: String,
    pub required_endorser_orgs: u32,
    pub actor_user_id: String,
    pub actor_role: String,
    pub actor_org_id: String,
    pub timestamp: String,
    pub presented_sha256: Option<String>,
    pub expected_sha256: String,
    pub integrity_ok: bool,
    pub prev_hash: String,
    pub endorsement_status: String,
    pub endorsements: Vec<Endorsement>,
    pub details: BTreeMap<String, Value>,
    pub signer_pubkey_b64: String,
    pub signature_b64: String,
    pub record_hash: String,
}

/// Strips the given top-level keys from the serialized record, returning
/// the result as a `Value`. This is the only place that knows which field
/// subsets feed hashing versus signing.
fn record_minus(event: &LedgerEvent, exclude: &[&str]) -> Value {
    let mut v = serde_json::to_value(event).expect("LedgerEvent always serializes");
    if let Value::Object(map) = &mut v {
        for key in exclude {
            map.remove(*key);
        }
    }
    v
}

fn signing_payload(event: &LedgerEvent) -> Vec<u8> {
    canonical_bytes(&record_minus(
        event,
        &["record_hash", "signer_pubkey_b64", "signature_b64"],
    ))
}

fn hashing_payload(event: &LedgerEvent) -> Vec<u8> {
    canonical_bytes(&record_minus(event, &["record_hash"]))
}

/// Outcome of [`Ledger::validate_chain`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainValidation {
    pub valid: bool,
    pub reason: String,
}

/// The append-only signed hash chain for one custody-ledger instance.
pub struct Ledger<S: Signer> {
    path: PathBuf,
    signer: S,
}

impl<S: Signer> Ledger<S> {
    /// Opens (creating if necessary) the ledger file at `path`.
    pub fn open(path: &Path, signer: S) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            signer,
        })
    }

    /// Reads every line of the ledger in file order.
    pub fn read_all(&self) -> Result<Vec<LedgerEvent>, LedgerError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = BufReader::new(file);
        let mut events = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let event: LedgerEvent = serde_json::from_str(&line)
                .map_err(|e| LedgerError::StorageFailure(format!("malformed ledger line: {e}")))?;
            events.push(event);
        }
        Ok(events)
    }

    /// Returns all events for `evidence_id`, with endorsement status
    /// recomputed on read, in file order.
    pub fn get_timeline(&self, evidence_id: &str) -> Result<Vec<LedgerEvent>, LedgerError> {
        let all = self.read_all()?;
        let mut out = Vec::new();
        for event in &all {
            if event.evidence_id != evidence_id {
                continue;
            }
            let mut event = event.clone();
            event.endorsement_status = self.compute_status(&event, &all).as_wire().to_string();
            out.push(event);
        }
        Ok(out)
    }

    /// Reads the whole ledger and computes `event`'s authoritative
    /// endorsement status. Convenience for callers that just appended or
    /// endorsed and want the up-to-date status without managing the read
    /// themselves.
    pub fn refresh_status(&self, event: &LedgerEvent) -> Result<EndorsementStatus, LedgerError> {
        let all = self.read_all()?;
        Ok(self.compute_status(event, &all))
    }

    /// Computes the authoritative endorsement status of `event` against the
    /// full set of ledger lines. ENDORSE events always report FINAL.
    pub fn compute_status(&self, event: &LedgerEvent, all: &[LedgerEvent]) -> EndorsementStatus {
        if event.action_type == ActionType::Endorse.as_wire() {
            return EndorsementStatus::Final;
        }
        let mut orgs: std::collections::BTreeSet<String> =
            event.endorsements.iter().map(|e| e.org_id.clone()).collect();
        for line in all {
            if line.action_type != ActionType::Endorse.as_wire() {
                continue;
            }
            let endorsed_tx_id = line.details.get("endorsed_tx_id").and_then(|v| v.as_str());
            if endorsed_tx_id == Some(event.tx_id.as_str()) {
                orgs.insert(line.actor_org_id.clone());
            }
        }
        if orgs.len() as u32 >= event.required_endorser_orgs {
            EndorsementStatus::Final
        } else {
            EndorsementStatus::PendingEndorsement
        }
    }

    /// Appends a new custody event under the ledger's exclusive write lock.
    #[allow(clippy::too_many_arguments)]
    pub fn append_event(
        &mut self,
        evidence_id: &str,
        action_type: ActionType,
        principal: &Principal,
        expected_sha256: &str,
        presented_sha256: Option<&str>,
        integrity_ok: bool,
        details: BTreeMap<String, Value>,
        endorse: bool,
    ) -> Result<LedgerEvent, LedgerError> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        file.lock_exclusive()?;
        let result = self.append_locked(
            &file,
            evidence_id,
            action_type,
            principal,
            expected_sha256,
            presented_sha256,
            integrity_ok,
            details,
            endorse,
        );
        FileExt::unlock(&file)?;
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn append_locked(
        &mut self,
        file: &File,
        evidence_id: &str,
        action_type: ActionType,
        principal: &Principal,
        expected_sha256: &str,
        presented_sha256: Option<&str>,
        integrity_ok: bool,
        details: BTreeMap<String, Value>,
        endorse: bool,
    ) -> Result<LedgerEvent, LedgerError> {
        let prev_hash = last_record_hash(file)?;

        let required_endorser_orgs = rbac::required_endorser_org_count(action_type.as_wire());
        let endorsements = if endorse {
            vec![Endorsement {
                org_id: principal.org_id.clone(),
                user_id: principal.user_id.clone(),
            }]
        } else {
            Vec::new()
        };
        let unique_orgs: std::collections::BTreeSet<&str> =
            endorsements.iter().map(|e| e.org_id.as_str()).collect();
        let endorsement_status = if unique_orgs.len() as u32 >= required_endorser_orgs {
            EndorsementStatus::Final
        } else {
            EndorsementStatus::PendingEndorsement
        };

        let mut event = LedgerEvent {
            tx_id: Uuid::new_v4().to_string(),
            evidence_id: evidence_id.to_string(),
            action_type: action_type.as_wire().to_string(),
            required_endorser_orgs,
            actor_user_id: principal.user_id.clone(),
            actor_role: principal.role.as_wire().to_string(),
            actor_org_id: principal.org_id.clone(),
            timestamp: utcnow_iso(),
            presented_sha256: presented_sha256.map(str::to_string),
            expected_sha256: expected_sha256.to_string(),
            integrity_ok,
            prev_hash,
            endorsement_status: endorsement_status.as_wire().to_string(),
            endorsements,
            details,
            signer_pubkey_b64: String::new(),
            signature_b64: String::new(),
            record_hash: String::new(),
        };

        let pubkey = self.signer.public_key_b64(&principal.user_id)?;
        let signature = self.signer.sign(&principal.user_id, &signing_payload(&event))?;
        event.signer_pubkey_b64 = pubkey;
        event.signature_b64 = signature;
        event.record_hash = sha256_bytes(&hashing_payload(&event));

        write_line(file, &event)?;
        fsync_parent_dir(&self.path)?;
        tracing::info!(
            tx_id = %event.tx_id,
            evidence_id,
            action_type = event.action_type.as_str(),
            endorsement_status = event.endorsement_status.as_str(),
            "ledger event appended"
        );
        Ok(event)
    }

    /// Attaches an endorsement from `principal`'s organization to `tx_id`.
    /// Fails with [`LedgerError::DuplicateEndorsement`] if that organization
    /// has already endorsed this transaction.
    pub fn endorse_event(
        &mut self,
        tx_id: &str,
        evidence_id: &str,
        principal: &Principal,
    ) -> Result<LedgerEvent, LedgerError> {
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        file.lock_exclusive()?;
        let result = self.endorse_locked(&file, tx_id, evidence_id, principal);
        FileExt::unlock(&file)?;
        result
    }

    fn endorse_locked(
        &mut self,
        file: &File,
        tx_id: &str,
        evidence_id: &str,
        principal: &Principal,
    ) -> Result<LedgerEvent, LedgerError> {
        for event in read_all_from(file)? {
            if event.action_type != ActionType::Endorse.as_wire() {
                continue;
            }
            let endorsed_tx_id = event.details.get("endorsed_tx_id").and_then(|v| v.as_str());
            if endorsed_tx_id == Some(tx_id) && event.actor_org_id == principal.org_id {
                tracing::warn!(
                    tx_id,
                    org_id = principal.org_id.as_str(),
                    "rejected duplicate endorsement from org"
                );
                return Err(LedgerError::DuplicateEndorsement);
            }
        }

        let mut details = BTreeMap::new();
        details.insert("endorsed_tx_id".to_string(), Value::String(tx_id.to_string()));

        let prev_hash = last_record_hash(file)?;
        let mut event = LedgerEvent {
            tx_id: Uuid::new_v4().to_string(),
            evidence_id: evidence_id.to_string(),
            action_type: ActionType::Endorse.as_wire().to_string(),
            required_endorser_orgs: 1,
            actor_user_id: principal.user_id.clone(),
            actor_role: principal.role.as_wire().to_string(),
            actor_org_id: principal.org_id.clone(),
            timestamp: utcnow_iso(),
            presented_sha256: None,
            expected_sha256: String::new(),
            integrity_ok: true,
            prev_hash,
            endorsement_status: EndorsementStatus::Final.as_wire().to_string(),
            endorsements: vec![Endorsement {
                org_id: principal.org_id.clone(),
                user_id: principal.user_id.clone(),
            }],
            details,
            signer_pubkey_b64: String::new(),
            signature_b64: String::new(),
            record_hash: String::new(),
        };

        let pubkey = self.signer.public_key_b64(&principal.user_id)?;
        let signature = self.signer.sign(&principal.user_id, &signing_payload(&event))?;
        event.signer_pubkey_b64 = pubkey;
        event.signature_b64 = signature;
        event.record_hash = sha256_bytes(&hashing_payload(&event));

        write_line(file, &event)?;
        fsync_parent_dir(&self.path)?;
        tracing::info!(
            tx_id = %event.tx_id,
            endorsed_tx_id = tx_id,
            org_id = principal.org_id.as_str(),
            "endorsement recorded"
        );
        Ok(event)
    }

    /// Walks the file from the top, verifying the hash chain, `prev_hash`
    /// linkage, and every signature. Never panics or throws; returns a
    /// labelled result.
    pub fn validate_chain(&self) -> Result<ChainValidation, LedgerError> {
        let events = self.read_all()?;
        let mut prev = "GENESIS".to_string();
        for event in &events {
            let recomputed = sha256_bytes(&hashing_payload(event));
            if recomputed != event.record_hash {
                tracing::warn!(tx_id = %event.tx_id, "chain validation failed: record hash mismatch");
                return Ok(ChainValidation {
                    valid: false,
                    reason: "record hash mismatch".to_string(),
                });
            }
            if event.prev_hash != prev {
                tracing::warn!(tx_id = %event.tx_id, "chain validation failed: prev_hash mismatch");
                return Ok(ChainValidation {
                    valid: false,
                    reason: "prev_hash mismatch".to_string(),
                });
            }
            if event.signature_b64.is_empty() || event.signer_pubkey_b64.is_empty() {
                tracing::warn!(tx_id = %event.tx_id, "chain validation failed: missing signature");
                return Ok(ChainValidation {
                    valid: false,
                    reason: "missing signature".to_string(),
                });
            }
            let payload = signing_payload(event);
            if !crate::signing::verify_signature(&event.signer_pubkey_b64, &event.signature_b64, &payload) {
                tracing::warn!(tx_id = %event.tx_id, "chain validation failed: invalid signature");
                return Ok(ChainValidation {
                    valid: false,
                    reason: "invalid signature".to_string(),
                });
            }
            prev = event.record_hash.clone();
        }
        Ok(ChainValidation {
            valid: true,
            reason: "ok".to_string(),
        })
    }
}

fn read_all_from(file: &File) -> Result<Vec<LedgerEvent>, LedgerError> {
    use std::io::{Read, Seek, SeekFrom};
    let mut file = file.try_clone()?;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let mut events = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let event: LedgerEvent = serde_json::from_str(line)
            .map_err(|e| LedgerError::StorageFailure(format!("malformed ledger line: {e}")))?;
        events.push(event);
    }
    Ok(events)
}

fn last_record_hash(file: &File) -> Result<String, LedgerError> {
    let events = read_all_from(file)?;
    Ok(events.last().map(|e| e.record_hash.clone()).unwrap_or_else(|| "GENESIS".to_string()))
}

fn write_line(file: &File, event: &LedgerEvent) -> Result<(), LedgerError> {
    let mut line = canonical_bytes(event);
    line.push(b'\n');
    let mut file = file.try_clone()?;
    file.write_all(&line)?;
    file.sync_all()?;
    Ok(())
}

/// Fsyncs the directory containing `path`, so a crash right after the line
/// fsync above still leaves the new directory entry durable.
fn fsync_parent_dir(path: &Path) -> Result<(), LedgerError> {
    if let Some(dir) = path.parent() {
        let dir_file = File::open(dir)?;
        dir_file.sync_all()?;
    }
    Ok(())
}
