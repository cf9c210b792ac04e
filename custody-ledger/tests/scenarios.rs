//! End-to-end scenario coverage for the custody ledger, each starting from
//! an empty on-disk state.

use std::collections::BTreeMap;
use std::fs;

use custody_ledger::cipher::EvidenceCipher;
use custody_ledger::hash::sha256_bytes;
use custody_ledger::ledger::ActionType;
use custody_ledger::rbac::{self, Action};
use custody_ledger::reporting::build_case_audit_summary;
use custody_ledger::{Ed25519FileSigner, EvidenceRow, EvidenceStore, Ledger, Principal, Role};

fn officer() -> Principal {
    Principal {
        user_id: "officer1".to_string(),
        role: Role::FieldOfficer,
        org_id: "KPS".to_string(),
    }
}

fn analyst() -> Principal {
    Principal {
        user_id: "analyst1".to_string(),
        role: Role::ForensicAnalyst,
        org_id: "FORENSIC_LAB".to_string(),
    }
}

fn prosecutor() -> Principal {
    Principal {
        user_id: "prosecutor1".to_string(),
        role: Role::Prosecutor,
        org_id: "ODPP".to_string(),
    }
}

fn open_ledger(dir: &std::path::Path) -> Ledger<Ed25519FileSigner> {
    let signer = Ed25519FileSigner::new(dir).unwrap();
    Ledger::open(&dir.join("data").join("ledger.jsonl"), signer).unwrap()
}

/// S1 — Intake + self-endorsed ACCESS.
#[test]
fn s1_intake_then_self_endorsed_access() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = open_ledger(dir.path());

    let payload = b"hello";
    let sha = sha256_bytes(payload);
    assert_eq!(sha, "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824");

    let mut details = BTreeMap::new();
    details.insert("case_id".to_string(), serde_json::json!("C1"));
    details.insert("file_name".to_string(), serde_json::json!("d.E01"));

    ledger
        .append_event("ev-1", ActionType::Intake, &officer(), &sha, Some(&sha), true, details, true)
        .unwrap();

    let timeline = ledger.get_timeline("ev-1").unwrap();
    assert_eq!(timeline.len(), 1);
    assert!(ledger.validate_chain().unwrap().valid);

    ledger
        .append_event(
            "ev-1",
            ActionType::Access,
            &officer(),
            &sha,
            Some(&sha),
            true,
            BTreeMap::new(),
            true,
        )
        .unwrap();

    let timeline = ledger.get_timeline("ev-1").unwrap();
    assert_eq!(timeline.len(), 2);
    assert!(timeline.iter().all(|e| e.integrity_ok));
    assert!(ledger.validate_chain().unwrap().valid);
}

/// S2 — TRANSFER requires two orgs.
#[test]
fn s2_transfer_requires_two_orgs() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = open_ledger(dir.path());

    let sha = sha256_bytes(b"any payload");
    ledger
        .append_event("ev-1", ActionType::Intake, &officer(), &sha, Some(&sha), true, BTreeMap::new(), true)
        .unwrap();

    let transfer = ledger
        .append_event(
            "ev-1",
            ActionType::Transfer,
            &officer(),
            &sha,
            Some(&sha),
            true,
            BTreeMap::new(),
            true,
        )
        .unwrap();
    assert_eq!(transfer.endorsement_status, "PENDING_ENDORSEMENT");

    ledger.endorse_event(&transfer.tx_id, "ev-1", &analyst()).unwrap();
    let timeline = ledger.get_timeline("ev-1").unwrap();
    let recomputed = timeline.iter().find(|e| e.tx_id == transfer.tx_id).unwrap();
    assert_eq!(recomputed.endorsement_status, "FINAL");

    let err = ledger.endorse_event(&transfer.tx_id, "ev-1", &analyst()).unwrap_err();
    assert!(matches!(err, custody_ledger::LedgerError::DuplicateEndorsement));
}

/// S3 — Tamper detection.
#[test]
fn s3_tamper_detection() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("ledger.jsonl");
    {
        let mut ledger = open_ledger(dir.path());
        let sha = sha256_bytes(b"payload");
        ledger
            .append_event("ev-1", ActionType::Intake, &officer(), &sha, Some(&sha), true, BTreeMap::new(), true)
            .unwrap();
    }

    let original = fs::read_to_string(&path).unwrap();
    let tampered = original.replacen("\"C1\"", "\"C9\"", 1);
    let tampered = if tampered == original {
        original.replacen("\"officer1\"", "\"officer9\"", 1)
    } else {
        tampered
    };
    fs::write(&path, tampered).unwrap();

    let ledger = open_ledger(dir.path());
    let validation = ledger.validate_chain().unwrap();
    assert!(!validation.valid);
    assert!(validation.reason == "record hash mismatch" || validation.reason == "prev_hash mismatch");
}

/// S4 — Integrity mismatch is recorded, not thrown.
#[test]
fn s4_integrity_mismatch_is_recorded() {
    let dir = tempfile::tempdir().unwrap();
    let mut ledger = open_ledger(dir.path());

    let sha_a = sha256_bytes(b"A");
    let sha_b = sha256_bytes(b"B");

    ledger
        .append_event("ev-1", ActionType::Intake, &officer(), &sha_a, Some(&sha_a), true, BTreeMap::new(), true)
        .unwrap();
    let mismatch = ledger
        .append_event(
            "ev-1",
            ActionType::Access,
            &officer(),
            &sha_a,
            Some(&sha_b),
            false,
            BTreeMap::new(),
            false,
        )
        .unwrap();
    assert!(!mismatch.integrity_ok);

    let validation = ledger.validate_chain().unwrap();
    assert!(validation.valid);

    let evidence = EvidenceRow {
        evidence_id: "ev-1".to_string(),
        case_id: "case-1".to_string(),
        description: "x".to_string(),
        source_device: None,
        acquisition_method: "dd".to_string(),
        file_name: "d.E01".to_string(),
        sha256: sha_a,
        created_at: "2025-01-01T00:00:00.000000Z".to_string(),
    };
    let timeline = ledger.get_timeline("ev-1").unwrap();
    let mut timelines = std::collections::HashMap::new();
    timelines.insert("ev-1".to_string(), timeline);

    let summary = build_case_audit_summary("case-1", &[evidence], &timelines, validation.valid, &validation.reason);
    assert_eq!(summary.integrity_failures, 1);
    assert_eq!(summary.evidence_audits[0].compliance_status, "ATTENTION_REQUIRED");
}

/// S5 — Forbidden role never reaches the ledger.
#[test]
fn s5_forbidden_role_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let ledger = open_ledger(dir.path());

    assert!(!rbac::is_permitted(prosecutor().role, Action::RegisterEvidence));

    // The authorization gate lives upstream of the ledger (C9); a forbidden
    // caller never reaches append_event, so the ledger stays empty.
    assert!(ledger.read_all().unwrap().is_empty());
}

/// S6 — Payload at rest is encrypted; verification still succeeds because
/// hashes are computed over plaintext.
#[test]
fn s6_payload_at_rest_encrypted() {
    let dir = tempfile::tempdir().unwrap();
    let store = EvidenceStore::open(&dir.path().join("data/sentinel.db"), &dir.path().join("evidence_store")).unwrap();
    let cipher = EvidenceCipher::new(dir.path()).unwrap();

    let plaintext = b"sensitive disk image bytes";
    let expected_sha = sha256_bytes(plaintext);
    let ciphertext = cipher.encrypt_for_storage(plaintext);

    let path = store.write_payload("ev-1", "d.E01", &ciphertext).unwrap();
    assert!(fs::read(&path).unwrap().starts_with(b"TSENC1:"));
    assert!(!contains_subslice(&fs::read(&path).unwrap(), plaintext));

    let on_disk = fs::read(&path).unwrap();
    let decrypted = cipher.decrypt_from_storage(&on_disk).unwrap();
    let actual_sha = sha256_bytes(&decrypted);
    assert_eq!(actual_sha, expected_sha);
}

fn contains_subslice(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
