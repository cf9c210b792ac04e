//! Pure read-side reporting over the ledger and evidence store: a
//! court-ready chain-of-custody report for one piece of evidence, and a
//! compliance rollup across a case.

use serde::Serialize;

use crate::hash::utcnow_iso;
use crate::ledger::LedgerEvent;
use crate::store::EvidenceRow;

#[derive(Clone, Debug, Serialize)]
pub struct Actor {
    pub user_id: String,
    pub role: String,
    pub org_id: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Signing {
    pub signer_pubkey_b64: String,
    pub signature_b64: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ReportedEvent {
    pub tx_id: String,
    pub action_type: String,
    pub timestamp: String,
    pub actor: Actor,
    pub required_endorser_orgs: u32,
    pub endorsement_status: String,
    pub integrity_ok: bool,
    pub presented_sha256: Option<String>,
    pub expected_sha256: String,
    pub details: serde_json::Value,
    pub signing: Signing,
    pub record_hash: String,
    pub prev_hash: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct LegalBasis {
    pub evidence_act: &'static str,
    pub standards: [&'static str; 3],
}

#[derive(Clone, Debug, Serialize)]
pub struct LedgerValidation {
    pub chain_valid: bool,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Attestation {
    pub notes: &'static str,
}

/// A court-ready chain-of-custody report for a single piece of evidence.
#[derive(Clone, Debug, Serialize)]
pub struct CourtReport {
    pub generated_at: String,
    pub jurisdiction: &'static str,
    pub legal_basis: LegalBasis,
    pub ledger_validation: LedgerValidation,
    pub evidence: EvidenceSummary,
    pub chain_of_custody: Vec<ReportedEvent>,
    pub attestation: Attestation,
}

#[derive(Clone, Debug, Serialize)]
pub struct EvidenceSummary {
    pub evidence_id: String,
    pub case_id: String,
    pub description: String,
    pub source_device: Option<String>,
    pub acquisition_method: String,
    pub file_name: String,
    pub sha256: String,
    pub created_at: String,
}

impl From<&EvidenceRow> for EvidenceSummary {
    fn from(row: &EvidenceRow) -> Self {
        Self {
            evidence_id: row.evidence_id.clone(),
            case_id: row.case_id.clone(),
            description: row.description.clone(),
            source_device: row.source_device.clone(),
            acquisition_method: row.acquisition_method.clone(),
            file_name: row.file_name.clone(),
            sha256: row.sha256.clone(),
            created_at: row.created_at.clone(),
        }
    }
}

fn to_reported_event(event: &LedgerEvent) -> ReportedEvent {
    ReportedEvent {
        tx_id: event.tx_id.clone(),
        action_type: event.action_type.clone(),
        timestamp: event.timestamp.clone(),
        actor: Actor {
            user_id: event.actor_user_id.clone(),
            role: event.actor_role.clone(),
            org_id: event.actor_org_id.clone(),
        },
        required_endorser_orgs: event.required_endorser_orgs,
        endorsement_status: event.endorsement_status.clone(),
        integrity_ok: event.integrity_ok,
        presented_sha256: event.presented_sha256.clone(),
        expected_sha256: event.expected_sha256.clone(),
        details: serde_json::to_value(&event.details).unwrap_or(serde_json::Value::Null),
        signing: Signing {
            signer_pubkey_b64: event.signer_pubkey_b64.clone(),
            signature_b64: event.signature_b64.clone(),
        },
        record_hash: event.record_hash.clone(),
        prev_hash: event.prev_hash.clone(),
    }
}

/// Builds the court report for one evidence item. `timeline` must already
/// carry read-time-computed `endorsement_status` (see
/// [`crate::ledger::Ledger::get_timeline`]).
pub fn build_court_report(
    evidence: &EvidenceRow,
    timeline: &[LedgerEvent],
    chain_valid: bool,
    chain_message: &str,
) -> CourtReport {
    CourtReport {
        generated_at: utcnow_iso(),
        jurisdiction: "Kenya",
        legal_basis: LegalBasis {
            evidence_act: "Evidence Act (Kenya) Section 106B",
            standards: ["ISO/IEC 27037", "ISO/IEC 27043", "NIST SP 800-86"],
        },
        ledger_validation: LedgerValidation {
            chain_valid,
            message: chain_message.to_string(),
        },
        evidence: EvidenceSummary::from(evidence),
        chain_of_custody: timeline.iter().map(to_reported_event).collect(),
        attestation: Attestation {
            notes: "This report is generated from an append-only, hash-chained custody ledger. Any tampering breaks hash continuity and validation.",
        },
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct EvidenceAudit {
    pub evidence_id: String,
    pub file_name: String,
    pub expected_sha256: String,
    pub event_count: usize,
    pub last_event_at: Option<String>,
    pub integrity_failures: u64,
    pub pending_endorsements: u64,
    pub compliance_status: &'static str,
}

/// Per-case compliance rollup over every evidence item in the case.
#[derive(Clone, Debug, Serialize)]
pub struct CaseAuditSummary {
    pub case_id: String,
    pub generated_at: String,
    pub chain_valid: bool,
    pub chain_message: String,
    pub evidence_count: usize,
    pub total_events: usize,
    pub integrity_failures: u64,
    pub pending_endorsements: u64,
    pub compliant_evidence_count: usize,
    pub evidence_audits: Vec<EvidenceAudit>,
}

/// Builds the case audit rollup. `timelines_by_evidence` must supply, for
/// each evidence item, its timeline with read-time endorsement status
/// already computed.
pub fn build_case_audit_summary(
    case_id: &str,
    evidence_items: &[EvidenceRow],
    timelines_by_evidence: &std::collections::HashMap<String, Vec<LedgerEvent>>,
    chain_valid: bool,
    chain_message: &str,
) -> CaseAuditSummary {
    let mut evidence_audits = Vec::new();
    let mut total_events = 0usize;
    let mut total_integrity_failures = 0u64;
    let mut total_pending_endorsements = 0u64;

    for evidence in evidence_items {
        let events = timelines_by_evidence
            .get(&evidence.evidence_id)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        total_events += events.len();

        let integrity_failures = events.iter().filter(|e| !e.integrity_ok).count() as u64;
        let pending_endorsements = events
            .iter()
            .filter(|e| e.action_type != "ENDORSE" && e.endorsement_status == "PENDING_ENDORSEMENT")
            .count() as u64;

        total_integrity_failures += integrity_failures;
        total_pending_endorsements += pending_endorsements;

        let compliance_status = if integrity_failures > 0 || pending_endorsements > 0 {
            "ATTENTION_REQUIRED"
        } else {
            "COMPLIANT"
        };

        evidence_audits.push(EvidenceAudit {
            evidence_id: evidence.evidence_id.clone(),
            file_name: evidence.file_name.clone(),
            expected_sha256: evidence.sha256.clone(),
            event_count: events.len(),
            last_event_at: events.last().map(|e| e.timestamp.clone()),
            integrity_failures,
            pending_endorsements,
            compliance_status,
        });
    }

    let compliant_evidence_count = evidence_audits
        .iter()
        .filter(|a| a.compliance_status == "COMPLIANT")
        .count();

    CaseAuditSummary {
        case_id: case_id.to_string(),
        generated_at: utcnow_iso(),
        chain_valid,
        chain_message: chain_message.to_string(),
        evidence_count: evidence_items.len(),
        total_events,
        integrity_failures: total_integrity_failures,
        pending_endorsements: total_pending_endorsements,
        compliant_evidence_count,
        evidence_audits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    fn evidence(id: &str, case_id: &str) -> EvidenceRow {
        EvidenceRow {
            evidence_id: id.to_string(),
            case_id: case_id.to_string(),
            description: "disk image".to_string(),
            source_device: None,
            acquisition_method: "dd".to_string(),
            file_name: "d.E01".to_string(),
            sha256: "abc123".to_string(),
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
        }
    }

    fn event(tx_id: &str, action_type: &str, integrity_ok: bool, endorsement_status: &str) -> LedgerEvent {
        LedgerEvent {
            tx_id: tx_id.to_string(),
            evidence_id: "ev-1".to_string(),
            action_type: action_type.to_string(),
            required_endorser_orgs: 1,
            actor_user_id: "officer1".to_string(),
            actor_role: "FIELD_OFFICER".to_string(),
            actor_org_id: "KPS".to_string(),
            timestamp: "2025-01-01T00:00:00.000000Z".to_string(),
            presented_sha256: Some("abc123".to_string()),
            expected_sha256: "abc123".to_string(),
            integrity_ok,
            prev_hash: "GENESIS".to_string(),
            endorsement_status: endorsement_status.to_string(),
            endorsements: vec![],
            details: BTreeMap::new(),
            signer_pubkey_b64: "pub".to_string(),
            signature_b64: "sig".to_string(),
            record_hash: "hash".to_string(),
        }
    }

    #[test]
    fn court_report_carries_jurisdiction_and_legal_basis() {
        let evidence = evidence("ev-1", "case-1");
        let timeline = vec![event("tx-1", "INTAKE", true, "FINAL")];
        let report = build_court_report(&evidence, &timeline, true, "ok");
        assert_eq!(report.jurisdiction, "Kenya");
        assert!(report.legal_basis.evidence_act.contains("106B"));
        assert_eq!(report.chain_of_custody.len(), 1);
    }

    #[test]
    fn case_audit_flags_integrity_failures_and_pending_endorsements() {
        let evidence_items = vec![evidence("ev-1", "case-1"), evidence("ev-2", "case-1")];
        let mut timelines = HashMap::new();
        timelines.insert(
            "ev-1".to_string(),
            vec![event("tx-1", "INTAKE", true, "FINAL"), event("tx-2", "ACCESS", false, "FINAL")],
        );
        timelines.insert(
            "ev-2".to_string(),
            vec![event("tx-3", "TRANSFER", true, "PENDING_ENDORSEMENT")],
        );

        let summary = build_case_audit_summary("case-1", &evidence_items, &timelines, true, "ok");
        assert_eq!(summary.evidence_count, 2);
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.integrity_failures, 1);
        assert_eq!(summary.pending_endorsements, 1);
        assert_eq!(summary.compliant_evidence_count, 0);

        let ev1_audit = summary.evidence_audits.iter().find(|a| a.evidence_id == "ev-1").unwrap();
        assert_eq!(ev1_audit.compliance_status, "ATTENTION_REQUIRED");
    }

    #[test]
    fn case_with_no_issues_is_compliant() {
        let evidence_items = vec![evidence("ev-1", "case-1")];
        let mut timelines = HashMap::new();
        timelines.insert("ev-1".to_string(), vec![event("tx-1", "INTAKE", true, "FINAL")]);

        let summary = build_case_audit_summary("case-1", &evidence_items, &timelines, true, "ok");
        assert_eq!(summary.compliant_evidence_count, 1);
        assert_eq!(summary.evidence_audits[0].compliance_status, "COMPLIANT");
    }
}
