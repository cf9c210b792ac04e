//! Request/response DTOs for the custody API.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct EvidenceIntakeRequest {
    pub case_id: String,
    pub description: String,
    pub source_device: Option<String>,
    pub acquisition_method: String,
    pub file_name: String,
    /// Base64-encoded raw payload bytes.
    pub file_bytes_b64: String,
}

#[derive(Debug, Serialize)]
pub struct EvidenceResponse {
    pub evidence_id: String,
    pub case_id: String,
    pub description: String,
    pub file_name: String,
    pub sha256: String,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CustodyEventRequest {
    pub action_type: String,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    pub presented_sha256: Option<String>,
    #[serde(default)]
    pub endorse: bool,
}

#[derive(Debug, Serialize)]
pub struct CustodyEventResponse {
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
    pub endorsement_status: String,
    pub signer_pubkey_b64: String,
    pub signature_b64: String,
    pub record_hash: String,
    pub prev_hash: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub evidence_id: String,
    pub expected_sha256: String,
    pub actual_sha256: String,
    pub integrity_ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct EndorseRequest {
    pub tx_id: String,
    pub evidence_id: String,
}

#[derive(Debug, Serialize)]
pub struct EndorseResponse {
    pub tx_id: String,
    pub endorsed_tx_id: String,
    pub evidence_id: String,
    pub endorser_user_id: String,
    pub endorser_role: String,
    pub endorser_org_id: String,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub evidence_id: String,
    pub expected_sha256: String,
    pub events: Vec<CustodyEventResponse>,
}

#[derive(Debug, Serialize)]
pub struct CaseSummary {
    pub case_id: String,
    pub evidence_items: Vec<EvidenceResponse>,
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    pub evidence_id: String,
    pub generated_at: String,
    pub report: custody_ledger::reporting::CourtReport,
}

#[derive(Debug, Serialize)]
pub struct CaseAuditResponse {
    pub case_id: String,
    pub audit: custody_ledger::reporting::CaseAuditSummary,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ledger_chain_valid: bool,
    pub ledger: String,
}
