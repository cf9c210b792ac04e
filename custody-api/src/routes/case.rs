use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use custody_ledger::Action;

use crate::dto::{CaseAuditResponse, CaseSummary, EvidenceResponse};
use crate::error::ApiError;
use crate::routes::authorize;
use crate::state::SharedState;

/// `GET /case/{case_id}`
pub async fn case_summary(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> Result<Json<CaseSummary>, ApiError> {
    authorize(&state, &headers, Action::ViewEvidence)?;

    let rows = state.store.list_by_case(&case_id)?;
    let evidence_items = rows
        .into_iter()
        .map(|r| EvidenceResponse {
            evidence_id: r.evidence_id,
            case_id: r.case_id,
            description: r.description,
            file_name: r.file_name,
            sha256: r.sha256,
            created_at: r.created_at,
        })
        .collect();

    Ok(Json(CaseSummary { case_id, evidence_items }))
}

/// `GET /case/{case_id}/audit`
///
/// Supplements the minimum verb set with a case-wide compliance rollup
/// (component C8's case audit summary), gated the same as a generated
/// report.
pub async fn case_audit(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(case_id): Path<String>,
) -> Result<Json<CaseAuditResponse>, ApiError> {
    authorize(&state, &headers, Action::GenerateReport)?;

    let evidence_items = state.store.list_by_case(&case_id)?;
    let ledger = state.ledger.lock().await;
    let validation = ledger.validate_chain()?;

    let mut timelines: HashMap<String, Vec<custody_ledger::LedgerEvent>> = HashMap::new();
    for evidence in &evidence_items {
        let events = ledger.get_timeline(&evidence.evidence_id)?;
        timelines.insert(evidence.evidence_id.clone(), events);
    }
    drop(ledger);

    let audit = custody_ledger::reporting::build_case_audit_summary(
        &case_id,
        &evidence_items,
        &timelines,
        validation.valid,
        &validation.reason,
    );

    Ok(Json(CaseAuditResponse { case_id, audit }))
}
