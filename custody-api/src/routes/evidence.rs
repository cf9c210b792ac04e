use std::fs;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use base64::Engine;
use custody_ledger::ledger::ActionType;
use custody_ledger::{Action, hash};
use uuid::Uuid;

use crate::dto::{
    CustodyEventRequest, CustodyEventResponse, EvidenceIntakeRequest, EvidenceResponse, ReportResponse,
    TimelineResponse, VerifyResponse,
};
use crate::error::ApiError;
use crate::routes::authorize;
use crate::state::SharedState;

fn to_event_response(event: custody_ledger::LedgerEvent) -> CustodyEventResponse {
    CustodyEventResponse {
        tx_id: event.tx_id,
        evidence_id: event.evidence_id,
        action_type: event.action_type,
        required_endorser_orgs: event.required_endorser_orgs,
        actor_user_id: event.actor_user_id,
        actor_role: event.actor_role,
        actor_org_id: event.actor_org_id,
        timestamp: event.timestamp,
        presented_sha256: event.presented_sha256,
        expected_sha256: event.expected_sha256,
        integrity_ok: event.integrity_ok,
        endorsement_status: event.endorsement_status,
        signer_pubkey_b64: event.signer_pubkey_b64,
        signature_b64: event.signature_b64,
        record_hash: event.record_hash,
        prev_hash: event.prev_hash,
    }
}

/// `POST /evidence/intake`
pub async fn intake(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(req): Json<EvidenceIntakeRequest>,
) -> Result<(StatusCode, Json<EvidenceResponse>), ApiError> {
    let principal = authorize(&state, &headers, Action::RegisterEvidence)?;

    let raw = base64::engine::general_purpose::STANDARD
        .decode(&req.file_bytes_b64)
        .map_err(|e| ApiError(custody_ledger::LedgerError::StorageFailure(format!("invalid base64 payload: {e}"))))?;

    let sha256 = hash::sha256_bytes(&raw);
    let evidence_id = Uuid::new_v4().to_string();
    let created_at = hash::utcnow_iso();

    let storage_bytes = match &state.cipher {
        Some(cipher) => cipher.encrypt_for_storage(&raw),
        None => raw,
    };

    let file_path = state.store.write_payload(&evidence_id, &req.file_name, &storage_bytes)?;

    let row = custody_ledger::EvidenceRow {
        evidence_id: evidence_id.clone(),
        case_id: req.case_id.clone(),
        description: req.description.clone(),
        source_device: req.source_device.clone(),
        acquisition_method: req.acquisition_method.clone(),
        file_name: req.file_name.clone(),
        sha256: sha256.clone(),
        created_at: created_at.clone(),
    };
    state.store.insert_evidence(&row, &file_path)?;

    let mut details = std::collections::BTreeMap::new();
    details.insert("case_id".to_string(), serde_json::Value::String(req.case_id.clone()));
    details.insert("file_name".to_string(), serde_json::Value::String(req.file_name.clone()));

    let mut ledger = state.ledger.lock().await;
    ledger.append_event(
        &evidence_id,
        ActionType::Intake,
        &principal,
        &sha256,
        Some(&sha256),
        true,
        details,
        true,
    )?;

    Ok((
        StatusCode::OK,
        Json(EvidenceResponse {
            evidence_id,
            case_id: req.case_id,
            description: req.description,
            file_name: req.file_name,
            sha256,
            created_at,
        }),
    ))
}

/// `POST /evidence/{evidence_id}/event`
pub async fn record_event(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(evidence_id): Path<String>,
    Json(req): Json<CustodyEventRequest>,
) -> Result<Json<CustodyEventResponse>, ApiError> {
    let principal = authorize(&state, &headers, Action::RecordEvent)?;

    let action_type = ActionType::from_wire(&req.action_type)
        .ok_or_else(|| ApiError(custody_ledger::LedgerError::StorageFailure(format!("unknown action_type: {}", req.action_type))))?;

    let evidence = state.store.get(&evidence_id)?;
    let expected = evidence.sha256.clone();
    let integrity_ok = req
        .presented_sha256
        .as_deref()
        .map(|p| p == expected)
        .unwrap_or(true);

    let mut ledger = state.ledger.lock().await;
    let event = ledger.append_event(
        &evidence_id,
        action_type,
        &principal,
        &expected,
        req.presented_sha256.as_deref(),
        integrity_ok,
        req.details,
        req.endorse,
    )?;
    let status = ledger.refresh_status(&event)?;
    drop(ledger);

    let mut response = to_event_response(event);
    response.endorsement_status = status.as_wire().to_string();
    Ok(Json(response))
}

/// `POST /evidence/{evidence_id}/verify`
pub async fn verify(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(evidence_id): Path<String>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let principal = authorize(&state, &headers, Action::VerifyIntegrity)?;

    let evidence = state.store.get(&evidence_id)?;
    let file_path = state.store.get_file_path(&evidence_id)?;
    let on_disk = fs::read(&file_path)?;

    let plaintext = match &state.cipher {
        Some(cipher) => cipher.decrypt_from_storage(&on_disk)?,
        None => on_disk,
    };
    let actual = hash::sha256_bytes(&plaintext);
    let ok = actual == evidence.sha256;

    let mut details = std::collections::BTreeMap::new();
    details.insert("purpose".to_string(), serde_json::Value::String("integrity_verification".to_string()));

    let mut ledger = state.ledger.lock().await;
    ledger.append_event(
        &evidence_id,
        ActionType::Access,
        &principal,
        &evidence.sha256,
        Some(&actual),
        ok,
        details,
        true,
    )?;

    Ok(Json(VerifyResponse {
        evidence_id,
        expected_sha256: evidence.sha256,
        actual_sha256: actual,
        integrity_ok: ok,
    }))
}

/// `GET /evidence/{evidence_id}/timeline`
pub async fn timeline(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(evidence_id): Path<String>,
) -> Result<Json<TimelineResponse>, ApiError> {
    authorize(&state, &headers, Action::ViewEvidence)?;

    let evidence = state.store.get(&evidence_id)?;
    let ledger = state.ledger.lock().await;
    let events = ledger.get_timeline(&evidence_id)?;

    Ok(Json(TimelineResponse {
        evidence_id,
        expected_sha256: evidence.sha256,
        events: events.into_iter().map(to_event_response).collect(),
    }))
}

/// `GET /evidence/{evidence_id}/report`
pub async fn report(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(evidence_id): Path<String>,
) -> Result<Json<ReportResponse>, ApiError> {
    authorize(&state, &headers, Action::GenerateReport)?;

    let evidence = state.store.get(&evidence_id)?;
    let ledger = state.ledger.lock().await;
    let events = ledger.get_timeline(&evidence_id)?;
    let validation = ledger.validate_chain()?;
    drop(ledger);

    let rep = custody_ledger::reporting::build_court_report(&evidence, &events, validation.valid, &validation.reason);

    Ok(Json(ReportResponse {
        evidence_id,
        generated_at: rep.generated_at.clone(),
        report: rep,
    }))
}
