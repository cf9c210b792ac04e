//! Role-based authorization and endorsement quorum policy.
//!
//! The role and action sets are closed, so this uses a tagged enumeration
//! plus a lookup match rather than a trait-object class hierarchy.

use serde::{Deserialize, Serialize};

/// A custody-service actor's role. This set is closed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    FieldOfficer,
    ForensicAnalyst,
    Supervisor,
    Prosecutor,
    Judge,
    SystemAuditor,
}

impl Role {
    /// Parses the wire representation used in requests and reports
    /// (`"FIELD_OFFICER"`, etc).
    pub fn from_wire(s: &str) -> Option<Self> {
        Some(match s {
            "FIELD_OFFICER" => Role::FieldOfficer,
            "FORENSIC_ANALYST" => Role::ForensicAnalyst,
            "SUPERVISOR" => Role::Supervisor,
            "PROSECUTOR" => Role::Prosecutor,
            "JUDGE" => Role::Judge,
            "SYSTEM_AUDITOR" => Role::SystemAuditor,
            _ => return None,
        })
    }

    /// Returns the wire representation of this role.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::FieldOfficer => "FIELD_OFFICER",
            Role::ForensicAnalyst => "FORENSIC_ANALYST",
            Role::Supervisor => "SUPERVISOR",
            Role::Prosecutor => "PROSECUTOR",
            Role::Judge => "JUDGE",
            Role::SystemAuditor => "SYSTEM_AUDITOR",
        }
    }
}

/// An action gated by [`Role`] permissions. This set is closed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    RegisterEvidence,
    RecordEvent,
    VerifyIntegrity,
    ViewEvidence,
    GenerateReport,
}

/// Identity of the actor performing a request, as resolved by the
/// (external) identity provider.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
    pub org_id: String,
}

/// Returns `true` if `role` is permitted to perform `action`, per the exact
/// closed permission matrix.
pub fn is_permitted(role: Role, action: Action) -> bool {
    use Action::*;
    use Role::*;
    matches!(
        (role, action),
        (FieldOfficer, RegisterEvidence)
            | (FieldOfficer, RecordEvent)
            | (FieldOfficer, VerifyIntegrity)
            | (FieldOfficer, ViewEvidence)
            | (ForensicAnalyst, RecordEvent)
            | (ForensicAnalyst, VerifyIntegrity)
            | (ForensicAnalyst, ViewEvidence)
            | (Supervisor, RecordEvent)
            | (Supervisor, VerifyIntegrity)
            | (Supervisor, ViewEvidence)
            | (Supervisor, GenerateReport)
            | (Prosecutor, ViewEvidence)
            | (Prosecutor, GenerateReport)
            | (Judge, ViewEvidence)
            | (Judge, GenerateReport)
            | (SystemAuditor, ViewEvidence)
            | (SystemAuditor, GenerateReport)
    )
}

/// Action types that require a two-organization endorsement quorum.
const DUAL_ORG_ACTIONS: [&str; 2] = ["TRANSFER", "COURT_SUBMISSION"];

/// Returns the endorsement quorum (distinct organizations) required before
/// an event of `action_type` is considered FINAL.
pub fn required_endorser_org_count(action_type: &str) -> u32 {
    if DUAL_ORG_ACTIONS.contains(&action_type) {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_matrix_matches_closed_role_table() {
        use Action::*;
        use Role::*;

        let expected: &[(Role, &[Action])] = &[
            (
                FieldOfficer,
                &[RegisterEvidence, RecordEvent, VerifyIntegrity, ViewEvidence],
            ),
            (ForensicAnalyst, &[RecordEvent, VerifyIntegrity, ViewEvidence]),
            (
                Supervisor,
                &[RecordEvent, VerifyIntegrity, ViewEvidence, GenerateReport],
            ),
            (Prosecutor, &[ViewEvidence, GenerateReport]),
            (Judge, &[ViewEvidence, GenerateReport]),
            (SystemAuditor, &[ViewEvidence, GenerateReport]),
        ];

        let all_actions = [
            RegisterEvidence,
            RecordEvent,
            VerifyIntegrity,
            ViewEvidence,
            GenerateReport,
        ];

        for (role, allowed) in expected {
            for action in all_actions {
                let should_allow = allowed.contains(&action);
                assert_eq!(
                    is_permitted(*role, action),
                    should_allow,
                    "role={role:?} action={action:?}"
                );
            }
        }
    }

    #[test]
    fn dual_org_quorum_only_for_transfer_and_court_submission() {
        assert_eq!(required_endorser_org_count("TRANSFER"), 2);
        assert_eq!(required_endorser_org_count("COURT_SUBMISSION"), 2);
        for action in ["INTAKE", "ACCESS", "ANALYSIS", "STORAGE", "ENDORSE"] {
            assert_eq!(required_endorser_org_count(action), 1);
        }
    }

    #[test]
    fn role_wire_roundtrip() {
        for role in [
            Role::FieldOfficer,
            Role::ForensicAnalyst,
            Role::Supervisor,
            Role::Prosecutor,
            Role::Judge,
            Role::SystemAuditor,
        ] {
            let wire = role.as_wire();
            assert_eq!(Role::from_wire(wire), Some(role));
        }
        assert_eq!(Role::from_wire("NOT_A_ROLE"), None);
    }
}
