//! Prototype identity provider.
//!
//! In production this would be replaced by OIDC + mTLS client certs plus an
//! organization certificate authority. Here the service receives an opaque
//! `X-User-Id` header and resolves it against a fixed table.

use std::collections::HashMap;

use custody_ledger::{Principal, Role};

/// Fixed user -> (role, org) directory.
pub struct IdentityProvider {
    users: HashMap<&'static str, (Role, &'static str)>,
}

impl IdentityProvider {
    pub fn new() -> Self {
        let mut users = HashMap::new();
        users.insert("officer1", (Role::FieldOfficer, "KPS"));
        users.insert("analyst1", (Role::ForensicAnalyst, "FORENSIC_LAB"));
        users.insert("supervisor1", (Role::Supervisor, "KPS"));
        users.insert("prosecutor1", (Role::Prosecutor, "ODPP"));
        users.insert("judge1", (Role::Judge, "JUDICIARY"));
        users.insert("auditor1", (Role::SystemAuditor, "INTERNAL_AUDIT"));
        Self { users }
    }

    /// Resolves an `X-User-Id` header value to a [`Principal`]. Returns
    /// `None` for an unknown user id; the caller maps that to 401.
    pub fn resolve(&self, user_id: &str) -> Option<Principal> {
        let (role, org_id) = *self.users.get(user_id)?;
        Some(Principal {
            user_id: user_id.to_string(),
            role,
            org_id: org_id.to_string(),
        })
    }
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_known_users_to_their_role_and_org() {
        let idp = IdentityProvider::new();
        let officer = idp.resolve("officer1").unwrap();
        assert_eq!(officer.role, Role::FieldOfficer);
        assert_eq!(officer.org_id, "KPS");
    }

    #[test]
    fn unknown_user_resolves_to_none() {
        let idp = IdentityProvider::new();
        assert!(idp.resolve("nobody").is_none());
    }
}
