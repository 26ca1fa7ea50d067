use crate::domain_model::{ClientId, ScopeSet, UserId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct GrantKey {
    pub user_id: UserId,
    pub client_id: ClientId,
}

impl GrantKey {
    pub fn new(user_id: UserId, client_id: ClientId) -> Self {
        Self { user_id, client_id }
    }
}

impl fmt::Display for GrantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.client_id)
    }
}

/// Scopes a user approved for a client.
///
/// `revision` is bumped on every revocation. Tokens carry the revision they
/// were minted under, so bumping it invalidates everything issued before.
#[derive(Debug, Clone, Serialize)]
pub struct Grant {
    pub user_id: UserId,
    pub client_id: ClientId,
    pub scopes: ScopeSet,
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Grant {
    pub fn new(user_id: UserId, client_id: ClientId, scopes: ScopeSet, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            client_id,
            scopes,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> GrantKey {
        GrantKey::new(self.user_id, self.client_id.clone())
    }

    pub fn is_offline(&self) -> bool {
        self.scopes.has_offline()
    }

    /// A grant whose scopes were all withdrawn is kept for its revision but
    /// no longer shown or honored.
    pub fn is_active(&self) -> bool {
        !self.scopes.is_empty()
    }

    pub fn covers(&self, requested: &ScopeSet) -> bool {
        requested.is_subset(&self.scopes)
    }

    /// Adds `scopes` to the grant. Returns true when this turned the grant
    /// into an offline grant.
    pub fn merge(&mut self, scopes: &ScopeSet, now: DateTime<Utc>) -> bool {
        let was_offline = self.is_offline();
        self.scopes = self.scopes.union(scopes);
        self.updated_at = now;
        !was_offline && self.is_offline()
    }

    pub fn withdraw_offline(&mut self, now: DateTime<Utc>) {
        self.scopes = self.scopes.without_offline();
        self.revision += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grant(scopes: &str) -> Grant {
        Grant::new(
            UserId(uuid::Uuid::new_v4()),
            ClientId::new("product-portal"),
            ScopeSet::parse(scopes),
            Utc::now(),
        )
    }

    #[test]
    fn merge_reports_offline_transition_once() {
        let mut g = grant("openid");
        assert!(g.merge(&ScopeSet::parse("offline_access"), Utc::now()));
        assert!(!g.merge(&ScopeSet::parse("offline_access profile"), Utc::now()));
        assert!(g.is_offline());
        assert_eq!(g.scopes.len(), 3);
    }

    #[test]
    fn withdraw_offline_bumps_revision_and_keeps_other_scopes() {
        let mut g = grant("openid offline_access");
        g.withdraw_offline(Utc::now());
        assert_eq!(g.revision, 1);
        assert!(!g.is_offline());
        assert!(g.is_active());
    }

    #[test]
    fn offline_only_grant_becomes_inactive_after_withdraw() {
        let mut g = grant("offline_access");
        g.withdraw_offline(Utc::now());
        assert!(!g.is_active());
    }
}
