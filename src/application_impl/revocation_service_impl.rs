use crate::application_impl::GrantLocks;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealRevocationService {
    consent_repo: Arc<dyn ConsentRepo>,
    sessions: Arc<dyn OfflineSessionStore>,
    event_sink: Arc<dyn GrantEventSink>,
    locks: Arc<GrantLocks>,
    clock: Arc<dyn Clock>,
}

impl RealRevocationService {
    pub fn new(
        consent_repo: Arc<dyn ConsentRepo>,
        sessions: Arc<dyn OfflineSessionStore>,
        event_sink: Arc<dyn GrantEventSink>,
        locks: Arc<GrantLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            consent_repo,
            sessions,
            event_sink,
            locks,
            clock,
        }
    }
}

#[async_trait::async_trait]
impl RevocationService for RealRevocationService {
    async fn revoke(&self, user_id: UserId, client_id: &ClientId) -> Result<(), AuthError> {
        let key = GrantKey::new(user_id, client_id.clone());
        let _guard = self.locks.acquire(&key).await;

        let existing = self.consent_repo.get(&key).await?.filter(Grant::is_active);
        let Some(mut grant) = existing else {
            tracing::debug!(grant = %key, "revoke without grant");
            return Ok(());
        };

        // Session first: a grant that still says offline while its session is
        // gone only ever fails closed.
        let destroyed = self.sessions.destroy(&key).await?;
        if destroyed.is_none() && !grant.is_offline() {
            tracing::debug!(grant = %key, "revoke without offline access");
            return Ok(());
        }
        let revoked_scopes = grant.scopes.intersection(&ScopeSet::parse(OFFLINE_ACCESS));
        let now = self.clock.now();
        grant.withdraw_offline(now);
        self.consent_repo.upsert(&grant).await?;

        tracing::info!(
            grant = %key,
            session_id = ?destroyed.as_ref().map(|s| s.id),
            revision = grant.revision,
            "grant revoked"
        );

        let event = GrantEvent::new(
            GrantEventType::RevokeGrant,
            user_id,
            client_id.clone(),
            revoked_scopes,
            now,
        )
        .acted_by(ClientId::new(ACCOUNT_CONSOLE_CLIENT));
        if let Err(e) = self.event_sink.emit(&event).await {
            tracing::error!(grant = %key, "revoke event not delivered: {e:#}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;
    use chrono::Utc;

    struct Fixture {
        service: RealRevocationService,
        grants: Arc<MemoryConsentRepo>,
        sessions: Arc<MemoryOfflineSessionStore>,
        events: Arc<MemoryGrantEventSink>,
    }

    fn fixture() -> Fixture {
        let grants = Arc::new(MemoryConsentRepo::new());
        let sessions = Arc::new(MemoryOfflineSessionStore::new());
        let events = Arc::new(MemoryGrantEventSink::new());
        let service = RealRevocationService::new(
            grants.clone(),
            sessions.clone(),
            events.clone(),
            Arc::new(GrantLocks::new()),
            Arc::new(AdjustableClock::new()),
        );
        Fixture {
            service,
            grants,
            sessions,
            events,
        }
    }

    async fn seed(f: &Fixture, scopes: &str) -> Grant {
        let grant = Grant::new(
            UserId(uuid::Uuid::new_v4()),
            ClientId::new("product-portal"),
            ScopeSet::parse(scopes),
            Utc::now(),
        );
        f.grants.upsert(&grant).await.unwrap();
        if grant.is_offline() {
            f.sessions.create(&grant, Utc::now()).await.unwrap();
        }
        grant
    }

    #[tokio::test]
    async fn revoke_withdraws_offline_and_bumps_revision() {
        let f = fixture();
        let grant = seed(&f, "openid offline_access").await;

        f.service.revoke(grant.user_id, &grant.client_id).await.unwrap();

        let stored = f.grants.get(&grant.key()).await.unwrap().unwrap();
        assert!(!stored.is_offline());
        assert!(stored.scopes.contains(&Scope::new("openid")));
        assert_eq!(stored.revision, grant.revision + 1);
        assert!(f.sessions.is_empty());

        let events = f.events.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, GrantEventType::RevokeGrant);
        assert!(events[0].scopes.has_offline());
        assert_eq!(events[0].acting_client.as_str(), ACCOUNT_CONSOLE_CLIENT);
        assert_ne!(events[0].client_id, events[0].acting_client);
    }

    #[tokio::test]
    async fn missing_grant_is_a_quiet_success() {
        let f = fixture();
        let user = UserId(uuid::Uuid::new_v4());

        f.service
            .revoke(user, &ClientId::new("product-portal"))
            .await
            .unwrap();
        assert!(f.events.events().is_empty());
    }

    #[tokio::test]
    async fn grant_without_offline_access_is_left_alone() {
        let f = fixture();
        let grant = seed(&f, "openid profile").await;

        f.service.revoke(grant.user_id, &grant.client_id).await.unwrap();

        let stored = f.grants.get(&grant.key()).await.unwrap().unwrap();
        assert_eq!(stored.revision, grant.revision);
        assert!(f.events.events().is_empty());
    }
}
