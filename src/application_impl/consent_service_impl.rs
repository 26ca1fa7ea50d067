use crate::application_impl::GrantLocks;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealConsentService {
    client_repo: Arc<dyn ClientRepo>,
    consent_repo: Arc<dyn ConsentRepo>,
    sessions: Arc<dyn OfflineSessionStore>,
    event_sink: Arc<dyn GrantEventSink>,
    locks: Arc<GrantLocks>,
    clock: Arc<dyn Clock>,
}

impl RealConsentService {
    pub fn new(
        client_repo: Arc<dyn ClientRepo>,
        consent_repo: Arc<dyn ConsentRepo>,
        sessions: Arc<dyn OfflineSessionStore>,
        event_sink: Arc<dyn GrantEventSink>,
        locks: Arc<GrantLocks>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client_repo,
            consent_repo,
            sessions,
            event_sink,
            locks,
            clock,
        }
    }

    async fn load_client(&self, client_id: &ClientId) -> Result<Client, AuthError> {
        self.client_repo
            .get(client_id)
            .await?
            .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))
    }

    /// Opens the offline session for a grant that just turned offline.
    /// Returns true when this call created it, false when a live session was
    /// already registered for the pair.
    async fn open_offline_session(&self, grant: &Grant) -> Result<bool, AuthError> {
        match self.sessions.create(grant, self.clock.now()).await {
            Ok(session) => {
                tracing::info!(grant = %grant.key(), session_id = %session.id, "offline session opened");
                Ok(true)
            }
            Err(AuthError::Conflict(key)) => match self.sessions.lookup_by_pair(&key).await? {
                Some(session) => {
                    tracing::warn!(grant = %key, session_id = %session.id, "offline session already present, reusing it");
                    Ok(false)
                }
                None => Err(AuthError::Store(format!(
                    "offline session index for {key} points at no session"
                ))),
            },
            Err(e) => Err(e),
        }
    }
}

#[async_trait::async_trait]
impl ConsentService for RealConsentService {
    async fn get_grant(
        &self,
        user_id: UserId,
        client_id: &ClientId,
    ) -> Result<Option<Grant>, AuthError> {
        self.consent_repo
            .get(&GrantKey::new(user_id, client_id.clone()))
            .await
    }

    async fn record_consent(
        &self,
        user_id: UserId,
        client_id: &ClientId,
        scopes: &ScopeSet,
    ) -> Result<Grant, AuthError> {
        let client = self.load_client(client_id).await?;
        let unknown = scopes.difference(&client.advertised_scopes());
        if !unknown.is_empty() {
            return Err(AuthError::InvalidScope(unknown.to_string()));
        }

        let key = GrantKey::new(user_id, client.id.clone());
        let _guard = self.locks.acquire(&key).await;
        let now = self.clock.now();

        let (grant, gained_offline) = match self.consent_repo.get(&key).await? {
            Some(existing) if existing.covers(scopes) => return Ok(existing),
            Some(mut existing) => {
                let gained = existing.merge(scopes, now);
                (existing, gained)
            }
            None => {
                let grant = Grant::new(user_id, client.id.clone(), scopes.clone(), now);
                let offline = grant.is_offline();
                (grant, offline)
            }
        };

        let opened = gained_offline && self.open_offline_session(&grant).await?;
        if let Err(e) = self.consent_repo.upsert(&grant).await {
            // Only a session this call opened is rolled back.
            if opened {
                if let Err(undo) = self.sessions.destroy(&key).await {
                    tracing::error!(grant = %key, error = %undo, "offline session left without grant");
                }
            }
            return Err(e);
        }

        tracing::info!(grant = %key, scopes = %grant.scopes, "consent recorded");
        let event = GrantEvent::new(
            GrantEventType::ConsentGranted,
            user_id,
            client.id.clone(),
            grant.scopes.clone(),
            now,
        );
        if let Err(e) = self.event_sink.emit(&event).await {
            tracing::error!(grant = %key, "consent event not delivered: {e:#}");
        }

        Ok(grant)
    }

    async fn list_grants(&self, user_id: UserId) -> Result<Vec<(Client, Grant)>, AuthError> {
        let grants = self.consent_repo.list_by_user(user_id).await?;
        let mut listed = Vec::with_capacity(grants.len());
        for grant in grants.into_iter().filter(Grant::is_active) {
            match self.client_repo.get(&grant.client_id).await? {
                Some(client) => listed.push((client, grant)),
                None => tracing::warn!(grant = %grant.key(), "grant for unregistered client skipped"),
            }
        }
        Ok(listed)
    }

    async fn list_applications(&self, user_id: UserId) -> Result<Vec<ApplicationView>, AuthError> {
        let mut views = Vec::new();
        for (client, grant) in self.list_grants(user_id).await? {
            let mut additional_grants = Vec::new();
            if self.sessions.lookup_by_pair(&grant.key()).await?.is_some() {
                additional_grants.push(OFFLINE_TOKEN_GRANT.to_string());
            }
            views.push(ApplicationView {
                client_id: client.id,
                client_name: client.name,
                granted_scopes: grant.scopes.display_names(),
                additional_grants,
            });
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;
    use chrono::{DateTime, Utc};

    struct Fixture {
        service: RealConsentService,
        sessions: Arc<MemoryOfflineSessionStore>,
        events: Arc<MemoryGrantEventSink>,
    }

    struct RefusingConsentRepo;

    #[async_trait::async_trait]
    impl ConsentRepo for RefusingConsentRepo {
        async fn get(&self, _key: &GrantKey) -> Result<Option<Grant>, AuthError> {
            Ok(None)
        }

        async fn upsert(&self, _grant: &Grant) -> Result<(), AuthError> {
            Err(AuthError::Store("grant table unavailable".to_string()))
        }

        async fn list_by_user(&self, _user_id: UserId) -> Result<Vec<Grant>, AuthError> {
            Ok(Vec::new())
        }
    }

    /// Pair index that claims a session which is not there.
    struct DanglingIndexSessions;

    #[async_trait::async_trait]
    impl OfflineSessionStore for DanglingIndexSessions {
        async fn create(&self, grant: &Grant, _now: DateTime<Utc>) -> Result<OfflineSession, AuthError> {
            Err(AuthError::Conflict(grant.key()))
        }

        async fn bind(
            &self,
            _session_id: OfflineSessionId,
            _refresh_id: &TokenId,
            _access_id: &TokenId,
        ) -> Result<OfflineSession, AuthError> {
            Err(AuthError::UnknownToken)
        }

        async fn rotate(
            &self,
            _session_id: OfflineSessionId,
            _presented: &TokenId,
            _new_refresh_id: &TokenId,
            _new_access_id: &TokenId,
            _now: DateTime<Utc>,
        ) -> Result<OfflineSession, AuthError> {
            Err(AuthError::UnknownToken)
        }

        async fn lookup(
            &self,
            _session_id: OfflineSessionId,
        ) -> Result<Option<OfflineSession>, AuthError> {
            Ok(None)
        }

        async fn lookup_by_pair(&self, _key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
            Ok(None)
        }

        async fn destroy(&self, _key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
            Ok(None)
        }
    }

    fn clients() -> Arc<MemoryClientRepo> {
        Arc::new(MemoryClientRepo::new([
            Client {
                id: ClientId::new("product-portal"),
                name: "Product Portal".to_string(),
                consent_required: true,
                default_scopes: ScopeSet::parse("openid profile"),
                optional_scopes: ScopeSet::parse("offline_access"),
            },
            Client {
                id: ClientId::new("analytics"),
                name: "Analytics".to_string(),
                consent_required: false,
                default_scopes: ScopeSet::parse("openid"),
                optional_scopes: ScopeSet::new(),
            },
        ]))
    }

    fn service_with(
        consent_repo: Arc<dyn ConsentRepo>,
        sessions: Arc<dyn OfflineSessionStore>,
        events: Arc<MemoryGrantEventSink>,
    ) -> RealConsentService {
        RealConsentService::new(
            clients(),
            consent_repo,
            sessions,
            events,
            Arc::new(GrantLocks::new()),
            Arc::new(AdjustableClock::new()),
        )
    }

    fn fixture() -> Fixture {
        let sessions = Arc::new(MemoryOfflineSessionStore::new());
        let events = Arc::new(MemoryGrantEventSink::new());
        let service = service_with(
            Arc::new(MemoryConsentRepo::new()),
            sessions.clone(),
            events.clone(),
        );
        Fixture {
            service,
            sessions,
            events,
        }
    }

    fn user() -> UserId {
        UserId(uuid::Uuid::new_v4())
    }

    #[tokio::test]
    async fn no_grant_before_consent() {
        let f = fixture();
        let grant = f
            .service
            .get_grant(user(), &ClientId::new("product-portal"))
            .await
            .unwrap();
        assert!(grant.is_none());
    }

    #[tokio::test]
    async fn offline_consent_opens_session() {
        let f = fixture();
        let user = user();
        let client = ClientId::new("product-portal");

        let grant = f
            .service
            .record_consent(user, &client, &ScopeSet::parse("openid offline_access"))
            .await
            .unwrap();

        assert!(grant.is_offline());
        let session = f
            .sessions
            .lookup_by_pair(&grant.key())
            .await
            .unwrap()
            .expect("offline session");
        assert_eq!(session.user_id, user);
        assert_eq!(f.events.events().len(), 1);
    }

    #[tokio::test]
    async fn repeated_consent_is_idempotent() {
        let f = fixture();
        let user = user();
        let client = ClientId::new("product-portal");
        let scopes = ScopeSet::parse("openid offline_access");

        let first = f.service.record_consent(user, &client, &scopes).await.unwrap();
        let second = f.service.record_consent(user, &client, &scopes).await.unwrap();
        let narrower = f
            .service
            .record_consent(user, &client, &ScopeSet::parse("openid"))
            .await
            .unwrap();

        assert_eq!(first.scopes, second.scopes);
        assert_eq!(first.scopes, narrower.scopes);
        assert_eq!(f.sessions.len(), 1);
        assert_eq!(f.events.events().len(), 1);
    }

    #[tokio::test]
    async fn later_offline_consent_merges_scopes() {
        let f = fixture();
        let user = user();
        let client = ClientId::new("product-portal");

        f.service
            .record_consent(user, &client, &ScopeSet::parse("openid profile"))
            .await
            .unwrap();
        assert!(f.sessions.is_empty());

        let grant = f
            .service
            .record_consent(user, &client, &ScopeSet::parse("offline_access"))
            .await
            .unwrap();
        assert_eq!(grant.scopes, ScopeSet::parse("openid profile offline_access"));
        assert_eq!(f.sessions.len(), 1);
    }

    #[tokio::test]
    async fn scope_outside_client_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .record_consent(user(), &ClientId::new("analytics"), &ScopeSet::parse("openid offline_access"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidScope(s) if s == "offline_access"));
    }

    #[tokio::test]
    async fn unknown_client_is_rejected() {
        let f = fixture();
        let err = f
            .service
            .record_consent(user(), &ClientId::new("nope"), &ScopeSet::parse("openid"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UnknownClient(_)));
    }

    #[tokio::test]
    async fn applications_are_ordered_and_flag_offline() {
        let f = fixture();
        let user = user();
        f.service
            .record_consent(user, &ClientId::new("product-portal"), &ScopeSet::parse("openid offline_access"))
            .await
            .unwrap();
        f.service
            .record_consent(user, &ClientId::new("analytics"), &ScopeSet::parse("openid"))
            .await
            .unwrap();

        let apps = f.service.list_applications(user).await.unwrap();
        let ids: Vec<&str> = apps.iter().map(|a| a.client_id.as_str()).collect();
        assert_eq!(ids, vec!["analytics", "product-portal"]);
        assert!(apps[0].additional_grants.is_empty());
        assert_eq!(apps[1].additional_grants, vec![OFFLINE_TOKEN_GRANT.to_string()]);
        assert!(apps[1].granted_scopes.contains(&"Offline access".to_string()));
    }

    #[tokio::test]
    async fn failed_grant_write_rolls_back_the_new_session() {
        let sessions = Arc::new(MemoryOfflineSessionStore::new());
        let events = Arc::new(MemoryGrantEventSink::new());
        let service = service_with(Arc::new(RefusingConsentRepo), sessions.clone(), events.clone());

        let err = service
            .record_consent(user(), &ClientId::new("product-portal"), &ScopeSet::parse("offline_access"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        assert!(sessions.is_empty());
        assert!(events.events().is_empty());
    }

    #[tokio::test]
    async fn failed_grant_write_keeps_a_session_it_did_not_open() {
        let sessions = Arc::new(MemoryOfflineSessionStore::new());
        let service = service_with(
            Arc::new(RefusingConsentRepo),
            sessions.clone(),
            Arc::new(MemoryGrantEventSink::new()),
        );
        let user = user();
        let client = ClientId::new("product-portal");
        let earlier = Grant::new(user, client.clone(), ScopeSet::parse("offline_access"), Utc::now());
        let session = sessions.create(&earlier, Utc::now()).await.unwrap();

        service
            .record_consent(user, &client, &ScopeSet::parse("offline_access"))
            .await
            .unwrap_err();
        let still_there = sessions.lookup_by_pair(&earlier.key()).await.unwrap();
        assert_eq!(still_there.map(|s| s.id), Some(session.id));
    }

    #[tokio::test]
    async fn dangling_session_index_does_not_yield_an_offline_grant() {
        let grants = Arc::new(MemoryConsentRepo::new());
        let service = service_with(
            grants.clone(),
            Arc::new(DanglingIndexSessions),
            Arc::new(MemoryGrantEventSink::new()),
        );
        let user = user();
        let client = ClientId::new("product-portal");

        let err = service
            .record_consent(user, &client, &ScopeSet::parse("offline_access"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        let stored = grants.get(&GrantKey::new(user, client)).await.unwrap();
        assert!(stored.is_none());
    }
}
