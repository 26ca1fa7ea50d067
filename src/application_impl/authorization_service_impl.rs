use crate::application_impl::{GrantLocks, TokenIssuer};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use nanoid::nanoid;
use std::sync::Arc;

struct PendingFlow {
    user_id: UserId,
    client_id: ClientId,
    scopes: ScopeSet,
    expires_at: DateTime<Utc>,
}

pub struct RealAuthorizationService {
    client_repo: Arc<dyn ClientRepo>,
    consent_service: Arc<dyn ConsentService>,
    issuer: Arc<TokenIssuer>,
    locks: Arc<GrantLocks>,
    clock: Arc<dyn Clock>,
    flows: DashMap<FlowId, PendingFlow>,
    flow_ttl: chrono::Duration,
}

impl RealAuthorizationService {
    pub fn new(
        client_repo: Arc<dyn ClientRepo>,
        consent_service: Arc<dyn ConsentService>,
        issuer: Arc<TokenIssuer>,
        locks: Arc<GrantLocks>,
        clock: Arc<dyn Clock>,
        flow_ttl: chrono::Duration,
    ) -> Self {
        Self {
            client_repo,
            consent_service,
            issuer,
            locks,
            clock,
            flows: DashMap::new(),
            flow_ttl,
        }
    }

    async fn load_client(&self, client_id: &ClientId) -> Result<Client, AuthError> {
        self.client_repo
            .get(client_id)
            .await?
            .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))
    }

    /// Records consent for `scopes` and issues the first token pair.
    async fn grant_and_issue(
        &self,
        user_id: UserId,
        client_id: &ClientId,
        scopes: &ScopeSet,
    ) -> Result<TokenPair, AuthError> {
        let grant = self
            .consent_service
            .record_consent(user_id, client_id, scopes)
            .await?;

        let _guard = self.locks.acquire(&grant.key()).await;
        // Re-read under the lock; a revoke may have landed in between.
        let grant = self
            .consent_service
            .get_grant(user_id, client_id)
            .await?
            .filter(|g| g.covers(scopes))
            .ok_or(AuthError::UnknownToken)?;

        let pair = self.issuer.issue_for_login(&grant, scopes).await?;
        tracing::info!(
            grant = %grant.key(),
            offline = pair.refresh.token.is_offline(),
            "tokens issued"
        );
        Ok(pair)
    }
}

#[async_trait::async_trait]
impl AuthorizationService for RealAuthorizationService {
    async fn authorize(&self, input: AuthorizeInput) -> Result<AuthorizeOutcome, AuthError> {
        let client = self.load_client(&input.client_id).await?;

        let requested = ScopeSet::parse(&input.scope);
        let unknown = requested.difference(&client.advertised_scopes());
        if !unknown.is_empty() {
            return Err(AuthError::InvalidScope(unknown.to_string()));
        }
        let scopes = client.default_scopes.union(&requested);

        let existing = self
            .consent_service
            .get_grant(input.user_id, &client.id)
            .await?;

        if self
            .consent_service
            .requires_prompt(&client, &scopes, existing.as_ref())
        {
            let flow_id = FlowId(nanoid!());
            let now = self.clock.now();
            let expires_at = now
                .checked_add_signed(self.flow_ttl)
                .ok_or_else(|| AuthError::InternalError(format!("flow deadline past {now} overflows")))?;
            let prompt = ConsentPrompt {
                flow_id: flow_id.clone(),
                client_id: client.id.clone(),
                client_name: client.name.clone(),
                scopes: scopes.display_names(),
                offline_requested: scopes.has_offline(),
                expires_at,
            };
            self.flows.insert(
                flow_id.clone(),
                PendingFlow {
                    user_id: input.user_id,
                    client_id: client.id,
                    scopes,
                    expires_at,
                },
            );
            tracing::debug!(flow_id = %flow_id, "authorization waiting for consent");
            return Ok(AuthorizeOutcome::ConsentRequired(prompt));
        }

        let pair = self
            .grant_and_issue(input.user_id, &client.id, &scopes)
            .await?;
        Ok(AuthorizeOutcome::Issued(pair))
    }

    async fn accept(&self, flow_id: &FlowId) -> Result<TokenPair, AuthError> {
        let (_, flow) = self.flows.remove(flow_id).ok_or(AuthError::FlowNotFound)?;
        if flow.expires_at <= self.clock.now() {
            return Err(AuthError::FlowNotFound);
        }
        self.grant_and_issue(flow.user_id, &flow.client_id, &flow.scopes)
            .await
    }

    async fn cancel(&self, flow_id: &FlowId) -> Result<(), AuthError> {
        if self.flows.remove(flow_id).is_none() {
            tracing::debug!(flow_id = %flow_id, "cancel for unknown flow");
        }
        Ok(())
    }

    async fn sweep_expired_flows(&self) -> usize {
        let now = self.clock.now();
        let before = self.flows.len();
        self.flows.retain(|_, flow| flow.expires_at > now);
        before.saturating_sub(self.flows.len())
    }
}
