use crate::application_impl::{GrantLocks, TokenIssuer};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Refresh attempts go Received -> Validated -> Rotated, or end Rejected at
/// the first failed check. Only a successful offline rotation writes.
pub struct RealRefreshCoordinator {
    codec: Arc<dyn TokenCodec>,
    consent_repo: Arc<dyn ConsentRepo>,
    sessions: Arc<dyn OfflineSessionStore>,
    issuer: Arc<TokenIssuer>,
    locks: Arc<GrantLocks>,
    clock: Arc<dyn Clock>,
    leeway: chrono::Duration,
}

impl RealRefreshCoordinator {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        consent_repo: Arc<dyn ConsentRepo>,
        sessions: Arc<dyn OfflineSessionStore>,
        issuer: Arc<TokenIssuer>,
        locks: Arc<GrantLocks>,
        clock: Arc<dyn Clock>,
        leeway: chrono::Duration,
    ) -> Self {
        Self {
            codec,
            consent_repo,
            sessions,
            issuer,
            locks,
            clock,
            leeway,
        }
    }

    async fn validate(
        &self,
        presented: &Token,
    ) -> Result<(Grant, Option<OfflineSession>), AuthError> {
        let key = presented.grant_key();

        let session = if presented.is_offline() {
            // Registry membership decides; the token's own exp is 0.
            let session_id = presented.session_id.ok_or(AuthError::Malformed)?;
            let session = self
                .sessions
                .lookup(session_id)
                .await?
                .filter(|s| s.key() == key)
                .ok_or(AuthError::UnknownToken)?;
            if !session.is_current(&presented.id) {
                return Err(AuthError::Reused);
            }
            Some(session)
        } else {
            if presented
                .expiration
                .has_passed(self.clock.now(), self.leeway)
            {
                return Err(AuthError::Expired);
            }
            None
        };

        let grant = self
            .consent_repo
            .get(&key)
            .await?
            .filter(|g| g.revision == presented.grant_revision && g.is_active())
            .filter(|g| session.is_none() || g.is_offline())
            .ok_or(AuthError::UnknownToken)?;

        Ok((grant, session))
    }
}

#[async_trait::async_trait]
impl RefreshCoordinator for RealRefreshCoordinator {
    async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, AuthError> {
        let presented = self.codec.parse(raw_refresh_token).await?;
        if presented.kind() != TokenKind::Refresh {
            return Err(AuthError::Malformed);
        }

        let key = presented.grant_key();
        let _guard = self.locks.acquire(&key).await;

        let (grant, session) = match self.validate(&presented).await {
            Ok(validated) => validated,
            Err(e) => {
                tracing::info!(grant = %key, token_id = %presented.id, "refresh rejected: {e}");
                return Err(e);
            }
        };

        let scopes = presented.scopes.intersection(&grant.scopes);
        let pair = self.issuer.mint(&grant, &scopes, session.as_ref()).await?;

        if let Some(session) = &session {
            self.sessions
                .rotate(
                    session.id,
                    &presented.id,
                    &pair.refresh.token.id,
                    &pair.access.token.id,
                    self.clock.now(),
                )
                .await?;
        }

        tracing::debug!(
            grant = %key,
            offline = session.is_some(),
            old = %presented.id,
            new = %pair.refresh.token.id,
            "refresh token rotated"
        );
        Ok(pair)
    }
}
