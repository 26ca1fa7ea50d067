use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Lock-free check of access tokens. Revocation shows up here lazily: the
/// grant revision moves and the offline session disappears.
pub struct RealAccessVerifier {
    codec: Arc<dyn TokenCodec>,
    consent_repo: Arc<dyn ConsentRepo>,
    sessions: Arc<dyn OfflineSessionStore>,
    clock: Arc<dyn Clock>,
    leeway: chrono::Duration,
}

impl RealAccessVerifier {
    pub fn new(
        codec: Arc<dyn TokenCodec>,
        consent_repo: Arc<dyn ConsentRepo>,
        sessions: Arc<dyn OfflineSessionStore>,
        clock: Arc<dyn Clock>,
        leeway: chrono::Duration,
    ) -> Self {
        Self {
            codec,
            consent_repo,
            sessions,
            clock,
            leeway,
        }
    }
}

#[async_trait::async_trait]
impl AccessVerifier for RealAccessVerifier {
    async fn verify_access(&self, raw_access_token: &str) -> Result<AccessInfo, AuthError> {
        let token = self.codec.parse(raw_access_token).await?;
        if token.kind() != TokenKind::Access {
            return Err(AuthError::Malformed);
        }

        let now = self.clock.now();
        if token.expiration.has_passed(now, self.leeway) {
            return Err(AuthError::Expired);
        }

        let key = token.grant_key();
        self.consent_repo
            .get(&key)
            .await?
            .filter(|g| g.revision == token.grant_revision && g.is_active())
            .ok_or(AuthError::UnknownToken)?;

        if let Some(session_id) = token.session_id {
            self.sessions
                .lookup(session_id)
                .await?
                .filter(|s| s.key() == key)
                .ok_or(AuthError::UnknownToken)?;
        }

        Ok(AccessInfo {
            token_id: token.id,
            user_id: token.user_id,
            client_id: token.client_id,
            scopes: token.scopes,
            offline_session: token.session_id,
            expires_in: token.expiration.seconds_from(now),
        })
    }
}
