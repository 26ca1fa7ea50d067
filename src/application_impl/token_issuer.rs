use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

/// Mints token pairs for a grant and keeps the offline registry pointed at
/// them. Callers hold the pair lock.
pub struct TokenIssuer {
    codec: Arc<dyn TokenCodec>,
    sessions: Arc<dyn OfflineSessionStore>,
}

impl TokenIssuer {
    pub fn new(codec: Arc<dyn TokenCodec>, sessions: Arc<dyn OfflineSessionStore>) -> Self {
        Self { codec, sessions }
    }

    pub async fn mint(
        &self,
        grant: &Grant,
        scopes: &ScopeSet,
        session: Option<&OfflineSession>,
    ) -> Result<TokenPair, AuthError> {
        let request = IssueRequest {
            grant,
            scopes,
            session,
        };
        let access = self.codec.issue(&request, TokenKind::Access).await?;
        let refresh = self.codec.issue(&request, TokenKind::Refresh).await?;
        Ok(TokenPair { access, refresh })
    }

    /// Issues the first pair of an authorization. An offline request binds the
    /// pair's session to the new ids, retiring whatever it tracked before.
    pub async fn issue_for_login(
        &self,
        grant: &Grant,
        scopes: &ScopeSet,
    ) -> Result<TokenPair, AuthError> {
        if !scopes.has_offline() {
            return self.mint(grant, scopes, None).await;
        }

        let session = self
            .sessions
            .lookup_by_pair(&grant.key())
            .await?
            .ok_or_else(|| {
                AuthError::InternalError(format!("offline grant without session: {}", grant.key()))
            })?;
        let pair = self.mint(grant, scopes, Some(&session)).await?;
        self.sessions
            .bind(session.id, &pair.refresh.token.id, &pair.access.token.id)
            .await?;
        Ok(pair)
    }
}
