use crate::application_port::AuthError;
use crate::domain_model::*;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AccessInfo {
    pub token_id: TokenId,
    pub user_id: UserId,
    pub client_id: ClientId,
    pub scopes: ScopeSet,
    pub offline_session: Option<OfflineSessionId>,
    pub expires_in: i64,
}

#[async_trait::async_trait]
pub trait AccessVerifier: Send + Sync {
    async fn verify_access(&self, raw_access_token: &str) -> Result<AccessInfo, AuthError>;
}
