use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait RefreshCoordinator: Send + Sync {
    /// Exchanges a refresh token for a new access and refresh token pair.
    /// After a successful offline refresh the presented token is rejected as
    /// reused.
    async fn refresh(&self, raw_refresh_token: &str) -> Result<TokenPair, AuthError>;
}
