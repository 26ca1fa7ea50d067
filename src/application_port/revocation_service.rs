use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait RevocationService: Send + Sync {
    /// Withdraws the offline grant of `user_id` for `client_id`. Succeeds
    /// whether or not anything was granted.
    async fn revoke(&self, user_id: UserId, client_id: &ClientId) -> Result<(), AuthError>;
}
