use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// Registry of offline sessions. Membership here, not token expiry, decides
/// whether an offline refresh token is still good.
#[async_trait::async_trait]
pub trait OfflineSessionStore: Send + Sync {
    /// Fails with `Conflict` when the pair already has a session.
    async fn create(&self, grant: &Grant, now: DateTime<Utc>) -> Result<OfflineSession, AuthError>;

    /// Points the session at freshly issued tokens regardless of what it
    /// tracked before.
    async fn bind(
        &self,
        session_id: OfflineSessionId,
        refresh_id: &TokenId,
        access_id: &TokenId,
    ) -> Result<OfflineSession, AuthError>;

    /// Compare-and-set on the tracked refresh id. `UnknownToken` when the
    /// session is gone, `Reused` when `presented` is no longer current.
    async fn rotate(
        &self,
        session_id: OfflineSessionId,
        presented: &TokenId,
        new_refresh_id: &TokenId,
        new_access_id: &TokenId,
        now: DateTime<Utc>,
    ) -> Result<OfflineSession, AuthError>;

    async fn lookup(&self, session_id: OfflineSessionId)
    -> Result<Option<OfflineSession>, AuthError>;

    async fn lookup_by_pair(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError>;

    async fn destroy(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError>;
}
