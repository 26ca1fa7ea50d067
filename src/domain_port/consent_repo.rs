use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait ConsentRepo: Send + Sync {
    async fn get(&self, key: &GrantKey) -> Result<Option<Grant>, AuthError>;

    /// Insert or replace the grant for its (user, client) pair.
    async fn upsert(&self, grant: &Grant) -> Result<(), AuthError>;

    /// All grants of a user, ordered by client id.
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Grant>, AuthError>;
}
