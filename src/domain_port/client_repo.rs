use crate::application_port::*;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait ClientRepo: Send + Sync {
    async fn get(&self, client_id: &ClientId) -> Result<Option<Client>, AuthError>;
    async fn save(&self, client: Client) -> Result<(), AuthError>;
}
