use crate::application_port::AuthError;
use crate::domain_model::*;

#[async_trait::async_trait]
pub trait ClientService: Send + Sync {
    async fn get_client(&self, client_id: &ClientId) -> Result<Client, AuthError>;
    async fn set_consent_required(
        &self,
        client_id: &ClientId,
        consent_required: bool,
    ) -> Result<Client, AuthError>;
}
