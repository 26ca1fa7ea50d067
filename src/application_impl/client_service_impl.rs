use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealClientService {
    client_repo: Arc<dyn ClientRepo>,
}

impl RealClientService {
    pub fn new(client_repo: Arc<dyn ClientRepo>) -> Self {
        Self { client_repo }
    }
}

#[async_trait::async_trait]
impl ClientService for RealClientService {
    async fn get_client(&self, client_id: &ClientId) -> Result<Client, AuthError> {
        self.client_repo
            .get(client_id)
            .await?
            .ok_or_else(|| AuthError::UnknownClient(client_id.clone()))
    }

    async fn set_consent_required(
        &self,
        client_id: &ClientId,
        consent_required: bool,
    ) -> Result<Client, AuthError> {
        let mut client = self.get_client(client_id).await?;
        client.consent_required = consent_required;
        self.client_repo.save(client.clone()).await?;
        tracing::info!(client_id = %client_id, consent_required, "client consent setting changed");
        Ok(client)
    }
}
