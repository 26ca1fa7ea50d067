use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryClientRepo {
    clients: DashMap<ClientId, Client>,
}

impl MemoryClientRepo {
    pub fn new(clients: impl IntoIterator<Item = Client>) -> Self {
        let repo = Self::default();
        for client in clients {
            repo.clients.insert(client.id.clone(), client);
        }
        repo
    }
}

#[async_trait::async_trait]
impl ClientRepo for MemoryClientRepo {
    async fn get(&self, client_id: &ClientId) -> Result<Option<Client>, AuthError> {
        Ok(self.clients.get(client_id).map(|c| c.value().clone()))
    }

    async fn save(&self, client: Client) -> Result<(), AuthError> {
        self.clients.insert(client.id.clone(), client);
        Ok(())
    }
}
