use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryConsentRepo {
    grants: DashMap<GrantKey, Grant>,
}

impl MemoryConsentRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ConsentRepo for MemoryConsentRepo {
    async fn get(&self, key: &GrantKey) -> Result<Option<Grant>, AuthError> {
        Ok(self.grants.get(key).map(|g| g.value().clone()))
    }

    async fn upsert(&self, grant: &Grant) -> Result<(), AuthError> {
        self.grants.insert(grant.key(), grant.clone());
        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Grant>, AuthError> {
        let mut grants: Vec<Grant> = self
            .grants
            .iter()
            .filter(|entry| entry.key().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        grants.sort_by(|a, b| a.client_id.cmp(&b.client_id));
        Ok(grants)
    }
}
