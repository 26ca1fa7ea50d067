use crate::domain_model::{ClientId, ScopeSet, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum GrantEventType {
    #[serde(rename = "grant.consented")]
    ConsentGranted,
    #[serde(rename = "grant.revoked")]
    RevokeGrant,
}

/// Client recorded as the actor of revocations made from the account page.
pub const ACCOUNT_CONSOLE_CLIENT: &str = "account";

/// `client_id` is the client whose grant changed. `acting_client` is the
/// client through which the change was made: the client itself for consent,
/// the account console for revocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrantEvent {
    pub event_id: uuid::Uuid,
    pub event_type: GrantEventType,
    pub user_id: UserId,
    pub client_id: ClientId,
    pub acting_client: ClientId,
    pub scopes: ScopeSet,
    pub occurred_at: DateTime<Utc>,
}

impl GrantEvent {
    pub fn new(
        event_type: GrantEventType,
        user_id: UserId,
        client_id: ClientId,
        scopes: ScopeSet,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4(),
            event_type,
            user_id,
            acting_client: client_id.clone(),
            client_id,
            scopes,
            occurred_at,
        }
    }

    pub fn acted_by(mut self, acting_client: ClientId) -> Self {
        self.acting_client = acting_client;
        self
    }
}
