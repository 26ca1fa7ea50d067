use crate::domain_model::{ClientId, GrantKey, TokenId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfflineSessionId(pub uuid::Uuid);

impl OfflineSessionId {
    pub fn generate() -> Self {
        OfflineSessionId(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for OfflineSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OfflineSessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(OfflineSessionId)
    }
}

/// Registry entry backing an offline grant. It has no expiry; only
/// revocation removes it.
#[derive(Debug, Clone, Serialize)]
pub struct OfflineSession {
    pub id: OfflineSessionId,
    pub user_id: UserId,
    pub client_id: ClientId,
    pub current_refresh_id: Option<TokenId>,
    pub current_access_id: Option<TokenId>,
    pub created_at: DateTime<Utc>,
    pub last_refresh_at: Option<DateTime<Utc>>,
}

impl OfflineSession {
    pub fn new(user_id: UserId, client_id: ClientId, now: DateTime<Utc>) -> Self {
        Self {
            id: OfflineSessionId::generate(),
            user_id,
            client_id,
            current_refresh_id: None,
            current_access_id: None,
            created_at: now,
            last_refresh_at: None,
        }
    }

    pub fn key(&self) -> GrantKey {
        GrantKey::new(self.user_id, self.client_id.clone())
    }

    pub fn is_current(&self, refresh_id: &TokenId) -> bool {
        self.current_refresh_id.as_ref() == Some(refresh_id)
    }
}
