use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// Two maps: sessions by id, and the (user, client) index that enforces one
/// session per pair. A session is inserted before its index entry becomes
/// visible and removed before the index entry is dropped.
#[derive(Default)]
pub struct MemoryOfflineSessionStore {
    sessions: DashMap<OfflineSessionId, OfflineSession>,
    by_pair: DashMap<GrantKey, OfflineSessionId>,
}

impl MemoryOfflineSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait::async_trait]
impl OfflineSessionStore for MemoryOfflineSessionStore {
    async fn create(&self, grant: &Grant, now: DateTime<Utc>) -> Result<OfflineSession, AuthError> {
        let key = grant.key();
        match self.by_pair.entry(key.clone()) {
            Entry::Occupied(_) => Err(AuthError::Conflict(key)),
            Entry::Vacant(slot) => {
                let session = OfflineSession::new(grant.user_id, grant.client_id.clone(), now);
                self.sessions.insert(session.id, session.clone());
                slot.insert(session.id);
                Ok(session)
            }
        }
    }

    async fn bind(
        &self,
        session_id: OfflineSessionId,
        refresh_id: &TokenId,
        access_id: &TokenId,
    ) -> Result<OfflineSession, AuthError> {
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(AuthError::UnknownToken)?;
        session.current_refresh_id = Some(refresh_id.clone());
        session.current_access_id = Some(access_id.clone());
        Ok(session.clone())
    }

    async fn rotate(
        &self,
        session_id: OfflineSessionId,
        presented: &TokenId,
        new_refresh_id: &TokenId,
        new_access_id: &TokenId,
        now: DateTime<Utc>,
    ) -> Result<OfflineSession, AuthError> {
        // The shard write lock held by get_mut makes check and swap one step.
        let mut session = self
            .sessions
            .get_mut(&session_id)
            .ok_or(AuthError::UnknownToken)?;
        if !session.is_current(presented) {
            return Err(AuthError::Reused);
        }
        session.current_refresh_id = Some(new_refresh_id.clone());
        session.current_access_id = Some(new_access_id.clone());
        session.last_refresh_at = Some(now);
        Ok(session.clone())
    }

    async fn lookup(
        &self,
        session_id: OfflineSessionId,
    ) -> Result<Option<OfflineSession>, AuthError> {
        Ok(self.sessions.get(&session_id).map(|s| s.value().clone()))
    }

    async fn lookup_by_pair(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
        let Some(session_id) = self.by_pair.get(key).map(|id| *id.value()) else {
            return Ok(None);
        };
        self.lookup(session_id).await
    }

    async fn destroy(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
        let Some(session_id) = self.by_pair.get(key).map(|id| *id.value()) else {
            return Ok(None);
        };
        let removed = self.sessions.remove(&session_id).map(|(_, s)| s);
        self.by_pair.remove(key);
        Ok(removed)
    }
}
