use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use redis::aio::ConnectionManager;
use redis::{
    AsyncCommands, FromRedisValue, RedisError, RedisResult, RedisWrite, Script, ToRedisArgs, Value,
};
use std::collections::HashMap;

const OFFLINE_CREATE: &str = include_str!("offline_create.lua");
const OFFLINE_ROTATE: &str = include_str!("offline_rotate.lua");

/// Sessions live in `{prefix}:offline:{sid}` hashes; `{prefix}:offline-pair:{user}:{client}`
/// holds the sid of the pair's session. Both are written by one script, and an
/// index left pointing at a missing hash is overwritten by the next `create`.
pub struct RedisOfflineSessionStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisOfflineSessionStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisOfflineSessionStore {
            conn,
            prefix: prefix.into(),
        }
    }

    fn session_key_prefix(&self) -> String {
        format!("{}:offline:", self.prefix)
    }

    fn session_key(&self, id: OfflineSessionId) -> String {
        format!("{}{}", self.session_key_prefix(), id)
    }

    fn pair_key(&self, key: &GrantKey) -> String {
        format!("{}:offline-pair:{}:{}", self.prefix, key.user_id, key.client_id)
    }

    fn store_err(e: RedisError) -> AuthError {
        AuthError::Store(e.to_string())
    }

    fn parse_session(
        id: OfflineSessionId,
        fields: HashMap<String, String>,
    ) -> Result<OfflineSession, AuthError> {
        let field = |name: &str| -> Result<&String, AuthError> {
            fields
                .get(name)
                .ok_or_else(|| AuthError::Store(format!("offline session {id} lacks {name}")))
        };
        let token_id = |name: &str| {
            fields
                .get(name)
                .filter(|v| !v.is_empty())
                .map(|v| TokenId(v.clone()))
        };
        let time = |raw: &str| -> Result<DateTime<Utc>, AuthError> {
            DateTime::parse_from_rfc3339(raw)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| AuthError::Store(e.to_string()))
        };

        let user_id = field("user")?
            .parse::<UserId>()
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let created_at = time(field("created_at")?)?;
        let last_refresh_at = match fields.get("last_refresh_at").filter(|v| !v.is_empty()) {
            Some(raw) => Some(time(raw)?),
            None => None,
        };

        Ok(OfflineSession {
            id,
            user_id,
            client_id: ClientId(field("client")?.clone()),
            current_refresh_id: token_id("refresh"),
            current_access_id: token_id("access"),
            created_at,
            last_refresh_at,
        })
    }

    async fn run_rotate(
        &self,
        session_id: OfflineSessionId,
        presented: Option<&TokenId>,
        new_refresh_id: &TokenId,
        new_access_id: &TokenId,
        now: Option<DateTime<Utc>>,
    ) -> Result<OfflineSession, AuthError> {
        let mut conn = self.conn.clone();
        let script = Script::new(OFFLINE_ROTATE);
        let status: i64 = script
            .key(self.session_key(session_id))
            .arg(presented.map(TokenId::as_str).unwrap_or(""))
            .arg(new_refresh_id.as_str())
            .arg(new_access_id.as_str())
            .arg(now.map(|t| t.to_rfc3339()).unwrap_or_default())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::store_err)?;

        match status {
            1 => self
                .lookup(session_id)
                .await?
                .ok_or(AuthError::UnknownToken),
            0 => Err(AuthError::Reused),
            -1 => Err(AuthError::UnknownToken),
            other => Err(AuthError::Store(format!(
                "unknown rotate script status {other}"
            ))),
        }
    }
}

impl ToRedisArgs for OfflineSessionId {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        out.write_arg(self.to_string().as_bytes())
    }
}

impl FromRedisValue for OfflineSessionId {
    fn from_redis_value(v: &Value) -> RedisResult<Self> {
        let s: String = redis::from_redis_value(v)?;
        let id = s.parse::<OfflineSessionId>().map_err(|e| {
            RedisError::from((
                redis::ErrorKind::TypeError,
                "invalid OfflineSessionId string",
                e.to_string(),
            ))
        })?;
        Ok(id)
    }
}

#[async_trait::async_trait]
impl OfflineSessionStore for RedisOfflineSessionStore {
    async fn create(&self, grant: &Grant, now: DateTime<Utc>) -> Result<OfflineSession, AuthError> {
        let key = grant.key();
        let session = OfflineSession::new(grant.user_id, grant.client_id.clone(), now);
        let mut conn = self.conn.clone();

        let script = Script::new(OFFLINE_CREATE);
        let created: i64 = script
            .key(self.pair_key(&key))
            .key(self.session_key(session.id))
            .arg(&session.id)
            .arg(self.session_key_prefix())
            .arg(session.user_id.to_string())
            .arg(session.client_id.as_str())
            .arg(session.created_at.to_rfc3339())
            .invoke_async(&mut conn)
            .await
            .map_err(Self::store_err)?;
        if created == 0 {
            return Err(AuthError::Conflict(key));
        }
        Ok(session)
    }

    async fn bind(
        &self,
        session_id: OfflineSessionId,
        refresh_id: &TokenId,
        access_id: &TokenId,
    ) -> Result<OfflineSession, AuthError> {
        self.run_rotate(session_id, None, refresh_id, access_id, None)
            .await
    }

    async fn rotate(
        &self,
        session_id: OfflineSessionId,
        presented: &TokenId,
        new_refresh_id: &TokenId,
        new_access_id: &TokenId,
        now: DateTime<Utc>,
    ) -> Result<OfflineSession, AuthError> {
        self.run_rotate(
            session_id,
            Some(presented),
            new_refresh_id,
            new_access_id,
            Some(now),
        )
        .await
    }

    async fn lookup(
        &self,
        session_id: OfflineSessionId,
    ) -> Result<Option<OfflineSession>, AuthError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn
            .hgetall(self.session_key(session_id))
            .await
            .map_err(Self::store_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        Self::parse_session(session_id, fields).map(Some)
    }

    async fn lookup_by_pair(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
        let mut conn = self.conn.clone();
        let session_id: Option<OfflineSessionId> = conn
            .get(self.pair_key(key))
            .await
            .map_err(Self::store_err)?;
        match session_id {
            Some(id) => self.lookup(id).await,
            None => Ok(None),
        }
    }

    async fn destroy(&self, key: &GrantKey) -> Result<Option<OfflineSession>, AuthError> {
        let session = self.lookup_by_pair(key).await?;
        let mut conn = self.conn.clone();
        let mut keys = Vec::with_capacity(2);
        if let Some(session) = &session {
            keys.push(self.session_key(session.id));
        }
        keys.push(self.pair_key(key));
        let _: () = conn.del(keys).await.map_err(Self::store_err)?;
        Ok(session)
    }
}
