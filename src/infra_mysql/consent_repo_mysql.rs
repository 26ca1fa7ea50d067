use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

pub struct MySqlConsentRepo {
    pool: MySqlPool,
}

impl MySqlConsentRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlConsentRepo { pool }
    }

    #[inline]
    fn uid_as_bytes(id: &UserId) -> &[u8] {
        id.0.as_bytes()
    }

    #[inline]
    fn uid_from_bytes(id: &[u8]) -> Result<UserId, AuthError> {
        Ok(UserId(
            Uuid::from_slice(id).map_err(|e| AuthError::Store(e.to_string()))?,
        ))
    }

    fn row_to_grant(row: MySqlRow) -> Result<Grant, AuthError> {
        let store_err = |e: sqlx::Error| AuthError::Store(e.to_string());

        let user_id_bytes: Vec<u8> = row.try_get("user_id").map_err(store_err)?;
        let client_id: String = row.try_get("client_id").map_err(store_err)?;
        let scopes: String = row.try_get("scopes").map_err(store_err)?;
        let revision: u64 = row.try_get("revision").map_err(store_err)?;
        let created_at: DateTime<Utc> = row.try_get("created_at").map_err(store_err)?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(store_err)?;

        Ok(Grant {
            user_id: Self::uid_from_bytes(&user_id_bytes)?,
            client_id: ClientId(client_id),
            scopes: ScopeSet::parse(&scopes),
            revision,
            created_at,
            updated_at,
        })
    }
}

#[async_trait::async_trait]
impl ConsentRepo for MySqlConsentRepo {
    async fn get(&self, key: &GrantKey) -> Result<Option<Grant>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, client_id, scopes, revision, created_at, updated_at
FROM consent_grant
WHERE user_id = ? AND client_id = ?
"#,
        )
        .bind(Self::uid_as_bytes(&key.user_id))
        .bind(key.client_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        row_opt.map(Self::row_to_grant).transpose()
    }

    async fn upsert(&self, grant: &Grant) -> Result<(), AuthError> {
        sqlx::query(
            r#"
INSERT INTO consent_grant (user_id, client_id, scopes, revision, created_at, updated_at)
VALUES (?, ?, ?, ?, ?, ?)
ON DUPLICATE KEY UPDATE
    scopes = VALUES(scopes),
    revision = VALUES(revision),
    updated_at = VALUES(updated_at)
"#,
        )
        .bind(Self::uid_as_bytes(&grant.user_id))
        .bind(grant.client_id.as_str())
        .bind(grant.scopes.to_string())
        .bind(grant.revision)
        .bind(grant.created_at)
        .bind(grant.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        Ok(())
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Grant>, AuthError> {
        let rows: Vec<MySqlRow> = sqlx::query(
            r#"
SELECT user_id, client_id, scopes, revision, created_at, updated_at
FROM consent_grant
WHERE user_id = ?
ORDER BY client_id
"#,
        )
        .bind(Self::uid_as_bytes(&user_id))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuthError::Store(e.to_string()))?;

        rows.into_iter().map(Self::row_to_grant).collect()
    }
}
