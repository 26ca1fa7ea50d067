use crate::domain_model::{ClientId, GrantKey, OfflineSessionId, ScopeSet, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn generate() -> Self {
        TokenId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum TokenKind {
    Access,
    Refresh,
}

/// The `typ` claim.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum TokenType {
    Bearer,
    Refresh,
    Offline,
}

impl TokenType {
    pub fn kind(self) -> TokenKind {
        match self {
            TokenType::Bearer => TokenKind::Access,
            TokenType::Refresh | TokenType::Offline => TokenKind::Refresh,
        }
    }
}

/// Token expiration. On the wire `Never` is encoded as `exp = 0`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Expiration {
    Never,
    At(DateTime<Utc>),
}

impl Expiration {
    pub fn from_epoch(secs: u64) -> Option<Self> {
        if secs == 0 {
            return Some(Expiration::Never);
        }
        let secs = i64::try_from(secs).ok()?;
        Utc.timestamp_opt(secs, 0).single().map(Expiration::At)
    }

    pub fn as_epoch(&self) -> u64 {
        match self {
            Expiration::Never => 0,
            Expiration::At(at) => at.timestamp().max(1) as u64,
        }
    }

    pub fn has_passed(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        match self {
            Expiration::Never => false,
            Expiration::At(at) => at.checked_add_signed(leeway).is_some_and(|at| at <= now),
        }
    }

    /// Seconds left from `now`, `0` for tokens that never expire.
    pub fn seconds_from(&self, now: DateTime<Utc>) -> i64 {
        match self {
            Expiration::Never => 0,
            Expiration::At(at) => (*at - now).num_seconds().max(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub id: TokenId,
    pub token_type: TokenType,
    pub user_id: UserId,
    pub client_id: ClientId,
    pub scopes: ScopeSet,
    pub grant_revision: u64,
    pub session_id: Option<OfflineSessionId>,
    pub issued_at: DateTime<Utc>,
    pub expiration: Expiration,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.token_type.kind()
    }

    pub fn is_offline(&self) -> bool {
        self.token_type == TokenType::Offline
    }

    pub fn grant_key(&self) -> GrantKey {
        GrantKey::new(self.user_id, self.client_id.clone())
    }
}

/// A signed token together with its decoded form.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub raw: String,
    pub token: Token,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}
