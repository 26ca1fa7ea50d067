use crate::domain_model::{ClientId, GrantKey};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token malformed")]
    Malformed,
    #[error("token unknown or revoked")]
    UnknownToken,
    #[error("refresh token already used")]
    Reused,
    #[error("token expired")]
    Expired,
    #[error("offline session already exists for {0}")]
    Conflict(GrantKey),
    #[error("client not found: {0}")]
    UnknownClient(ClientId),
    #[error("scope not allowed: {0}")]
    InvalidScope(String),
    #[error("authorization flow not found or expired")]
    FlowNotFound,
    #[error("clock offset out of range: {0}s")]
    InvalidOffset(i64),
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}
