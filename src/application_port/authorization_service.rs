use crate::application_port::AuthError;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies an authorization suspended on the consent page.
#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(pub String);

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone)]
pub struct AuthorizeInput {
    pub user_id: UserId,
    pub client_id: ClientId,
    /// Space separated, as received from the client.
    pub scope: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsentPrompt {
    pub flow_id: FlowId,
    pub client_id: ClientId,
    pub client_name: String,
    pub scopes: Vec<String>,
    pub offline_requested: bool,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum AuthorizeOutcome {
    ConsentRequired(ConsentPrompt),
    Issued(TokenPair),
}

#[async_trait::async_trait]
pub trait AuthorizationService: Send + Sync {
    async fn authorize(&self, input: AuthorizeInput) -> Result<AuthorizeOutcome, AuthError>;
    async fn accept(&self, flow_id: &FlowId) -> Result<TokenPair, AuthError>;
    /// Drops a pending flow. Nothing was granted yet, so nothing is undone.
    async fn cancel(&self, flow_id: &FlowId) -> Result<(), AuthError>;
    /// Purges flows past their deadline, returning how many were dropped.
    async fn sweep_expired_flows(&self) -> usize;
}
