use crate::domain_model::ScopeSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        ClientId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A relying party registered with the server.
///
/// `default_scopes` are part of every authorization request; `optional_scopes`
/// (typically `offline_access`) must be asked for explicitly.
#[derive(Debug, Clone, Serialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub consent_required: bool,
    pub default_scopes: ScopeSet,
    pub optional_scopes: ScopeSet,
}

impl Client {
    /// Every scope this client may be granted.
    pub fn advertised_scopes(&self) -> ScopeSet {
        self.default_scopes.union(&self.optional_scopes)
    }
}
