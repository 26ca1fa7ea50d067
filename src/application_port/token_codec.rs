use crate::application_port::AuthError;
use crate::domain_model::*;

/// Everything the codec needs to mint a token for a grant.
#[derive(Debug, Clone, Copy)]
pub struct IssueRequest<'a> {
    pub grant: &'a Grant,
    pub scopes: &'a ScopeSet,
    /// Present when the tokens belong to an offline session.
    pub session: Option<&'a OfflineSession>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    /// Mints a token with a fresh id. Refresh tokens minted under an offline
    /// session never expire and are typed `Offline`.
    async fn issue(&self, request: &IssueRequest<'_>, kind: TokenKind)
    -> Result<IssuedToken, AuthError>;

    /// Verifies the signature and decodes the claims. Expiry is left to the
    /// caller.
    async fn parse(&self, raw: &str) -> Result<Token, AuthError>;
}
