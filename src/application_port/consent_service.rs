use crate::application_port::AuthError;
use crate::domain_model::*;
use serde::Serialize;

pub const OFFLINE_TOKEN_GRANT: &str = "Offline Token";

/// One row of the account "applications" page.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationView {
    pub client_id: ClientId,
    pub client_name: String,
    pub granted_scopes: Vec<String>,
    pub additional_grants: Vec<String>,
}

/// Prompt rule: a consent-required client must ask again whenever the request
/// reaches beyond what was already granted.
pub fn requires_prompt(client: &Client, requested: &ScopeSet, existing: Option<&Grant>) -> bool {
    if !client.consent_required {
        return false;
    }
    match existing {
        Some(grant) => !grant.covers(requested),
        None => true,
    }
}

#[async_trait::async_trait]
pub trait ConsentService: Send + Sync {
    async fn get_grant(
        &self,
        user_id: UserId,
        client_id: &ClientId,
    ) -> Result<Option<Grant>, AuthError>;

    /// Upserts the grant. Gaining `offline_access` opens the offline session.
    async fn record_consent(
        &self,
        user_id: UserId,
        client_id: &ClientId,
        scopes: &ScopeSet,
    ) -> Result<Grant, AuthError>;

    /// Active grants ordered by client id.
    async fn list_grants(&self, user_id: UserId) -> Result<Vec<(Client, Grant)>, AuthError>;

    async fn list_applications(&self, user_id: UserId) -> Result<Vec<ApplicationView>, AuthError>;

    fn requires_prompt(
        &self,
        client: &Client,
        requested: &ScopeSet,
        existing: Option<&Grant>,
    ) -> bool {
        requires_prompt(client, requested, existing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn client(consent_required: bool) -> Client {
        Client {
            id: ClientId::new("product-portal"),
            name: "Product Portal".to_string(),
            consent_required,
            default_scopes: ScopeSet::parse("openid profile"),
            optional_scopes: ScopeSet::parse("offline_access"),
        }
    }

    fn grant(scopes: &str) -> Grant {
        Grant::new(
            UserId(uuid::Uuid::new_v4()),
            ClientId::new("product-portal"),
            ScopeSet::parse(scopes),
            Utc::now(),
        )
    }

    #[test]
    fn no_prompt_when_consent_not_required() {
        let requested = ScopeSet::parse("openid offline_access");
        assert!(!requires_prompt(&client(false), &requested, None));
    }

    #[test]
    fn first_offline_request_prompts() {
        let requested = ScopeSet::parse("openid profile offline_access");
        assert!(requires_prompt(&client(true), &requested, None));
    }

    #[test]
    fn declined_offline_scope_prompts_again() {
        let existing = grant("openid profile");
        let requested = ScopeSet::parse("openid profile offline_access");
        assert!(requires_prompt(&client(true), &requested, Some(&existing)));
    }

    #[test]
    fn equal_or_narrower_request_after_accept_does_not_prompt() {
        let existing = grant("openid profile offline_access");
        let c = client(true);
        assert!(!requires_prompt(&c, &ScopeSet::parse("openid profile offline_access"), Some(&existing)));
        assert!(!requires_prompt(&c, &ScopeSet::parse("openid"), Some(&existing)));
    }
}
