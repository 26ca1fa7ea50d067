use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    jti: String,
    typ: TokenType,
    sub: String, // user id as string
    azp: String, // client id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sid: Option<String>, // offline session id
    rev: u64, // grant revision
    scope: String,
    iat: i64,
    exp: u64, // 0 = never
    iss: String,
    aud: String,
}

fn encode_claims(claims: &TokenClaims, cfg: &JwtConfig) -> Result<String, AuthError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(&cfg.signing_key),
    )
    .map_err(|e| AuthError::InternalError(e.to_string()))
}

fn decode_claims(token: &str, cfg: &JwtConfig) -> Result<TokenClaims, AuthError> {
    let mut v = Validation::new(Algorithm::HS256);
    // Expiry is judged by the caller against the adjustable clock, and
    // offline tokens carry exp = 0.
    v.validate_exp = false;
    v.required_spec_claims.clear();
    v.set_audience(&[cfg.audience.clone()]);
    v.set_issuer(&[cfg.issuer.clone()]);
    let data = decode::<TokenClaims>(token, &DecodingKey::from_secret(&cfg.signing_key), &v)
        .map_err(|e| {
            tracing::debug!(error = %e, "token rejected by codec");
            AuthError::Malformed
        })?;
    Ok(data.claims)
}

fn claims_to_token(claims: TokenClaims) -> Result<Token, AuthError> {
    let user_id = claims
        .sub
        .parse::<UserId>()
        .map_err(|_| AuthError::Malformed)?;
    let session_id = claims
        .sid
        .map(|sid| sid.parse::<OfflineSessionId>())
        .transpose()
        .map_err(|_| AuthError::Malformed)?;
    let issued_at = Utc
        .timestamp_opt(claims.iat, 0)
        .single()
        .ok_or(AuthError::Malformed)?;
    let expiration = Expiration::from_epoch(claims.exp).ok_or(AuthError::Malformed)?;

    // An offline token without its session or with a deadline is forged or
    // corrupt.
    if claims.typ == TokenType::Offline
        && (session_id.is_none() || expiration != Expiration::Never)
    {
        return Err(AuthError::Malformed);
    }

    Ok(Token {
        id: TokenId(claims.jti),
        token_type: claims.typ,
        user_id,
        client_id: ClientId(claims.azp),
        scopes: ScopeSet::parse(&claims.scope),
        grant_revision: claims.rev,
        session_id,
        issued_at,
        expiration,
    })
}

fn deadline(now: DateTime<Utc>, ttl: Duration) -> Result<Expiration, AuthError> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map(Expiration::At)
        .ok_or_else(|| AuthError::InternalError(format!("token lifetime past {now} overflows")))
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        JwtHs256Codec { cfg, clock }
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue(
        &self,
        request: &IssueRequest<'_>,
        kind: TokenKind,
    ) -> Result<IssuedToken, AuthError> {
        let now = self.clock.now();
        let offline = request.session.is_some() && request.grant.is_offline();

        let (typ, exp) = match kind {
            TokenKind::Access => (TokenType::Bearer, deadline(now, self.cfg.access_ttl)?),
            TokenKind::Refresh if offline => (TokenType::Offline, Expiration::Never),
            TokenKind::Refresh => (TokenType::Refresh, deadline(now, self.cfg.refresh_ttl)?),
        };

        let claims = TokenClaims {
            jti: TokenId::generate().0,
            typ,
            sub: request.grant.user_id.to_string(),
            azp: request.grant.client_id.0.clone(),
            sid: request.session.filter(|_| offline).map(|s| s.id.to_string()),
            rev: request.grant.revision,
            scope: request.scopes.to_string(),
            iat: now.timestamp(),
            exp: exp.as_epoch(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
        };
        let raw = encode_claims(&claims, &self.cfg)?;
        let token = claims_to_token(claims)?;
        Ok(IssuedToken { raw, token })
    }

    async fn parse(&self, raw: &str) -> Result<Token, AuthError> {
        let claims = decode_claims(raw, &self.cfg)?;
        claims_to_token(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::AdjustableClock;

    fn config(key: &str) -> JwtConfig {
        JwtConfig {
            issuer: "offgrant.test".to_string(),
            audience: "offgrant-clients".to_string(),
            access_ttl: Duration::from_secs(300),
            refresh_ttl: Duration::from_secs(1800),
            signing_key: key.as_bytes().to_vec(),
        }
    }

    fn codec(key: &str) -> JwtHs256Codec {
        JwtHs256Codec::new(config(key), Arc::new(AdjustableClock::new()))
    }

    fn grant(scopes: &str) -> Grant {
        Grant::new(
            UserId(uuid::Uuid::new_v4()),
            ClientId::new("product-portal"),
            ScopeSet::parse(scopes),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn offline_refresh_token_never_expires() {
        let codec = codec("secret");
        let grant = grant("openid offline_access");
        let session = OfflineSession::new(grant.user_id, grant.client_id.clone(), Utc::now());
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: Some(&session),
        };

        let issued = codec.issue(&request, TokenKind::Refresh).await.unwrap();
        assert_eq!(issued.token.token_type, TokenType::Offline);
        assert_eq!(issued.token.expiration.as_epoch(), 0);

        let parsed = codec.parse(&issued.raw).await.unwrap();
        assert!(parsed.is_offline());
        assert_eq!(parsed.expiration, Expiration::Never);
        assert_eq!(parsed.session_id, Some(session.id));
        assert_eq!(parsed.id, issued.token.id);
    }

    #[tokio::test]
    async fn ordinary_refresh_token_expires_after_ttl() {
        let codec = codec("secret");
        let grant = grant("openid");
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: None,
        };

        let issued = codec.issue(&request, TokenKind::Refresh).await.unwrap();
        assert_eq!(issued.token.token_type, TokenType::Refresh);
        let Expiration::At(at) = issued.token.expiration else {
            panic!("ordinary refresh token must expire");
        };
        let ttl = (at - issued.token.issued_at).num_seconds();
        assert_eq!(ttl, 1800);
        assert!(issued.token.session_id.is_none());
    }

    #[tokio::test]
    async fn access_token_under_offline_session_carries_sid() {
        let codec = codec("secret");
        let grant = grant("openid offline_access");
        let session = OfflineSession::new(grant.user_id, grant.client_id.clone(), Utc::now());
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: Some(&session),
        };

        let access = codec.issue(&request, TokenKind::Access).await.unwrap();
        assert_eq!(access.token.token_type, TokenType::Bearer);
        assert_eq!(access.token.session_id, Some(session.id));
        assert!(matches!(access.token.expiration, Expiration::At(_)));
    }

    #[tokio::test]
    async fn each_issuance_gets_a_fresh_id() {
        let codec = codec("secret");
        let grant = grant("openid");
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: None,
        };
        let a = codec.issue(&request, TokenKind::Access).await.unwrap();
        let b = codec.issue(&request, TokenKind::Access).await.unwrap();
        assert_ne!(a.token.id, b.token.id);
    }

    #[tokio::test]
    async fn deadline_past_the_end_of_time_is_an_error() {
        let clock = Arc::new(AdjustableClock::new());
        let codec = JwtHs256Codec::new(config("secret"), clock.clone());
        let grant = grant("openid");
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: None,
        };
        let to_the_end = DateTime::<Utc>::MAX_UTC - Utc::now();
        clock.set_offset(to_the_end.num_seconds() - 5).unwrap();

        let err = codec.issue(&request, TokenKind::Access).await.unwrap_err();
        assert!(matches!(err, AuthError::InternalError(_)));
    }

    #[tokio::test]
    async fn garbage_and_foreign_signatures_are_malformed() {
        let ours = codec("secret");
        let theirs = codec("other-secret");
        let grant = grant("openid");
        let request = IssueRequest {
            grant: &grant,
            scopes: &grant.scopes,
            session: None,
        };
        let foreign = theirs.issue(&request, TokenKind::Refresh).await.unwrap();

        assert!(matches!(ours.parse("not-a-jwt").await, Err(AuthError::Malformed)));
        assert!(matches!(ours.parse(&foreign.raw).await, Err(AuthError::Malformed)));
    }
}
