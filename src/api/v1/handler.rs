use super::error::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::infra_memory::AdjustableClock;
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::{self, reject};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(code: ApiErrorCode, message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// OAuth style token response. `refresh_expires_in` is `0` for offline tokens.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub refresh_expires_in: i64,
    pub refresh_token_type: TokenType,
    pub scope: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        let issued_at = pair.access.token.issued_at;
        TokenResponse {
            expires_in: pair.access.token.expiration.seconds_from(issued_at),
            refresh_expires_in: pair.refresh.token.expiration.seconds_from(issued_at),
            refresh_token_type: pair.refresh.token.token_type,
            scope: pair.access.token.scopes.to_string(),
            access_token: pair.access.raw,
            refresh_token: pair.refresh.raw,
            token_type: "Bearer",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    pub user_id: UserId,
    pub client_id: ClientId,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthorizeResponse {
    ConsentRequired { prompt: ConsentPrompt },
    Issued { tokens: TokenResponse },
}

pub async fn authorize(
    body: AuthorizeRequest,
    authorization_service: Arc<dyn AuthorizationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let input = AuthorizeInput {
        user_id: body.user_id,
        client_id: body.client_id,
        scope: body.scope,
    };
    let outcome = authorization_service
        .authorize(input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let response = match outcome {
        AuthorizeOutcome::ConsentRequired(prompt) => AuthorizeResponse::ConsentRequired { prompt },
        AuthorizeOutcome::Issued(pair) => AuthorizeResponse::Issued {
            tokens: pair.into(),
        },
    };
    Ok(warp::reply::json(&ApiResponse::ok(response)))
}

pub async fn accept_consent(
    flow_id: String,
    authorization_service: Arc<dyn AuthorizationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = authorization_service
        .accept(&FlowId(flow_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenResponse::from(pair))))
}

pub async fn cancel_consent(
    flow_id: String,
    authorization_service: Arc<dyn AuthorizationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    authorization_service
        .cancel(&FlowId(flow_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(())))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    body: RefreshRequest,
    refresh_coordinator: Arc<dyn RefreshCoordinator>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let pair = refresh_coordinator
        .refresh(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(TokenResponse::from(pair))))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub access_token: String,
}

pub async fn verify_token(
    body: VerifyRequest,
    access_verifier: Arc<dyn AccessVerifier>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let info = access_verifier
        .verify_access(&body.access_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(info)))
}

pub async fn list_applications(
    user_id: UserId,
    consent_service: Arc<dyn ConsentService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let applications = consent_service
        .list_applications(user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(applications)))
}

pub async fn revoke_application(
    user_id: UserId,
    client_id: String,
    revocation_service: Arc<dyn RevocationService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    revocation_service
        .revoke(user_id, &ClientId(client_id))
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(())))
}

#[derive(Debug, Deserialize)]
pub struct ConsentRequiredRequest {
    pub consent_required: bool,
}

pub async fn set_consent_required(
    client_id: String,
    body: ConsentRequiredRequest,
    client_service: Arc<dyn ClientService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let client = client_service
        .set_consent_required(&ClientId(client_id), body.consent_required)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&ApiResponse::ok(client)))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TimeOffset {
    pub seconds: i64,
}

pub async fn set_time_offset(
    body: TimeOffset,
    clock: Arc<AdjustableClock>,
) -> Result<impl warp::Reply, warp::Rejection> {
    clock
        .set_offset(body.seconds)
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    debug!(seconds = body.seconds, "time offset set through admin api");

    Ok(warp::reply::json(&ApiResponse::ok(TimeOffset {
        seconds: clock.offset(),
    })))
}
