use crate::api::v1::handler::ApiResponse;
use crate::application_port::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use tracing::warn;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(err) = err.find::<ApiErrorCode>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(err.clone(), err.to_string()));
        Ok(warp::reply::with_status(json, StatusCode::OK))
    } else if err.is_not_found() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::NotFound,
            ApiErrorCode::NotFound.to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::NOT_FOUND))
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        let json = warp::reply::json(&ApiResponse::<()>::err(
            ApiErrorCode::BadRequest,
            e.to_string(),
        ));
        Ok(warp::reply::with_status(json, StatusCode::BAD_REQUEST))
    } else {
        let json = warp::reply::json(&ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(ApiError {
                code: ApiErrorCode::InternalError,
                message: format!("Unhandled error: {:?}", err),
            }),
        });
        Ok(warp::reply::with_status(
            json,
            StatusCode::INTERNAL_SERVER_ERROR,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("Token is not valid")]
    InvalidToken,
    #[error("Token has been revoked or never existed")]
    UnknownToken,
    #[error("Refresh token was already used")]
    ReusedToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Client is not registered")]
    UnknownClient,
    #[error("Scope is not offered by this client")]
    InvalidScope,
    #[error("Consent flow not found or expired")]
    FlowNotFound,
    #[error("Malformed request")]
    BadRequest,
    #[error("Not found")]
    NotFound,
    #[error("Internal error")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Malformed => ApiErrorCode::InvalidToken,
            AuthError::UnknownToken => ApiErrorCode::UnknownToken,
            AuthError::Reused => ApiErrorCode::ReusedToken,
            AuthError::Expired => ApiErrorCode::ExpiredToken,
            AuthError::UnknownClient(_) => ApiErrorCode::UnknownClient,
            AuthError::InvalidScope(_) => ApiErrorCode::InvalidScope,
            AuthError::FlowNotFound => ApiErrorCode::FlowNotFound,
            AuthError::InvalidOffset(_) => ApiErrorCode::BadRequest,
            e @ AuthError::Conflict(_) => ApiErrorCode::internal(e),
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}
