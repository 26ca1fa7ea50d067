use super::handler;
use crate::domain_model::UserId;
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let authorize = warp::post()
        .and(warp::path("authorize"))
        .and(warp::path::end())
        .and(warp::body::json())
        .and(with(server.authorization_service.clone()))
        .and_then(handler::authorize);

    let accept_consent = warp::post()
        .and(warp::path!("consent" / String / "accept"))
        .and(with(server.authorization_service.clone()))
        .and_then(handler::accept_consent);

    let cancel_consent = warp::post()
        .and(warp::path!("consent" / String / "cancel"))
        .and(with(server.authorization_service.clone()))
        .and_then(handler::cancel_consent);

    let refresh = warp::post()
        .and(warp::path!("token" / "refresh"))
        .and(warp::body::json())
        .and(with(server.refresh_coordinator.clone()))
        .and_then(handler::refresh_token);

    let verify = warp::post()
        .and(warp::path!("token" / "verify"))
        .and(warp::body::json())
        .and(with(server.access_verifier.clone()))
        .and_then(handler::verify_token);

    let applications = warp::get()
        .and(warp::path!("account" / UserId / "applications"))
        .and(with(server.consent_service.clone()))
        .and_then(handler::list_applications);

    let revoke = warp::delete()
        .and(warp::path!("account" / UserId / "applications" / String))
        .and(with(server.revocation_service.clone()))
        .and_then(handler::revoke_application);

    let consent_required = warp::put()
        .and(warp::path!("admin" / "clients" / String / "consent-required"))
        .and(warp::body::json())
        .and(with(server.client_service.clone()))
        .and_then(handler::set_consent_required);

    let time_offset = warp::put()
        .and(warp::path!("admin" / "time-offset"))
        .and(warp::body::json())
        .and(with(server.clock.clone()))
        .and_then(handler::set_time_offset);

    authorize
        .or(accept_consent)
        .or(cancel_consent)
        .or(refresh)
        .or(verify)
        .or(applications)
        .or(revoke)
        .or(consent_required)
        .or(time_offset)
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}
