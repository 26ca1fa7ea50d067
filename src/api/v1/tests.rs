use super::*;
use crate::server::Server;
use crate::settings::parse_settings;
use serde_json::{Value, json};
use std::sync::Arc;
use warp::Filter;
use warp::http::StatusCode;

const USER: &str = "6f1c3a4e-9a51-4a53-8f0b-2f7d0d1c9b11";

async fn server() -> Arc<Server> {
    let settings = parse_settings(Some("settings/dev.toml")).expect("dev settings");
    Arc::new(Server::try_new(&settings).await.expect("server"))
}

fn api(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = std::convert::Infallible> + Clone {
    warp::path("api")
        .and(warp::path("v1"))
        .and(routes(server))
        .recover(recover_error)
}

async fn call<F>(filter: &F, method: &str, path: &str, body: Option<Value>) -> (StatusCode, Value)
where
    F: Filter + Clone + 'static,
    F::Extract: warp::Reply + Send,
{
    let mut request = warp::test::request().method(method).path(path);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.reply(filter).await;
    let status = response.status();
    let json: Value = serde_json::from_slice(response.body()).expect("json body");
    (status, json)
}

#[tokio::test]
async fn offline_consent_round_trip_over_http() {
    let server = server().await;
    let api = api(server.clone());

    let (status, body) = call(
        &api,
        "POST",
        "/api/v1/authorize",
        Some(json!({ "user_id": USER, "client_id": "offline-client", "scope": "offline_access" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["outcome"], "consent_required");
    let prompt = &body["data"]["prompt"];
    assert_eq!(prompt["offline_requested"], true);
    assert!(
        prompt["scopes"]
            .as_array()
            .expect("scopes")
            .contains(&json!("Offline access"))
    );

    let flow_id = prompt["flow_id"].as_str().expect("flow id").to_string();
    let (_, body) = call(
        &api,
        "POST",
        &format!("/api/v1/consent/{flow_id}/accept"),
        None,
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["refresh_expires_in"], 0);
    assert_eq!(body["data"]["refresh_token_type"], "Offline");
    let refresh_token = body["data"]["refresh_token"].as_str().expect("refresh").to_string();

    let (_, body) = call(
        &api,
        "GET",
        &format!("/api/v1/account/{USER}/applications"),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["client_id"], "offline-client");
    assert_eq!(body["data"][0]["additional_grants"], json!(["Offline Token"]));

    let (_, body) = call(
        &api,
        "PUT",
        "/api/v1/admin/time-offset",
        Some(json!({ "seconds": 9999 })),
    )
    .await;
    assert_eq!(body["data"]["seconds"], 9999);

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/token/refresh",
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(body["success"], true);
    let rotated_access = body["data"]["access_token"].as_str().expect("access").to_string();

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/token/refresh",
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "ReusedToken");

    let (_, body) = call(
        &api,
        "DELETE",
        &format!("/api/v1/account/{USER}/applications/offline-client"),
        None,
    )
    .await;
    assert_eq!(body["success"], true);

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/token/verify",
        Some(json!({ "access_token": rotated_access })),
    )
    .await;
    assert_eq!(body["error"]["code"], "UnknownToken");

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_flow_and_client_are_reported() {
    let server = server().await;
    let api = api(server.clone());

    let (status, body) = call(&api, "POST", "/api/v1/consent/nope/accept", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"]["code"], "FlowNotFound");

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/authorize",
        Some(json!({ "user_id": USER, "client_id": "nobody", "scope": "" })),
    )
    .await;
    assert_eq!(body["error"]["code"], "UnknownClient");

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/token/refresh",
        Some(json!({ "refresh_token": "not-a-jwt" })),
    )
    .await;
    assert_eq!(body["error"]["code"], "InvalidToken");

    server.shutdown().await;
}

#[tokio::test]
async fn admin_toggle_turns_prompt_off() {
    let server = server().await;
    let api = api(server.clone());

    let (_, body) = call(
        &api,
        "PUT",
        "/api/v1/admin/clients/offline-client/consent-required",
        Some(json!({ "consent_required": false })),
    )
    .await;
    assert_eq!(body["data"]["consent_required"], false);

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/authorize",
        Some(json!({ "user_id": USER, "client_id": "offline-client", "scope": "offline_access" })),
    )
    .await;
    assert_eq!(body["data"]["outcome"], "issued");
    assert_eq!(body["data"]["tokens"]["refresh_token_type"], "Offline");

    server.shutdown().await;
}

#[tokio::test]
async fn oversized_time_offset_is_a_bad_request() {
    let server = server().await;
    let api = api(server.clone());

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/authorize",
        Some(json!({ "user_id": USER, "client_id": "trusted-app", "scope": "offline_access" })),
    )
    .await;
    assert_eq!(body["data"]["outcome"], "issued");
    let refresh_token = body["data"]["tokens"]["refresh_token"]
        .as_str()
        .expect("refresh")
        .to_string();

    let (status, body) = call(
        &api,
        "PUT",
        "/api/v1/admin/time-offset",
        Some(json!({ "seconds": 10_000_000_000_000i64 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "BadRequest");
    assert_eq!(server.clock.offset(), 0);

    let (_, body) = call(
        &api,
        "POST",
        "/api/v1/token/refresh",
        Some(json!({ "refresh_token": refresh_token })),
    )
    .await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["refresh_token_type"], "Offline");

    server.shutdown().await;
}
