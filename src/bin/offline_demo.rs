//! Walks one user through the offline access lifecycle against the in-memory backends.
//!
//! $ cargo run --bin offline_demo -- --settings=settings/dev.toml

use offgrant::application_port::*;
use offgrant::domain_model::*;
use offgrant::logger::*;
use offgrant::server::*;
use offgrant::settings::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap();
    let settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig::from(&settings.log))?;

    let server = Server::try_new(&settings).await?;
    let user_id = UserId(uuid::Uuid::new_v4());
    let client_id = ClientId::new("offline-client");

    let outcome = server
        .authorization_service
        .authorize(AuthorizeInput {
            user_id,
            client_id: client_id.clone(),
            scope: "offline_access".to_string(),
        })
        .await?;
    let pair = match outcome {
        AuthorizeOutcome::ConsentRequired(prompt) => {
            info!(scopes = ?prompt.scopes, "consent prompt shown, accepting");
            server.authorization_service.accept(&prompt.flow_id).await?
        }
        AuthorizeOutcome::Issued(pair) => pair,
    };
    info!(refresh_type = ?pair.refresh.token.token_type, "first pair issued");

    server.clock.set_offset(9999)?;
    let rotated = server
        .refresh_coordinator
        .refresh(&pair.refresh.raw)
        .await?;
    info!(access = %rotated.access.token.id.as_str(), "refreshed after clock jump");

    match server.refresh_coordinator.refresh(&pair.refresh.raw).await {
        Err(e) => info!(error = %e, "old refresh token rejected"),
        Ok(_) => warn!("old refresh token was accepted"),
    }

    for app in server.consent_service.list_applications(user_id).await? {
        info!(client = %app.client_id, grants = ?app.additional_grants, "application");
    }

    server.revocation_service.revoke(user_id, &client_id).await?;
    match server.refresh_coordinator.refresh(&rotated.refresh.raw).await {
        Err(e) => info!(error = %e, "refresh after revoke rejected"),
        Ok(_) => warn!("refresh after revoke was accepted"),
    }

    server.shutdown().await;
    Ok(())
}
