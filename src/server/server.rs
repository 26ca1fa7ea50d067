use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::{ClientSettings, Settings};
use anyhow::anyhow;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub authorization_service: Arc<dyn AuthorizationService>,
    pub consent_service: Arc<dyn ConsentService>,
    pub refresh_coordinator: Arc<dyn RefreshCoordinator>,
    pub revocation_service: Arc<dyn RevocationService>,
    pub access_verifier: Arc<dyn AccessVerifier>,
    pub client_service: Arc<dyn ClientService>,
    pub clock: Arc<AdjustableClock>,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Option<Pool<MySql>>,
}

fn client_from_settings(client: &ClientSettings) -> Client {
    Client {
        id: ClientId::new(&client.id),
        name: client.name.clone(),
        consent_required: client.consent_required,
        default_scopes: client.default_scopes.iter().cloned().collect(),
        optional_scopes: client.optional_scopes.iter().cloned().collect(),
    }
}

fn build_event_sink(settings: &Settings, run_id: &str) -> anyhow::Result<Arc<dyn GrantEventSink>> {
    match settings.events.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryGrantEventSink::new())),
        "kafka" => {
            let brokers = settings
                .events
                .kafka_brokers
                .as_deref()
                .ok_or_else(|| anyhow!("events.kafka_brokers is required for the kafka backend"))?;
            Ok(Arc::new(KafkaGrantEventSink::new(
                brokers,
                &format!("offgrant-pub-{}", run_id),
                &settings.events.topic,
            )?))
        }
        other => Err(anyhow!("Unknown events backend: {}", other)),
    }
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);
        let event_sink = build_event_sink(settings, &run_id)?;
        Self::try_new_with_event_sink(settings, event_sink).await
    }

    /// Same as [`Server::try_new`] but with a caller supplied event sink.
    pub async fn try_new_with_event_sink(
        settings: &Settings,
        event_sink: Arc<dyn GrantEventSink>,
    ) -> anyhow::Result<Self> {
        let clock = Arc::new(AdjustableClock::new());
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let leeway = chrono::Duration::try_seconds(settings.token.clock_skew_secs)
            .ok_or_else(|| anyhow!("token.clock_skew_secs is out of range"))?;
        let flow_ttl = chrono::Duration::try_seconds(settings.token.flow_ttl_secs)
            .ok_or_else(|| anyhow!("token.flow_ttl_secs is out of range"))?;

        let sessions: Arc<dyn OfflineSessionStore> = match settings.store.sessions.as_str() {
            "memory" => Arc::new(MemoryOfflineSessionStore::new()),
            "redis" => {
                let dsn = settings
                    .store
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.redis_dsn is required for redis sessions"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                Arc::new(RedisOfflineSessionStore::new(
                    redis_manager,
                    settings.store.prefix.clone(),
                ))
            }
            other => return Err(anyhow!("Unknown sessions backend: {}", other)),
        };

        let mut pool = None;
        let consent_repo: Arc<dyn ConsentRepo> = match settings.store.consent.as_str() {
            "memory" => Arc::new(MemoryConsentRepo::new()),
            "mysql" => {
                let dsn = settings
                    .store
                    .mysql_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.mysql_dsn is required for mysql consent"))?;
                let mysql = Pool::<MySql>::connect(dsn).await?;
                pool = Some(mysql.clone());
                Arc::new(MySqlConsentRepo::new(mysql))
            }
            other => return Err(anyhow!("Unknown consent backend: {}", other)),
        };

        let client_repo: Arc<dyn ClientRepo> = Arc::new(MemoryClientRepo::new(
            settings.clients.iter().map(client_from_settings),
        ));

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: settings.token.issuer.clone(),
                audience: settings.token.audience.clone(),
                access_ttl: Duration::from_secs(settings.token.access_ttl_secs),
                refresh_ttl: Duration::from_secs(settings.token.refresh_ttl_secs),
                signing_key: settings.token.signing_key.clone().into_bytes(),
            },
            dyn_clock.clone(),
        ));

        let locks = Arc::new(GrantLocks::new());
        let issuer = Arc::new(TokenIssuer::new(token_codec.clone(), sessions.clone()));

        let consent_service: Arc<dyn ConsentService> = Arc::new(RealConsentService::new(
            client_repo.clone(),
            consent_repo.clone(),
            sessions.clone(),
            event_sink.clone(),
            locks.clone(),
            dyn_clock.clone(),
        ));

        let authorization_service: Arc<dyn AuthorizationService> =
            Arc::new(RealAuthorizationService::new(
                client_repo.clone(),
                consent_service.clone(),
                issuer.clone(),
                locks.clone(),
                dyn_clock.clone(),
                flow_ttl,
            ));

        let refresh_coordinator: Arc<dyn RefreshCoordinator> =
            Arc::new(RealRefreshCoordinator::new(
                token_codec.clone(),
                consent_repo.clone(),
                sessions.clone(),
                issuer,
                locks.clone(),
                dyn_clock.clone(),
                leeway,
            ));

        let revocation_service: Arc<dyn RevocationService> =
            Arc::new(RealRevocationService::new(
                consent_repo.clone(),
                sessions.clone(),
                event_sink,
                locks,
                dyn_clock.clone(),
            ));

        let access_verifier: Arc<dyn AccessVerifier> = Arc::new(RealAccessVerifier::new(
            token_codec,
            consent_repo,
            sessions,
            dyn_clock,
            leeway,
        ));

        let client_service: Arc<dyn ClientService> =
            Arc::new(RealClientService::new(client_repo));

        // region runtime infra
        let cancel = CancellationToken::new();
        let sweeper = FlowSweeper::new(
            authorization_service.clone(),
            Duration::from_secs(settings.token.flow_sweep_interval_secs.max(1)),
            cancel.clone(),
        );
        let sweeper_handle = tokio::spawn(async move {
            sweeper.run().await;
        });
        // endregion

        info!(
            sessions = %settings.store.sessions,
            consent = %settings.store.consent,
            events = %settings.events.backend,
            clients = settings.clients.len(),
            "server started"
        );

        Ok(Self {
            authorization_service,
            consent_service,
            refresh_coordinator,
            revocation_service,
            access_verifier,
            client_service,
            clock,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.sweeper_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("flow sweeper handle dropped: {:?}", r);
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}
