use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub token: Token,
    pub store: Store,
    pub events: Events,
    #[serde(default)]
    pub clients: Vec<ClientSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Token {
    pub issuer: String,
    pub audience: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    #[serde(default)]
    pub clock_skew_secs: i64,
    pub flow_ttl_secs: i64,
    pub flow_sweep_interval_secs: u64,
    /// Overridden by `OFFGRANT_SIGNING_KEY` when set.
    #[serde(default)]
    pub signing_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub sessions: String, // "memory" or "redis"
    pub consent: String,  // "memory" or "mysql"
    #[serde(default)]
    pub redis_dsn: Option<String>,
    #[serde(default)]
    pub mysql_dsn: Option<String>,
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Events {
    pub backend: String, // "memory" or "kafka"
    #[serde(default)]
    pub kafka_brokers: Option<String>,
    pub topic: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSettings {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub consent_required: bool,
    #[serde(default)]
    pub default_scopes: Vec<String>,
    #[serde(default)]
    pub optional_scopes: Vec<String>,
}

pub const SIGNING_KEY_ENV: &str = "OFFGRANT_SIGNING_KEY";

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let mut settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("OFFGRANT").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    if let Ok(key) = std::env::var(SIGNING_KEY_ENV) {
        settings.token.signing_key = key;
    }
    if settings.token.signing_key.is_empty() {
        return Err(anyhow!(
            "no signing key configured, set token.signing_key or {SIGNING_KEY_ENV}"
        ));
    }

    Ok(settings)
}
