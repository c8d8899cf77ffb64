use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::net::{IpAddr, SocketAddr};

use crate::instrumentation::StatusLabel;

pub const DEFAULT_PORT: u16 = 8089;
pub const DEFAULT_METRICS_PATH: &str = "/api/backend/metrics";
pub const API_PREFIX: &str = "/api/medicine/";
pub const HEALTH_PATH: &str = "/healthz";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub metrics_path: String,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            metrics_path: DEFAULT_METRICS_PATH.to_string(),
            cors_allowed_origins: default_origins(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct JwtSettings {
    pub secret: Option<String>,
    pub public_key_pem: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub leeway_seconds: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    pub store: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub run_migrations: bool,
    pub status_label: StatusLabel,
    pub http: HttpConfig,
    pub jwt: JwtSettings,
}

impl ServiceConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

pub fn load_service_config() -> Result<ServiceConfig> {
    load_from(|key| env::var(key).ok())
}

/// Builds the config from any key lookup; `load_service_config` passes the process environment.
pub fn load_from<F>(lookup: F) -> Result<ServiceConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let host = var("HOST")
        .unwrap_or_else(|| "0.0.0.0".to_string())
        .parse::<IpAddr>()
        .context("HOST must be an IP address")?;
    let port = match var("PORT") {
        Some(raw) => raw.parse::<u16>().with_context(|| format!("PORT must be a port number, got '{raw}'"))?,
        None => DEFAULT_PORT,
    };

    let store = match var("MEDICINE_STORE").as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("postgres") => StoreBackend::Postgres,
        Some("memory") => StoreBackend::Memory,
        Some(other) => bail!("MEDICINE_STORE must be 'postgres' or 'memory', got '{other}'"),
    };
    let database_url = var("DATABASE_URL");
    if store == StoreBackend::Postgres && database_url.is_none() {
        bail!("DATABASE_URL must be set when MEDICINE_STORE=postgres");
    }
    let database_max_connections = match var("DATABASE_MAX_CONNECTIONS") {
        Some(raw) => raw
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| anyhow!("DATABASE_MAX_CONNECTIONS must be a positive integer, got '{raw}'"))?,
        None => 10,
    };
    let run_migrations = match var("RUN_MIGRATIONS") {
        Some(raw) => parse_bool(&raw).ok_or_else(|| anyhow!("RUN_MIGRATIONS must be a boolean, got '{raw}'"))?,
        None => true,
    };

    let status_label = match var("METRICS_STATUS_LABEL") {
        Some(raw) => raw.parse::<StatusLabel>().map_err(|err| anyhow!(err))?,
        None => StatusLabel::default(),
    };
    let metrics_path = var("METRICS_PATH").unwrap_or_else(|| DEFAULT_METRICS_PATH.to_string());
    if !metrics_path.starts_with('/') || metrics_path.starts_with(API_PREFIX) {
        bail!("METRICS_PATH must start with '/' and lie outside {API_PREFIX}, got '{metrics_path}'");
    }
    if metrics_path == HEALTH_PATH {
        bail!("METRICS_PATH cannot reuse the health route {HEALTH_PATH}");
    }
    let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
        .map(|raw| {
            raw.split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect::<Vec<_>>()
        })
        .unwrap_or_else(default_origins);

    let jwt = JwtSettings {
        secret: var("JWT_SECRET"),
        public_key_pem: var("JWT_PUBLIC_KEY_PEM"),
        issuer: var("JWT_ISSUER"),
        audience: var("JWT_AUDIENCE"),
        leeway_seconds: var("JWT_LEEWAY_SECONDS")
            .map(|raw| raw.parse::<u32>().context("JWT_LEEWAY_SECONDS must be a whole number of seconds"))
            .transpose()?,
    };
    if jwt.secret.is_none() && jwt.public_key_pem.is_none() {
        bail!("one of JWT_SECRET or JWT_PUBLIC_KEY_PEM must be set");
    }

    Ok(ServiceConfig {
        host,
        port,
        store,
        database_url,
        database_max_connections,
        run_migrations,
        status_label,
        http: HttpConfig { metrics_path, cors_allowed_origins },
        jwt,
    })
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()]
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
