use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use serde::Deserialize;

/// Token settings. The secret must be identical on every service that
/// verifies tokens, since only the user service issues them.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

impl JwtConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "bazaar".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "bazaar-clients".into()),
            ttl_minutes: parse_var("JWT_TTL_MINUTES", 60 * 24)?,
        })
    }
}

/// Settings shared by the user and product backends.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub upload_dir: PathBuf,
}

impl ServiceConfig {
    pub fn from_env(port_var: &str, default_port: u16) -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var(port_var, default_port)?,
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
            jwt: JwtConfig::from_env()?,
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".into())
                .into(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub user_service_url: String,
    pub product_service_url: String,
    pub proxy_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_var("GATEWAY_PORT", 8090)?,
            user_service_url: std::env::var("USER_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            product_service_url: std::env::var("PRODUCT_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8081".into()),
            proxy_timeout: Duration::from_secs(parse_var("PROXY_TIMEOUT_SECS", 30)?),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads an optional variable, falling back to `default` when unset.
/// A value that is present but malformed is an error rather than a silent default.
fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{name} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
