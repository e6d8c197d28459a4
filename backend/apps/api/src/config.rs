//! Server configuration
//!
//! Read once at startup. Everything goes through a lookup function so tests
//! can supply their own variables.

use std::net::SocketAddr;

use anyhow::{Context, bail};
use platform::config::{Environment, ServiceFlags, env_var};
use platform::crypto::{from_base64, random_bytes};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

pub struct ApiConfig {
    pub environment: Environment,
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// HMAC key for session cookies
    pub session_secret: [u8; 32],
    pub genai_api_key: Option<String>,
    /// `None` allows any origin
    pub cors_origin: Option<String>,
    pub services: ServiceFlags,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(env_var)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let environment = Environment::from_lookup(&lookup)?;

        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR must be a socket address")?;

        let database_url = lookup("DATABASE_URL").context("DATABASE_URL must be set")?;

        let database_max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a positive integer")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let session_secret = match lookup("SESSION_SECRET") {
            Some(encoded) => decode_secret(&encoded)?,
            None if environment.is_production() => {
                bail!("SESSION_SECRET must be set in production")
            }
            None => {
                tracing::warn!("SESSION_SECRET not set, using a random secret; sessions end on restart");
                let mut secret = [0u8; 32];
                secret.copy_from_slice(&random_bytes(32));
                secret
            }
        };

        Ok(Self {
            services: ServiceFlags::from_lookup(&lookup),
            genai_api_key: lookup("GOOGLE_GENAI_API_KEY"),
            cors_origin: lookup("CORS_ORIGIN"),
            environment,
            bind_addr,
            database_url,
            database_max_connections,
            session_secret,
        })
    }
}

fn decode_secret(encoded: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = from_base64(encoded.trim()).context("SESSION_SECRET must be base64")?;
    let secret: [u8; 32] = bytes
        .try_into()
        .map_err(|bytes: Vec<u8>| anyhow::anyhow!("SESSION_SECRET must decode to 32 bytes, got {}", bytes.len()))?;
    Ok(secret)
}
