use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use lorechat_gateway::GatewayConfig;

/// Server configuration, read from `LORECHAT_*` environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub gateway: GatewayConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GatewayConfig::default();

        let gateway = GatewayConfig {
            outbox_capacity: parse_or(&lookup, "LORECHAT_OUTBOX_CAPACITY", defaults.outbox_capacity)?,
            send_timeout: Duration::from_millis(parse_or(
                &lookup,
                "LORECHAT_SEND_TIMEOUT_MS",
                defaults.send_timeout.as_millis() as u64,
            )?),
            heartbeat_interval: Duration::from_secs(parse_or(
                &lookup,
                "LORECHAT_HEARTBEAT_SECS",
                defaults.heartbeat_interval.as_secs(),
            )?),
            max_message_len: parse_or(&lookup, "LORECHAT_MAX_MESSAGE_LEN", defaults.max_message_len)?,
            open_channels: parse_or(&lookup, "LORECHAT_OPEN_CHANNELS", defaults.open_channels)?,
        };

        if gateway.outbox_capacity == 0 {
            bail!("LORECHAT_OUTBOX_CAPACITY must be at least 1");
        }
        if gateway.send_timeout.is_zero() {
            bail!("LORECHAT_SEND_TIMEOUT_MS must be positive");
        }
        if gateway.heartbeat_interval.is_zero() {
            bail!("LORECHAT_HEARTBEAT_SECS must be positive");
        }

        Ok(Self {
            host: lookup("LORECHAT_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "LORECHAT_PORT", 3000)?,
            db_path: lookup("LORECHAT_DB_PATH")
                .unwrap_or_else(|| "lorechat.db".into())
                .into(),
            jwt_secret: lookup("LORECHAT_JWT_SECRET").unwrap_or_else(|| "dev-secret-change-me".into()),
            gateway,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse::<SocketAddr>()
            .with_context(|| format!("invalid listen address '{}'", addr))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid value '{}' for {}: {}", raw, key, e)),
    }
}
