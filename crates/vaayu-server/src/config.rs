//! Server configuration from environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_AI_SERVICE_URL: &str = "http://localhost:8000";
pub const DEFAULT_DB_PATH: &str = "vaayu.db";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub ai_service_url: String,
    pub fcm_server_key: String,
    pub db_path: PathBuf,
}

impl ServerConfig {
    /// Read configuration from the process environment.
    ///
    /// Missing push credentials abort startup; running without them would
    /// silently drop every alert dispatch.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = lookup("VAAYU_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("VAAYU_BIND_ADDR is not a valid socket address")?;

        let ai_service_url =
            lookup("AI_SERVICE_URL").unwrap_or_else(|| DEFAULT_AI_SERVICE_URL.to_string());

        let fcm_server_key = lookup("FCM_SERVER_KEY")
            .filter(|key| !key.is_empty())
            .context("FCM_SERVER_KEY must be set; refusing to start without push credentials")?;

        let db_path = lookup("VAAYU_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH));

        Ok(Self {
            bind_addr,
            ai_service_url,
            fcm_server_key,
            db_path,
        })
    }
}
