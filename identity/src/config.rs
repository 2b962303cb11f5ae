//! Configuration of the identity service node.

use std::path::PathBuf;

use serde::Deserialize;
use tokio::fs;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub ca_bundle: Option<PathBuf>,
    pub store: StoreKind,
    pub database_url: Option<String>,
    /// This node may mint new signing keys. Exactly one instance per
    /// deployment should set this.
    pub keyer: bool,
    /// If the Store holds no signing keys at all, mint one on startup.
    pub add_key_on_empty_db: bool,
    pub token_ttl_seconds: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8090,
            tls_cert: None,
            tls_key: None,
            ca_bundle: None,
            store: StoreKind::Memory,
            database_url: None,
            keyer: false,
            add_key_on_empty_db: false,
            token_ttl_seconds: chess_core::types::DEFAULT_TOKEN_TTL_SECONDS,
        }
    }
}

impl Config {
    pub async fn from_path(path: &PathBuf) -> anyhow::Result<Config> {
        let raw = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}
