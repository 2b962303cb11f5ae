mod config;
mod context;
mod rpc;
mod server;

use std::path::PathBuf;

use clap::Parser;
use config::{Config, StoreKind};
use context::IdentityContext;
use server::run_server;
use tracing_subscriber::EnvFilter;

/// Identity Service: registers players, rotates signing keys and mints
/// player tokens.
#[derive(Parser, Debug)]
#[command(name = "identity")]
struct Cli {
    /// Path to a TOML config file. CLI flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    tls_cert: Option<PathBuf>,

    #[arg(long)]
    tls_key: Option<PathBuf>,

    #[arg(long)]
    ca_bundle: Option<PathBuf>,

    #[arg(long, value_enum)]
    store: Option<CliStoreKind>,

    #[arg(long)]
    database_url: Option<String>,

    /// Permit this node to mint new signing keys.
    #[arg(long)]
    keyer: bool,

    /// Mint a bootstrap key if the store holds none at startup.
    #[arg(long)]
    add_key_on_empty_db: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum CliStoreKind {
    Memory,
    Postgres,
}

fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(port) = cli.port {
        config.port = port;
    }
    if cli.tls_cert.is_some() {
        config.tls_cert = cli.tls_cert.clone();
    }
    if cli.tls_key.is_some() {
        config.tls_key = cli.tls_key.clone();
    }
    if cli.ca_bundle.is_some() {
        config.ca_bundle = cli.ca_bundle.clone();
    }
    if let Some(store) = &cli.store {
        config.store = match store {
            CliStoreKind::Memory => StoreKind::Memory,
            CliStoreKind::Postgres => StoreKind::Postgres,
        };
    }
    if cli.database_url.is_some() {
        config.database_url = cli.database_url.clone();
    }
    config.keyer = config.keyer || cli.keyer;
    config.add_key_on_empty_db = config.add_key_on_empty_db || cli.add_key_on_empty_db;
    config
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let base_config = match &cli.config {
        Some(path) => Config::from_path(path).await?,
        None => Config::default(),
    };
    let config = apply_overrides(base_config, &cli);

    let context = IdentityContext::try_new(config).await?;
    run_server(context).await
}
