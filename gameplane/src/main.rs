mod broadcaster;
mod config;
mod context;
mod follower;
mod gateway;
mod internal_handlers;
mod internal_rpc;
mod leader;
mod remote_store;
mod rpc_wire;
mod tls;
mod tls_config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use config::Config;
use context::GamePlaneContext;
use gateway::{GameRole, PlayerContext};
use tracing_subscriber::EnvFilter;

/// Game Plane node: either the Leader holding the authoritative copy of one
/// game, or a Follower replica forwarding writes to it.
#[derive(Parser, Debug)]
#[command(name = "gameplane")]
struct Cli {
    #[arg(long)]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = Config::from_path(&cli.config).await?;
    let player_port = config.player_port;

    let context = GamePlaneContext::try_new(config).await?;

    let player_context = PlayerContext {
        role: match &context.role {
            GameRole::Leader(leader) => GameRole::Leader(Arc::clone(leader)),
            GameRole::Follower(follower) => GameRole::Follower(Arc::clone(follower)),
        },
        token_verifier: Arc::clone(&context.token_verifier),
    };

    let gateway_task = tokio::spawn(gateway::run_gateway(player_port, player_context));

    match &context.role {
        GameRole::Leader(leader) => {
            let module = internal_handlers::leader_facing_module(Arc::clone(leader));
            let game_id = context.config.game_id.clone();
            let authorize: internal_rpc::Authorizer =
                Arc::new(move |identity| tls::authorize_leader_facing(identity, &game_id));
            let addr = format!("0.0.0.0:{}", context.config.leader_port);
            let internal_task = tokio::spawn(internal_rpc::serve(
                addr,
                Arc::clone(&context.server_tls_config),
                module,
                authorize,
            ));
            tokio::try_join!(flatten(gateway_task), flatten(internal_task))?;
        }
        GameRole::Follower(follower) => {
            let module = internal_handlers::follower_facing_module(Arc::clone(follower));
            let master_id = follower
                .master_id()
                .context("follower has no recorded master_id; join_leader must run first")?;
            let authorize: internal_rpc::Authorizer =
                Arc::new(move |identity| tls::authorize_follower_facing(identity, &master_id));
            let addr = format!("0.0.0.0:{}", context.config.follower_port);
            let internal_task = tokio::spawn(internal_rpc::serve(
                addr,
                Arc::clone(&context.server_tls_config),
                module,
                authorize,
            ));
            tokio::try_join!(flatten(gateway_task), flatten(internal_task))?;
        }
    }

    Ok(())
}

async fn flatten<T>(task: tokio::task::JoinHandle<anyhow::Result<T>>) -> anyhow::Result<T> {
    task.await?
}
