use std::sync::Arc;

use anyhow::Context as _;
use chess_core::traits::TokenVerifierT;
use chess_core::types::{GameMetadata, GameType};
use chess_crypto::TokenVerifier;

use crate::config::{Config, Role};
use crate::follower::FollowerCoordinator;
use crate::gateway::GameRole;
use crate::leader::LeaderCoordinator;
use crate::remote_store::RemoteKeyStore;
use crate::tls_config;

/// Everything a game plane node needs to start its servers: the coordinator
/// for its role, the TLS material for the internal mTLS surfaces and the
/// Token Verifier backing the player-facing gateway.
pub struct GamePlaneContext {
    pub config: Config,
    pub role: GameRole,
    pub token_verifier: Arc<TokenVerifier<RemoteKeyStore>>,
    pub server_tls_config: Arc<rustls::ServerConfig>,
    pub client_tls_config: Arc<rustls::ClientConfig>,
}

impl GamePlaneContext {
    pub async fn try_new(config: Config) -> anyhow::Result<Self> {
        let remote_store = Arc::new(
            RemoteKeyStore::connect(&config.identity_url)
                .context("failed to build identity service rpc client")?,
        );
        let token_verifier = TokenVerifier::new(remote_store);
        token_verifier
            .refresh()
            .await
            .context("initial public key fetch from identity service failed")?;
        token_verifier.spawn_refresh_loop(std::time::Duration::from_secs(3600));

        let server_tls_config =
            tls_config::load_server_config(&config.tls_cert, &config.tls_key, &config.ca_bundle)
                .context("failed to load internal mTLS server config")?;
        let client_tls_config =
            tls_config::load_client_config(&config.tls_cert, &config.tls_key, &config.ca_bundle)
                .context("failed to load internal mTLS client config")?;

        let role = match config.role {
            Role::Leader => {
                let leader = Arc::new(LeaderCoordinator::new(
                    config.game_id.clone(),
                    config.broadcast_queue_depth,
                    Arc::clone(&client_tls_config),
                ));
                let metadata = GameMetadata {
                    game_id: config.game_id.clone(),
                    title: config.game_title.clone().unwrap_or_else(|| config.game_id.clone()),
                    visibility: config.visibility,
                    game_type: GameType::Chess,
                };
                leader
                    .initialize(metadata, config.rules.clone())
                    .await
                    .context("leader failed to initialize its game at startup")?;
                GameRole::Leader(leader)
            }
            Role::Follower => {
                let leader_address = config
                    .leader_address
                    .clone()
                    .context("follower node requires leader_address")?;
                let leader_common_name = config
                    .leader_common_name
                    .clone()
                    .context("follower node requires leader_common_name")?;
                let self_address = config
                    .self_address
                    .clone()
                    .context("follower node requires self_address")?;

                let follower = Arc::new(FollowerCoordinator::new(
                    config.game_id.clone(),
                    leader_address,
                    leader_common_name,
                    Arc::clone(&client_tls_config),
                    config.node_id.clone(),
                    self_address,
                ));
                follower
                    .join_leader()
                    .await
                    .context("follower failed to join its leader at startup")?;
                GameRole::Follower(follower)
            }
        };

        Ok(Self {
            config,
            role,
            token_verifier,
            server_tls_config,
            client_tls_config,
        })
    }
}
