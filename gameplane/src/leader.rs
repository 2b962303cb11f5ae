//! The Leader Coordinator: owns the authoritative `ChessGame` for one
//! game id and fans out every applied state change to registered
//! Followers. Mutating RPCs on both the player-facing and leader-facing
//! surfaces route through here rather than touching `ChessGame` directly,
//! so every mutation is followed by exactly one broadcast.

use std::sync::Arc;
use std::time::SystemTime;

use chess_core::traits::GameLogicT;
use chess_core::types::{ChessRules, ChessState, FollowerRegistration, Game, GameMetadata, Vote};
use chess_core::Result;
use chess_game::ChessGame;
use rustls::ClientConfig;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::broadcaster::Broadcaster;
use crate::internal_rpc;
use crate::rpc_wire::build_request;

/// `AddSlave`'s response: the Leader's own instance-id (so the Follower can
/// authorize push-backs against it) plus the full game snapshot the
/// Follower seeds from, metadata and rules included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSlaveResponse {
    pub master_id: String,
    pub game: Game,
}

pub struct LeaderCoordinator {
    pub game_id: String,
    instance_id: String,
    game: Arc<ChessGame>,
    broadcaster: Arc<Broadcaster>,
    tls_config: Arc<ClientConfig>,
}

impl LeaderCoordinator {
    pub fn new(game_id: String, queue_depth: usize, tls_config: Arc<ClientConfig>) -> Self {
        Self {
            game_id,
            instance_id: uuid::Uuid::new_v4().to_string(),
            game: Arc::new(ChessGame::new()),
            broadcaster: Broadcaster::new(queue_depth),
            tls_config,
        }
    }

    pub fn game(&self) -> Arc<ChessGame> {
        Arc::clone(&self.game)
    }

    pub fn broadcaster(&self) -> Arc<Broadcaster> {
        Arc::clone(&self.broadcaster)
    }

    /// This Leader's own instance-id, handed to Followers via `AddSlave` so
    /// they can record it for follower-facing CN authorization.
    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub async fn initialize(&self, metadata: GameMetadata, rules: ChessRules) -> Result<ChessState> {
        self.game.initialize(metadata, rules).await?;
        let state = self.game.snapshot().await?;
        info!(game_id = %self.game_id, "leader initialized game");
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    /// Registers a Follower and returns the full game it should seed from,
    /// plus this Leader's instance-id. The Follower is expected to dial
    /// back on its own follower-facing surface; `address` is recorded for
    /// introspection only, broadcasts are pushed to the queue handed back
    /// by `Broadcaster::register`.
    pub async fn add_slave(&self, follower_id: &str, address: &str) -> Result<AddSlaveResponse> {
        let game = self.game.full_game().await?;
        let seeded_at_round = game.state.round_index;
        let registered_at = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);

        self.game
            .register_follower(FollowerRegistration {
                follower_id: follower_id.to_string(),
                address: address.to_string(),
                registered_at,
                seeded_at_round,
            })
            .await?;
        info!(%follower_id, %address, seeded_at_round, "leader registered follower");

        let rx = self.broadcaster.register(follower_id, address).await;
        self.spawn_push_loop(follower_id.to_string(), address.to_string(), rx);

        Ok(AddSlaveResponse {
            master_id: self.instance_id.clone(),
            game,
        })
    }

    /// Drains one follower's broadcast queue and pushes each state to its
    /// follower-facing surface. Exits (and lets the follower fall behind
    /// until it re-registers) once the queue is dropped from the registry.
    fn spawn_push_loop(&self, follower_id: String, address: String, mut rx: mpsc::Receiver<ChessState>) {
        let tls_config = Arc::clone(&self.tls_config);
        let server_name = address
            .split(':')
            .next()
            .unwrap_or(&address)
            .to_string();

        tokio::spawn(async move {
            while let Some(state) = rx.recv().await {
                let request = build_request(1, "push_state", serde_json::json!({ "state": state }));
                if let Err(e) = internal_rpc::call(&address, Arc::clone(&tls_config), &server_name, &request).await {
                    warn!(%follower_id, %address, error = %e, "failed to push broadcast to follower");
                }
            }
        });
    }

    pub async fn add_players(&self, white: Vec<String>, black: Vec<String>) -> Result<ChessState> {
        let state = self.game.add_players(white, black).await?;
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    pub async fn remove_players(&self, players: Vec<String>) -> Result<ChessState> {
        let state = self.game.remove_players(players).await?;
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    pub async fn post_vote(&self, player_id: &str, round_index: u64, mv: &str) -> Result<ChessState> {
        self.game.post_vote(player_id, round_index, mv).await?;
        let state = self.game.snapshot().await?;
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    pub async fn tally_round(&self) -> Result<ChessState> {
        let state = self.game.tally_round().await?;
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    pub async fn change_accepting_votes(&self, accepting: bool) -> Result<ChessState> {
        let state = self.game.change_accepting_votes(accepting).await?;
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }

    pub async fn votes(&self, round_index: u64) -> Result<Vec<Vote>> {
        self.game.votes(round_index).await
    }

    pub async fn stop_game(&self) -> Result<ChessState> {
        self.game.stop().await?;
        let state = self.game.snapshot().await?;
        info!(game_id = %self.game_id, "leader stopped game");
        self.broadcaster.broadcast(&state).await;
        Ok(state)
    }
}
