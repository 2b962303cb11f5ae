//! The Follower Coordinator: dials a Leader at startup, seeds its local
//! `ChessGame` from the Leader's snapshot, then serves reads locally and
//! forwards every write to the Leader. It also runs a follower-facing mTLS
//! listener so the Leader can push broadcasts as they're applied.

use std::sync::Arc;
use std::sync::Mutex;

use chess_core::traits::GameLogicT;
use chess_core::types::{ChessState, Vote};
use chess_core::{Error, Result};
use chess_game::ChessGame;
use rustls::ClientConfig;
use tracing::info;

use crate::internal_rpc;
use crate::leader::AddSlaveResponse;
use crate::rpc_wire::{build_request, parse_response};

pub struct FollowerCoordinator {
    pub game_id: String,
    pub leader_address: String,
    /// Expected CN of the Leader's certificate when this node dials out to
    /// it (`join_leader`, `forward`). Distinct from `master_id`, which is
    /// the Leader's own instance-id recorded from `AddSlave`'s response and
    /// used to authorize the Leader's *inbound* pushes on the
    /// follower-facing surface.
    pub leader_common_name: String,
    master_id: Mutex<Option<String>>,
    game: Arc<ChessGame>,
    tls_config: Arc<ClientConfig>,
    self_follower_id: String,
    self_address: String,
}

impl FollowerCoordinator {
    pub fn new(
        game_id: String,
        leader_address: String,
        leader_common_name: String,
        tls_config: Arc<ClientConfig>,
        self_follower_id: String,
        self_address: String,
    ) -> Self {
        Self {
            game_id,
            leader_address,
            leader_common_name,
            master_id: Mutex::new(None),
            game: Arc::new(ChessGame::new()),
            tls_config,
            self_follower_id,
            self_address,
        }
    }

    pub fn game(&self) -> Arc<ChessGame> {
        Arc::clone(&self.game)
    }

    /// The Leader's instance-id, recorded from `AddSlave`'s response. `None`
    /// until `join_leader` has completed.
    pub fn master_id(&self) -> Option<String> {
        self.master_id.lock().unwrap().clone()
    }

    /// Calls `AddSlave` on the Leader and seeds local state from the
    /// returned snapshot. Must run to completion before this node serves
    /// any player-facing reads.
    pub async fn join_leader(&self) -> Result<()> {
        let request = build_request(
            1,
            "add_slave",
            serde_json::json!({
                "follower_id": self.self_follower_id,
                "address": self.self_address,
            }),
        );
        let response = internal_rpc::call(
            &self.leader_address,
            Arc::clone(&self.tls_config),
            &self.leader_common_name,
            &request,
        )
        .await
        .map_err(|e| Error::Unavailable(format!("AddSlave call to leader failed: {e}")))?;

        let response: AddSlaveResponse = parse_response(&response)?;
        self.game
            .initialize(response.game.metadata, response.game.rules)
            .await?;
        self.game.seed_from_snapshot(response.game.state).await?;
        *self.master_id.lock().unwrap() = Some(response.master_id);
        info!(leader = %self.leader_address, "follower seeded from leader snapshot");
        Ok(())
    }

    /// Applies one broadcast pushed by the Leader. Called from the
    /// follower-facing RPC handler once the peer certificate has been
    /// authorized against `master_id`.
    pub async fn apply_pushed_state(&self, state: ChessState) -> Result<()> {
        self.game.seed_from_snapshot(state).await
    }

    async fn forward(&self, method: &str, params: serde_json::Value) -> Result<ChessState> {
        let request = build_request(1, method, params);
        let response = internal_rpc::call(
            &self.leader_address,
            Arc::clone(&self.tls_config),
            &self.leader_common_name,
            &request,
        )
        .await
        .map_err(|e| Error::Unavailable(format!("forwarding {method} to leader failed: {e}")))?;
        parse_response(&response)
    }

    pub async fn add_players(&self, white: Vec<String>, black: Vec<String>) -> Result<ChessState> {
        self.forward("add_players", serde_json::json!({ "white": white, "black": black }))
            .await
    }

    pub async fn remove_players(&self, players: Vec<String>) -> Result<ChessState> {
        self.forward("remove_players", serde_json::json!({ "players": players }))
            .await
    }

    pub async fn post_vote(&self, player_id: &str, round_index: u64, mv: &str) -> Result<ChessState> {
        self.forward(
            "post_vote",
            serde_json::json!({ "player_id": player_id, "round_index": round_index, "mv": mv }),
        )
        .await
    }

    /// Reads are served from the local, seeded copy; never forwarded.
    pub async fn snapshot(&self) -> Result<ChessState> {
        self.game.snapshot().await
    }

    pub async fn votes(&self, round_index: u64) -> Result<Vec<Vote>> {
        self.game.votes(round_index).await
    }
}
