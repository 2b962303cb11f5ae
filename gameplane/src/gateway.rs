//! The Front Gateway: the player-facing jsonrpsee HTTP surface. Reads are
//! served from whichever `ChessGame` this node holds locally (the Leader's
//! authoritative copy, or a Follower's seeded copy); writes on a Follower
//! are forwarded to its Leader, writes on a Leader are applied directly.
//!
//! jsonrpsee's HTTP server doesn't expose inbound headers to handlers, so
//! unlike the mTLS surfaces the player token travels as an explicit RPC
//! parameter (`player_token`) rather than an `x-player-token` header.

use std::net::SocketAddr;
use std::sync::Arc;

use chess_core::traits::{GameLogicT, TokenVerifierT};
use chess_core::types::{ChessState, Game, GameMetadata, Vote};
use chess_core::Error as CoreError;
use chess_crypto::TokenVerifier;
use chess_game::ChessGame;
use hyper::Method;
use jsonrpsee::core::Error as RpcError;
use jsonrpsee::server::{AllowHosts, ServerBuilder};
use jsonrpsee::types::error::CallError;
use jsonrpsee::types::Params;
use jsonrpsee::RpcModule;
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::follower::FollowerCoordinator;
use crate::leader::LeaderCoordinator;
use crate::remote_store::RemoteKeyStore;

/// Which coordinator backs this node's player-facing surface.
pub enum GameRole {
    Leader(Arc<LeaderCoordinator>),
    Follower(Arc<FollowerCoordinator>),
}

pub struct PlayerContext {
    pub role: GameRole,
    pub token_verifier: Arc<TokenVerifier<RemoteKeyStore>>,
}

impl PlayerContext {
    fn local_game(&self) -> Arc<ChessGame> {
        match &self.role {
            GameRole::Leader(leader) => leader.game(),
            GameRole::Follower(follower) => follower.game(),
        }
    }

    async fn authenticate(&self, token: &str) -> Result<String, RpcError> {
        self.token_verifier
            .verify(token)
            .await
            .map_err(|e| to_rpc_error(CoreError::Unauthenticated(e.to_string())))
    }

    async fn add_players(&self, white: Vec<String>, black: Vec<String>) -> chess_core::Result<ChessState> {
        match &self.role {
            GameRole::Leader(leader) => leader.add_players(white, black).await,
            GameRole::Follower(follower) => follower.add_players(white, black).await,
        }
    }

    async fn remove_players(&self, players: Vec<String>) -> chess_core::Result<ChessState> {
        match &self.role {
            GameRole::Leader(leader) => leader.remove_players(players).await,
            GameRole::Follower(follower) => follower.remove_players(players).await,
        }
    }

    async fn post_vote(&self, player_id: &str, round_index: u64, mv: &str) -> chess_core::Result<ChessState> {
        match &self.role {
            GameRole::Leader(leader) => leader.post_vote(player_id, round_index, mv).await,
            GameRole::Follower(follower) => follower.post_vote(player_id, round_index, mv).await,
        }
    }
}

fn to_rpc_error(e: CoreError) -> RpcError {
    RpcError::Call(CallError::Custom(jsonrpsee::types::ErrorObject::owned(
        e.code(),
        e.to_string(),
        None::<()>,
    )))
}

#[derive(Deserialize)]
struct JoinParams {
    player_token: String,
    team: Team,
}

#[derive(Deserialize)]
enum Team {
    White,
    Black,
}

#[derive(Deserialize)]
struct LeaveParams {
    player_token: String,
}

#[derive(Deserialize)]
struct PostVoteParams {
    player_token: String,
    round_index: u64,
    mv: String,
}

#[derive(Deserialize)]
struct GetVotesParams {
    round_index: u64,
}

/// Mirrors the spec's GetVotes shape: the vote snapshot plus the round it
/// was taken for and whether voting on it is still open.
#[derive(Serialize)]
struct VotesResponse {
    round_index: u64,
    complete: bool,
    votes: Vec<Vote>,
}

async fn get_state(_params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<ChessState, RpcError> {
    ctx.local_game().snapshot().await.map_err(to_rpc_error)
}

async fn get_metadata(_params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<GameMetadata, RpcError> {
    ctx.local_game()
        .full_game()
        .await
        .map(|game| game.metadata)
        .map_err(to_rpc_error)
}

/// `Game(detailed)`: the full metadata+rules+state projection.
async fn get_game(_params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<Game, RpcError> {
    ctx.local_game().full_game().await.map_err(to_rpc_error)
}

async fn join(params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<ChessState, RpcError> {
    let JoinParams { player_token, team } = params.parse()?;
    let player_id = ctx.authenticate(&player_token).await?;
    let (white, black) = match team {
        Team::White => (vec![player_id], vec![]),
        Team::Black => (vec![], vec![player_id]),
    };
    ctx.add_players(white, black).await.map_err(to_rpc_error)
}

async fn leave(params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<ChessState, RpcError> {
    let LeaveParams { player_token } = params.parse()?;
    let player_id = ctx.authenticate(&player_token).await?;
    ctx.remove_players(vec![player_id])
        .await
        .map_err(to_rpc_error)
}

async fn post_vote(params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<ChessState, RpcError> {
    let PostVoteParams {
        player_token,
        round_index,
        mv,
    } = params.parse()?;
    let player_id = ctx.authenticate(&player_token).await?;
    ctx.post_vote(&player_id, round_index, &mv)
        .await
        .map_err(to_rpc_error)
}

async fn get_votes(params: Params<'_>, ctx: Arc<PlayerContext>) -> Result<VotesResponse, RpcError> {
    let GetVotesParams { round_index } = params.parse()?;
    let game = ctx.local_game();
    let votes = game.votes(round_index).await.map_err(to_rpc_error)?;
    let state = game.snapshot().await.map_err(to_rpc_error)?;
    Ok(VotesResponse {
        round_index,
        complete: !state.accepting_moves,
        votes,
    })
}

pub async fn run_gateway(port: u16, context: PlayerContext) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_methods([Method::POST])
        .allow_origin(Any)
        .allow_headers([hyper::header::CONTENT_TYPE]);
    let middleware = ServiceBuilder::new().layer(cors);

    let host = format!("0.0.0.0:{port}");
    let server = ServerBuilder::default()
        .set_host_filtering(AllowHosts::Any)
        .set_middleware(middleware)
        .build(host.parse::<SocketAddr>()?)
        .await?;

    let mut module = RpcModule::new(Arc::new(context));
    module.register_async_method("get_state", get_state)?;
    module.register_async_method("get_metadata", get_metadata)?;
    module.register_async_method("get_game", get_game)?;
    module.register_async_method("join", join)?;
    module.register_async_method("leave", leave)?;
    module.register_async_method("post_vote", post_vote)?;
    module.register_async_method("get_votes", get_votes)?;

    let handle = server.start(module)?;
    info!(%host, "player-facing gateway listening");
    handle.stopped().await;
    Ok(())
}
