//! RPC handlers registered on the leader-facing and follower-facing mTLS
//! surfaces. Both run over `internal_rpc::serve`, which authorizes the
//! peer certificate before any of these are reached — handlers here never
//! re-check identity, only the request's own arguments.

use std::sync::Arc;

use chess_core::types::ChessState;
use jsonrpsee::core::Error as RpcError;
use jsonrpsee::types::error::CallError;
use jsonrpsee::types::Params;
use jsonrpsee::RpcModule;
use serde::Deserialize;

use crate::follower::FollowerCoordinator;
use crate::leader::LeaderCoordinator;

fn to_rpc_error(e: chess_core::Error) -> RpcError {
    RpcError::Call(CallError::Custom(jsonrpsee::types::ErrorObject::owned(
        e.code(),
        e.to_string(),
        None::<()>,
    )))
}

#[derive(Deserialize)]
struct AddSlaveParams {
    follower_id: String,
    address: String,
}

#[derive(Deserialize)]
struct AddPlayersParams {
    white: Vec<String>,
    black: Vec<String>,
}

#[derive(Deserialize)]
struct RemovePlayersParams {
    players: Vec<String>,
}

#[derive(Deserialize)]
struct PostVoteParams {
    player_id: String,
    round_index: u64,
    mv: String,
}

#[derive(Deserialize)]
struct ChangeAcceptingVotesParams {
    accepting: bool,
}

#[derive(Deserialize)]
struct GetVotesParams {
    round_index: u64,
}

/// Builds the leader-facing module: the surface Followers call to join and
/// forward writes to.
pub fn leader_facing_module(leader: Arc<LeaderCoordinator>) -> RpcModule<LeaderCoordinator> {
    let mut module = RpcModule::new(leader);

    module
        .register_async_method("add_slave", |params: Params, ctx| async move {
            let AddSlaveParams {
                follower_id,
                address,
            } = params.parse()?;
            ctx.add_slave(&follower_id, &address)
                .await
                .map_err(to_rpc_error)
        })
        .expect("add_slave method name is unique");

    module
        .register_async_method("add_players", |params: Params, ctx| async move {
            let AddPlayersParams { white, black } = params.parse()?;
            ctx.add_players(white, black).await.map_err(to_rpc_error)
        })
        .expect("add_players method name is unique");

    module
        .register_async_method("remove_players", |params: Params, ctx| async move {
            let RemovePlayersParams { players } = params.parse()?;
            ctx.remove_players(players).await.map_err(to_rpc_error)
        })
        .expect("remove_players method name is unique");

    module
        .register_async_method("post_vote", |params: Params, ctx| async move {
            let PostVoteParams {
                player_id,
                round_index,
                mv,
            } = params.parse()?;
            ctx.post_vote(&player_id, round_index, &mv)
                .await
                .map_err(to_rpc_error)
        })
        .expect("post_vote method name is unique");

    module
        .register_async_method("tally_round", |_params: Params, ctx| async move {
            ctx.tally_round().await.map_err(to_rpc_error)
        })
        .expect("tally_round method name is unique");

    module
        .register_async_method("stop_game", |_params: Params, ctx| async move {
            ctx.stop_game().await.map_err(to_rpc_error)
        })
        .expect("stop_game method name is unique");

    module
        .register_async_method("change_accepting_votes", |params: Params, ctx| async move {
            let ChangeAcceptingVotesParams { accepting } = params.parse()?;
            ctx.change_accepting_votes(accepting)
                .await
                .map_err(to_rpc_error)
        })
        .expect("change_accepting_votes method name is unique");

    module
}

#[derive(Deserialize)]
struct PushStateParams {
    state: ChessState,
}

/// Builds the follower-facing module: the single `push_state` method the
/// Leader calls to deliver each applied update.
pub fn follower_facing_module(follower: Arc<FollowerCoordinator>) -> RpcModule<FollowerCoordinator> {
    let mut module = RpcModule::new(follower);

    module
        .register_async_method("push_state", |params: Params, ctx| async move {
            let PushStateParams { state } = params.parse()?;
            ctx.apply_pushed_state(state).await.map_err(to_rpc_error)
        })
        .expect("push_state method name is unique");

    module
        .register_async_method("get_votes", |params: Params, ctx| async move {
            let GetVotesParams { round_index } = params.parse()?;
            ctx.votes(round_index).await.map_err(to_rpc_error)
        })
        .expect("get_votes method name is unique");

    module
}
