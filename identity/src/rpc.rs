use std::sync::Arc;

use chess_core::traits::{KeyManagerT, StoreT, TokenIssuerT, TokenVerifierT};
use chess_core::types::{Player, PublicKeyView};
use chess_core::Error as CoreError;
use jsonrpsee::core::Error as RpcError;
use jsonrpsee::types::error::CallError;
use jsonrpsee::types::Params;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::context::IdentityContext;

fn to_rpc_error(e: CoreError) -> RpcError {
    RpcError::Call(CallError::Custom(jsonrpsee::types::ErrorObject::owned(
        e.code(),
        e.to_string(),
        None::<()>,
    )))
}

#[derive(Debug, Deserialize)]
struct RegisterPlayerParams {
    username: String,
}

#[derive(Debug, Deserialize)]
struct GetPlayerParams {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LoginParams {
    username: String,
    number_suffix: u32,
}

#[derive(Debug, Deserialize)]
struct RefreshTokenParams {
    token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

pub async fn register_player(
    params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<Player, RpcError> {
    let RegisterPlayerParams { username } = params.parse()?;
    if username.len() < 2 {
        return Err(to_rpc_error(CoreError::InvalidArgument(
            "username must be at least 2 characters".into(),
        )));
    }
    let player = context
        .store
        .create_player(&username)
        .await
        .map_err(to_rpc_error)?;
    info!(player_id = %player.id, username = %player.username, "registered player");
    Ok(player)
}

pub async fn get_player(
    params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<Player, RpcError> {
    let GetPlayerParams { id } = params.parse()?;
    context
        .store
        .get_player_by_id(&id)
        .await
        .map_err(to_rpc_error)?
        .ok_or_else(|| to_rpc_error(CoreError::NotFound(format!("no player with id {id}"))))
}

pub async fn login(
    params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<TokenResponse, RpcError> {
    let LoginParams {
        username,
        number_suffix,
    } = params.parse()?;
    let player = context
        .store
        .get_player_by_username(&username, number_suffix)
        .await
        .map_err(to_rpc_error)?
        .ok_or_else(|| {
            to_rpc_error(CoreError::PermissionDenied(format!(
                "no player {username}#{number_suffix}"
            )))
        })?;
    let token = context
        .token_issuer
        .issue(&player.id)
        .await
        .map_err(to_rpc_error)?;
    Ok(TokenResponse { token })
}

/// The Token Verifier runs in IGNORE-equivalent mode here: a verification
/// failure surfaces as UNAUTHENTICATED from this handler rather than being
/// silently passed through, since `RefreshToken` has nothing sensible to do
/// without a validated player id.
pub async fn refresh_token(
    params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<TokenResponse, RpcError> {
    let RefreshTokenParams { token } = params.parse()?;
    let player_id = context.token_verifier.verify(&token).await.map_err(|e| {
        warn!(error = %e, "refresh_token presented an invalid token");
        to_rpc_error(CoreError::Unauthenticated(
            "token did not validate".into(),
        ))
    })?;
    let player = context
        .store
        .get_player_by_id(&player_id)
        .await
        .map_err(to_rpc_error)?
        .ok_or_else(|| to_rpc_error(CoreError::NotFound("validated player vanished".into())))?;
    let token = context
        .token_issuer
        .issue(&player.id)
        .await
        .map_err(to_rpc_error)?;
    Ok(TokenResponse { token })
}

pub async fn token_public_keys(
    _params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<Vec<PublicKeyView>, RpcError> {
    context
        .key_manager
        .public_keys()
        .await
        .map_err(to_rpc_error)
}

/// Exposes `AddKey` as an RPC, restricted to nodes booted with `--keyer`.
pub async fn rotate_signing_key(
    _params: Params<'_>,
    context: Arc<IdentityContext>,
) -> Result<(), RpcError> {
    if !context.config.keyer {
        return Err(to_rpc_error(CoreError::PermissionDenied(
            "this node is not designated as the keyer".into(),
        )));
    }
    context
        .rotate_signing_key()
        .await
        .map_err(|e| to_rpc_error(CoreError::Internal(e.to_string())))
}
