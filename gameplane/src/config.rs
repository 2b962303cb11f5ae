//! Configuration of a game plane node. A node is either a Leader (the
//! authoritative copy of one game) or a Follower (a read replica that
//! forwards writes upstream); `role` picks which coordinator starts.

use std::path::PathBuf;

use chess_core::types::{ChessRules, Visibility};
use serde::Deserialize;
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub role: Role,
    pub game_id: String,

    /// Leader only: the rules `Initialize` seeds the game with at startup.
    /// Ignored on a Follower, which seeds from the Leader's `AddSlave`
    /// response instead.
    #[serde(default)]
    pub rules: ChessRules,

    /// Leader only: the title recorded in this game's metadata. Defaults to
    /// `game_id` if unset.
    pub game_title: Option<String>,
    /// Leader only: the visibility recorded in this game's metadata.
    #[serde(default)]
    pub visibility: Visibility,

    /// Player-facing jsonrpsee HTTP surface.
    pub player_port: u16,
    /// Leader-facing mTLS surface (Leader only: accepts AddSlave/forwarded
    /// writes from Followers).
    pub leader_port: u16,
    /// Follower-facing mTLS surface (Follower only: accepts broadcasts from
    /// its Leader).
    pub follower_port: u16,

    pub tls_cert: PathBuf,
    pub tls_key: PathBuf,
    pub ca_bundle: PathBuf,

    /// Address of the Identity Service this node validates player tokens
    /// against.
    pub identity_url: String,

    /// Follower only: address of the Leader to dial at startup.
    pub leader_address: Option<String>,
    /// Follower only: expected common name of the Leader's certificate.
    pub leader_common_name: Option<String>,
    /// Follower only: address this node advertises to the Leader for
    /// broadcast push-back, i.e. `host:follower_port` as the Leader can
    /// reach it.
    pub self_address: Option<String>,

    /// This node's own identity: used as the `follower_id` passed to
    /// `AddSlave` when acting as a Follower. Expected to match this node's
    /// certificate common name.
    pub node_id: String,

    /// Bound on the per-follower broadcast queue. Once full, the oldest
    /// pending broadcast is dropped to keep the Leader's fan-out from
    /// blocking on a slow or stalled Follower.
    pub broadcast_queue_depth: usize,
}

impl Config {
    pub async fn from_path(path: &PathBuf) -> anyhow::Result<Config> {
        let raw = fs::read_to_string(path).await?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }
}
