use serde::{Deserialize, Serialize};

/// A Follower's registration with a game's Leader, created by `AddSlave`
/// and consulted by the broadcaster when fanning out applied moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerRegistration {
    pub follower_id: String,
    pub address: String,
    pub registered_at: i64,
    /// Round index the follower was seeded at; used only for logging and
    /// the `GET /status` style introspection, never for catch-up replay.
    pub seeded_at_round: u64,
}
