use serde::{Deserialize, Serialize};

use super::chess::{ChessRules, ChessState};

/// Game type tag, chosen at `Initialize` time by a direct match — never
/// reflectively — per the spec's redesign note on pluggable game logic.
/// Chess is the only implemented variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameType {
    Chess,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameMetadata {
    pub game_id: String,
    pub title: String,
    pub visibility: Visibility,
    pub game_type: GameType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    Unlisted,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Public
    }
}

/// The full authoritative game snapshot a Leader holds, and the delayed
/// copy a Follower seeds from `AddSlave`'s response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub metadata: GameMetadata,
    pub rules: ChessRules,
    pub state: ChessState,
}

/// A single (player-id, move) pair, tagged by game type so the wire shape
/// stays stable if a second game type is ever added (none is built).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Vote {
    Chess { player_id: String, round_index: u64, mv: String },
}
