use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Starting position, kept as a constant rather than re-derived so every
/// freshly initialized game starts from an identical, known-good FEN.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Round indices start at 1, per the data model invariant.
pub const FIRST_ROUND_INDEX: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Team {
    White,
    Black,
}

/// Balance enforcement policy chosen at `Initialize` time. Mirrors the two
/// strategies the original implementation had (and had bugged): tolerate a
/// fixed player-count difference between teams, or a fractional difference.
/// Exactly one of the two must be configured; `Initialize` rejects a
/// malformed policy rather than defaulting silently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BalancePolicy {
    ToleratedDifference(u32),
    TolerantFraction(f64),
}

/// Whether accepted moves apply immediately, or only once a round's votes
/// are tallied. The spec's Open Question on round-advancement scheduling is
/// resolved by modeling this mode without a background scheduler driving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveApplicationMode {
    Immediate,
    AppliedAfterTally { timeout_seconds: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChessRules {
    pub balance_policy: BalancePolicy,
    pub team_switching_enabled: bool,
    pub move_application_mode: MoveApplicationMode,
}

impl Default for ChessRules {
    fn default() -> Self {
        Self {
            balance_policy: BalancePolicy::ToleratedDifference(1),
            team_switching_enabled: false,
            move_application_mode: MoveApplicationMode::Immediate,
        }
    }
}

/// Mutable chess game state. Every mutation goes through the Game Logic
/// Module's three-mutex discipline (game -> teams -> move); this type
/// itself carries no locking, it is the payload the locks protect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChessState {
    pub fen: String,
    pub accepting_moves: bool,
    pub white: Vec<String>,
    pub black: Vec<String>,
    pub round_index: u64,
    /// Votes cast for the in-progress round, keyed by player id. Cleared
    /// once a round is tallied (AppliedAfterTally) or a move is applied
    /// (Immediate).
    pub round_votes: HashMap<String, String>,
    pub move_history: Vec<String>,
}

impl Default for ChessState {
    fn default() -> Self {
        Self {
            fen: STARTING_FEN.to_string(),
            accepting_moves: true,
            white: Vec::new(),
            black: Vec::new(),
            round_index: FIRST_ROUND_INDEX,
            round_votes: HashMap::new(),
            move_history: Vec::new(),
        }
    }
}

impl ChessState {
    pub fn team_of(&self, player_id: &str) -> Option<Team> {
        if self.white.iter().any(|p| p == player_id) {
            Some(Team::White)
        } else if self.black.iter().any(|p| p == player_id) {
            Some(Team::Black)
        } else {
            None
        }
    }

    /// Tally of move -> number of players currently voting for it.
    pub fn move_tally(&self) -> HashMap<String, u32> {
        let mut tally = HashMap::new();
        for mv in self.round_votes.values() {
            *tally.entry(mv.clone()).or_insert(0) += 1;
        }
        tally
    }
}
