use chess_core::traits::GameLogicT;
use chess_core::types::{ChessRules, GameMetadata, GameType, Visibility};
use chess_game::ChessGame;

use crate::constants::{TEST_BLACK_PLAYERS, TEST_WHITE_PLAYERS};
use crate::rules_helpers::immediate_rules;

/// Builds a `ChessGame` already initialized and seeded with players,
/// mirroring the account builders' "construct, then layer on test-specific
/// state" shape.
pub struct TestChessGameBuilder {
    rules: ChessRules,
    white: Vec<String>,
    black: Vec<String>,
}

impl Default for TestChessGameBuilder {
    fn default() -> Self {
        Self {
            rules: immediate_rules(),
            white: Vec::new(),
            black: Vec::new(),
        }
    }
}

impl TestChessGameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(mut self, rules: ChessRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn add_players(mut self, count: usize) -> Self {
        for id in TEST_WHITE_PLAYERS.iter().take(count) {
            self.white.push(id.to_string());
        }
        for id in TEST_BLACK_PLAYERS.iter().take(count) {
            self.black.push(id.to_string());
        }
        self
    }

    pub async fn build(self) -> ChessGame {
        let game = ChessGame::new();
        let metadata = GameMetadata {
            game_id: "test-game".to_string(),
            title: "Test Game".to_string(),
            visibility: Visibility::Public,
            game_type: GameType::Chess,
        };
        game.initialize(metadata, self.rules)
            .await
            .expect("test rules are always valid");
        if !self.white.is_empty() || !self.black.is_empty() {
            game.add_players(self.white, self.black)
                .await
                .expect("test team sizes are always balanced");
        }
        game
    }
}
