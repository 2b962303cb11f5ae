use std::collections::HashMap;

use async_trait::async_trait;
use chess_core::traits::GameLogicT;
use chess_core::types::{
    ChessRules, ChessState, FollowerRegistration, Game, GameMetadata, MoveApplicationMode, Team,
    Vote, FIRST_ROUND_INDEX, STARTING_FEN,
};
use chess_core::{Error, Result};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::balance::{check_balance, validate_policy};
use crate::board::{apply_san, fen_of, position_from_fen, team_to_move};

struct MoveState {
    fen: String,
    round_index: u64,
    round_votes: HashMap<String, String>,
    move_history: Vec<String>,
}

impl Default for MoveState {
    fn default() -> Self {
        Self {
            fen: STARTING_FEN.to_string(),
            round_index: FIRST_ROUND_INDEX,
            round_votes: HashMap::new(),
            move_history: Vec::new(),
        }
    }
}

/// The chess Game Logic Module. Lock ordering is always game -> teams ->
/// move, matching the spec's concurrency model; no method acquires `teams`
/// or `move_state` while only holding a later lock, and every lock is
/// released (never merely re-locked, the bug the original `PostVote` had)
/// before this type calls back into its own `snapshot`.
pub struct ChessGame {
    metadata: Mutex<Option<GameMetadata>>,
    rules: Mutex<Option<ChessRules>>,
    accepting: Mutex<bool>,
    teams: Mutex<(Vec<String>, Vec<String>)>,
    move_state: Mutex<MoveState>,
    followers: Mutex<Vec<FollowerRegistration>>,
}

impl Default for ChessGame {
    fn default() -> Self {
        Self {
            metadata: Mutex::new(None),
            rules: Mutex::new(None),
            accepting: Mutex::new(false),
            teams: Mutex::new((Vec::new(), Vec::new())),
            move_state: Mutex::new(MoveState::default()),
            followers: Mutex::new(Vec::new()),
        }
    }
}

impl ChessGame {
    pub fn new() -> Self {
        Self::default()
    }

    async fn require_accepting(&self) -> Result<()> {
        let accepting = self.accepting.lock().await;
        if !*accepting {
            return Err(Error::FailedPrecondition(
                "game is no longer accepting moves".into(),
            ));
        }
        Ok(())
    }

    async fn rules_snapshot(&self) -> Result<ChessRules> {
        self.rules
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::FailedPrecondition("game has not been initialized".into()))
    }
}

#[async_trait]
impl GameLogicT for ChessGame {
    async fn initialize(&self, metadata: GameMetadata, rules: ChessRules) -> Result<()> {
        validate_policy(&rules.balance_policy)?;
        {
            let mut guard = self.metadata.lock().await;
            *guard = Some(metadata);
        }
        {
            let mut guard = self.rules.lock().await;
            *guard = Some(rules);
        }
        {
            let mut accepting = self.accepting.lock().await;
            *accepting = true;
        }
        {
            let mut teams = self.teams.lock().await;
            *teams = (Vec::new(), Vec::new());
        }
        {
            let mut move_state = self.move_state.lock().await;
            *move_state = MoveState::default();
        }
        info!("chess game initialized");
        Ok(())
    }

    async fn snapshot(&self) -> Result<ChessState> {
        let accepting = *self.accepting.lock().await;
        let (white, black) = self.teams.lock().await.clone();
        let move_state = self.move_state.lock().await;
        Ok(ChessState {
            fen: move_state.fen.clone(),
            accepting_moves: accepting,
            white,
            black,
            round_index: move_state.round_index,
            round_votes: move_state.round_votes.clone(),
            move_history: move_state.move_history.clone(),
        })
    }

    async fn full_game(&self) -> Result<Game> {
        let metadata = self
            .metadata
            .lock()
            .await
            .clone()
            .ok_or_else(|| Error::FailedPrecondition("game has not been initialized".into()))?;
        let rules = self.rules_snapshot().await?;
        let state = self.snapshot().await?;
        Ok(Game {
            metadata,
            rules,
            state,
        })
    }

    async fn add_players(&self, white: Vec<String>, black: Vec<String>) -> Result<ChessState> {
        self.require_accepting().await?;
        let rules = self.rules_snapshot().await?;

        {
            let mut teams = self.teams.lock().await;
            let mut new_white = teams.0.clone();
            let mut new_black = teams.1.clone();
            for id in &white {
                if new_black.contains(id) {
                    if !rules.team_switching_enabled {
                        return Err(Error::FailedPrecondition(format!(
                            "player {id} cannot switch teams, team switching is disabled"
                        )));
                    }
                    new_black.retain(|p| p != id);
                }
                if !new_white.contains(id) {
                    new_white.push(id.clone());
                }
            }
            for id in &black {
                if new_white.contains(id) {
                    if !rules.team_switching_enabled {
                        return Err(Error::FailedPrecondition(format!(
                            "player {id} cannot switch teams, team switching is disabled"
                        )));
                    }
                    new_white.retain(|p| p != id);
                }
                if !new_black.contains(id) {
                    new_black.push(id.clone());
                }
            }
            check_balance(&rules.balance_policy, new_white.len(), new_black.len())?;
            *teams = (new_white, new_black);
        }

        self.snapshot().await
    }

    async fn remove_players(&self, players: Vec<String>) -> Result<ChessState> {
        self.require_accepting().await?;

        {
            let mut teams = self.teams.lock().await;
            for id in &players {
                if !teams.0.contains(id) && !teams.1.contains(id) {
                    warn!(player_id = %id, "remove_players: no-op, player is not on a team");
                }
            }
            teams.0.retain(|id| !players.contains(id));
            teams.1.retain(|id| !players.contains(id));
        }

        self.snapshot().await
    }

    async fn post_vote(&self, player_id: &str, round_index: u64, mv: &str) -> Result<Vote> {
        self.require_accepting().await?;
        let rules = self.rules_snapshot().await?;

        let player_team = {
            let teams = self.teams.lock().await;
            if teams.0.iter().any(|p| p == player_id) {
                Team::White
            } else if teams.1.iter().any(|p| p == player_id) {
                Team::Black
            } else {
                return Err(Error::PermissionDenied(format!(
                    "player {player_id} is not on a team in this game"
                )));
            }
        };

        let mut move_state = self.move_state.lock().await;
        if round_index != move_state.round_index {
            return Err(Error::FailedPrecondition(format!(
                "vote for stale round {round_index}, current round is {}",
                move_state.round_index
            )));
        }

        let position = position_from_fen(&move_state.fen)?;
        if team_to_move(&position) != player_team {
            return Err(Error::FailedPrecondition(format!(
                "player {player_id} voted out of turn"
            )));
        }
        let next = apply_san(&position, mv)?;

        move_state
            .round_votes
            .insert(player_id.to_string(), mv.to_string());

        if matches!(rules.move_application_mode, MoveApplicationMode::Immediate) {
            move_state.fen = fen_of(&next);
            move_state.move_history.push(mv.to_string());
            move_state.round_index += 1;
            move_state.round_votes.clear();
        }

        Ok(Vote::Chess {
            player_id: player_id.to_string(),
            round_index,
            mv: mv.to_string(),
        })
    }

    async fn votes(&self, round_index: u64) -> Result<Vec<Vote>> {
        let move_state = self.move_state.lock().await;
        if round_index != move_state.round_index {
            return Err(Error::FailedPrecondition(format!(
                "requested votes for stale round {round_index}, current round is {}",
                move_state.round_index
            )));
        }
        Ok(move_state
            .round_votes
            .iter()
            .map(|(player_id, mv)| Vote::Chess {
                player_id: player_id.clone(),
                round_index,
                mv: mv.clone(),
            })
            .collect())
    }

    async fn tally_round(&self) -> Result<ChessState> {
        self.require_accepting().await?;
        let rules = self.rules_snapshot().await?;
        if matches!(rules.move_application_mode, MoveApplicationMode::Immediate) {
            return Err(Error::FailedPrecondition(
                "this game applies moves immediately, there is nothing to tally".into(),
            ));
        }

        {
            let mut move_state = self.move_state.lock().await;
            if move_state.round_votes.is_empty() {
                return Err(Error::FailedPrecondition(
                    "no votes cast for the current round".into(),
                ));
            }

            let mut tally: HashMap<String, u32> = HashMap::new();
            for mv in move_state.round_votes.values() {
                *tally.entry(mv.clone()).or_insert(0) += 1;
            }
            let winner = tally
                .into_iter()
                .max_by_key(|(_, count)| *count)
                .map(|(mv, _)| mv)
                .expect("round_votes was checked non-empty above");

            let position = position_from_fen(&move_state.fen)?;
            let next = apply_san(&position, &winner)?;
            move_state.fen = fen_of(&next);
            move_state.move_history.push(winner);
            move_state.round_index += 1;
            move_state.round_votes.clear();
        }

        self.snapshot().await
    }

    async fn change_accepting_votes(&self, accepting: bool) -> Result<ChessState> {
        {
            let mut guard = self.accepting.lock().await;
            *guard = accepting;
        }
        info!(accepting, "accepting-votes flag changed");
        self.snapshot().await
    }

    async fn stop(&self) -> Result<()> {
        let mut accepting = self.accepting.lock().await;
        *accepting = false;
        info!("chess game stopped, rejecting further mutating requests");
        Ok(())
    }

    async fn register_follower(&self, follower: FollowerRegistration) -> Result<ChessState> {
        {
            let mut followers = self.followers.lock().await;
            followers.retain(|f| f.follower_id != follower.follower_id);
            followers.push(follower);
        }
        self.snapshot().await
    }

    async fn seed_from_snapshot(&self, state: ChessState) -> Result<()> {
        {
            let mut accepting = self.accepting.lock().await;
            *accepting = state.accepting_moves;
        }
        {
            let mut teams = self.teams.lock().await;
            *teams = (state.white, state.black);
        }
        {
            let mut move_state = self.move_state.lock().await;
            move_state.fen = state.fen;
            move_state.round_index = state.round_index;
            move_state.round_votes = state.round_votes;
            move_state.move_history = state.move_history;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::types::{BalancePolicy, GameType, Visibility};

    fn test_metadata() -> GameMetadata {
        GameMetadata {
            game_id: "test-game".to_string(),
            title: "Test Game".to_string(),
            visibility: Visibility::Public,
            game_type: GameType::Chess,
        }
    }

    fn immediate_rules() -> ChessRules {
        ChessRules {
            balance_policy: BalancePolicy::ToleratedDifference(1),
            team_switching_enabled: false,
            move_application_mode: MoveApplicationMode::Immediate,
        }
    }

    fn tally_rules() -> ChessRules {
        ChessRules {
            balance_policy: BalancePolicy::ToleratedDifference(1),
            team_switching_enabled: false,
            move_application_mode: MoveApplicationMode::AppliedAfterTally { timeout_seconds: 30 },
        }
    }

    #[tokio::test]
    async fn rejects_moves_once_stopped() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();
        game.stop().await.unwrap();
        let err = game.post_vote("w1", 1, "e4").await.unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn immediate_mode_applies_a_vote_right_away() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();
        game.post_vote("w1", 1, "e4").await.unwrap();
        let state = game.snapshot().await.unwrap();
        assert_eq!(state.round_index, 2);
        assert_eq!(state.move_history, vec!["e4".to_string()]);
    }

    #[tokio::test]
    async fn tally_mode_applies_the_majority_vote() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), tally_rules()).await.unwrap();
        game.add_players(
            vec!["w1".into(), "w2".into()],
            vec!["b1".into(), "b2".into()],
        )
        .await
        .unwrap();
        game.post_vote("w1", 1, "e4").await.unwrap();
        game.post_vote("w2", 1, "e4").await.unwrap();
        let state = game.tally_round().await.unwrap();
        assert_eq!(state.round_index, 2);
        assert_eq!(state.move_history, vec!["e4".to_string()]);
    }

    #[tokio::test]
    async fn rejects_votes_for_a_stale_round() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();
        game.post_vote("w1", 1, "e4").await.unwrap();
        let err = game.post_vote("b1", 1, "e5").await.unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn rejects_a_vote_cast_out_of_turn() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();
        let err = game.post_vote("b1", 1, "e5").await.unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn change_accepting_votes_can_be_flipped_back_on() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();

        game.change_accepting_votes(false).await.unwrap();
        let err = game.post_vote("w1", 1, "e4").await.unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));

        game.change_accepting_votes(true).await.unwrap();
        game.post_vote("w1", 1, "e4").await.unwrap();
    }

    #[tokio::test]
    async fn remove_players_no_ops_for_unknown_ids_without_rebalancing() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(
            vec!["w1".into(), "w2".into()],
            vec!["b1".into()],
        )
        .await
        .unwrap();

        // difference is already at the tolerated limit (1); removing b1
        // would widen it to 2, which must still succeed since a player can
        // never be forced to stay to preserve balance.
        let state = game.remove_players(vec!["b1".into()]).await.unwrap();
        assert_eq!(state.white, vec!["w1".to_string(), "w2".to_string()]);
        assert!(state.black.is_empty());

        // unknown id is a no-op, not an error.
        let state = game.remove_players(vec!["ghost".into()]).await.unwrap();
        assert_eq!(state.white, vec!["w1".to_string(), "w2".to_string()]);
    }

    #[tokio::test]
    async fn enforces_team_balance_on_add_players() {
        let game = ChessGame::new();
        game.initialize(test_metadata(), immediate_rules()).await.unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();
        let err = game
            .add_players(vec!["w2".into(), "w3".into()], vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }

    #[tokio::test]
    async fn full_game_projects_metadata_rules_and_state_together() {
        let game = ChessGame::new();
        let metadata = test_metadata();
        game.initialize(metadata.clone(), immediate_rules())
            .await
            .unwrap();
        game.add_players(vec!["w1".into()], vec!["b1".into()])
            .await
            .unwrap();

        let full = game.full_game().await.unwrap();
        assert_eq!(full.metadata, metadata);
        assert_eq!(full.rules, immediate_rules());
        assert_eq!(full.state.white, vec!["w1".to_string()]);
    }

    #[tokio::test]
    async fn full_game_fails_before_initialize() {
        let game = ChessGame::new();
        let err = game.full_game().await.unwrap_err();
        assert!(matches!(err, Error::FailedPrecondition(_)));
    }
}
