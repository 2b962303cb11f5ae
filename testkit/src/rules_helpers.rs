use chess_core::types::{BalancePolicy, ChessRules, MoveApplicationMode};

/// `tolerate-difference 1`, moves applied immediately. The default shape
/// most unit tests reach for when balance and round semantics aren't the
/// thing under test.
pub fn immediate_rules() -> ChessRules {
    ChessRules {
        balance_policy: BalancePolicy::ToleratedDifference(1),
        team_switching_enabled: false,
        move_application_mode: MoveApplicationMode::Immediate,
    }
}

/// Same balance policy, moves applied only once a round is tallied.
pub fn tally_rules(timeout_seconds: u32) -> ChessRules {
    ChessRules {
        balance_policy: BalancePolicy::ToleratedDifference(1),
        team_switching_enabled: false,
        move_application_mode: MoveApplicationMode::AppliedAfterTally { timeout_seconds },
    }
}

pub fn rules_with_balance(policy: BalancePolicy) -> ChessRules {
    ChessRules {
        balance_policy: policy,
        team_switching_enabled: false,
        move_application_mode: MoveApplicationMode::Immediate,
    }
}

pub fn rules_with_team_switching() -> ChessRules {
    ChessRules {
        balance_policy: BalancePolicy::ToleratedDifference(1),
        team_switching_enabled: true,
        move_application_mode: MoveApplicationMode::Immediate,
    }
}
