pub const TEST_GAME_ID: &str = "test-game";

pub const TEST_WHITE_PLAYERS: &[&str] = &["white-1", "white-2", "white-3"];
pub const TEST_BLACK_PLAYERS: &[&str] = &["black-1", "black-2", "black-3"];

pub const TEST_TOKEN_TTL_SECONDS: i64 = 1800;
