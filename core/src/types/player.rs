use serde::{Deserialize, Serialize};

/// The maximum `number_suffix` a (username, suffix) pair may hold before
/// further registrations under that username are rejected.
pub const MAX_USERNAME_SUFFIX: u32 = 9999;

/// A registered player. Immutable after creation: the only mutation the
/// identity service performs is assigning `number_suffix` at registration
/// time. `(username, number_suffix)` is unique for the lifetime of the
/// store, and `number_suffix` increases monotonically per username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub username: String,
    pub number_suffix: u32,
    pub created_at: i64,
}

impl Player {
    pub fn new(id: String, username: String, number_suffix: u32, created_at: i64) -> Self {
        Self {
            id,
            username,
            number_suffix,
            created_at,
        }
    }
}
