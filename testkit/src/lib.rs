mod constants;
mod game_helpers;
mod rules_helpers;
mod store_helpers;

pub use constants::*;
pub use game_helpers::*;
pub use rules_helpers::*;
pub use store_helpers::*;
