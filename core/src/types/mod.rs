mod player;
mod keys;
mod token;
mod game;
mod chess;
mod follower;

pub use player::*;
pub use keys::*;
pub use token::*;
pub use game::*;
pub use chess::*;
pub use follower::*;
