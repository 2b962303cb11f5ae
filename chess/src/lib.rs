//! The chess Game Logic Module: FEN-backed board state via `shakmaty`,
//! team balance enforcement, and per-round vote tallying, guarded by the
//! game -> teams -> move lock ordering the spec's concurrency model
//! requires.

pub mod balance;
pub mod board;
pub mod game;

pub use game::ChessGame;
