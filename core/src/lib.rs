//! Shared types, error taxonomy and collaborator traits for the community
//! chess coordination plane: the Player/SigningKey/Token/Game data model,
//! the Persistent Store / Key Manager / Token Issuer / Token Verifier /
//! Game Logic traits that every other crate implements or consumes, and
//! the flat error enum every component normalizes onto at RPC boundaries.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
