//! Persistent Store implementations: an in-memory store for tests and
//! single-node demos, and a Postgres-backed store for production, both
//! implementing `chess_core::traits::StoreT`. Table layout (`players`,
//! `playertoken_keys`) follows the spec's persisted-state section.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use chess_core::traits::StoreT;
use chess_core::types::{Player, PublicKeyView, SigningKeyRecord};
use chess_core::Result;

/// The `--store` CLI selector resolves to one of these at startup. A single
/// enum (rather than a trait object behind `Box<dyn StoreT>`) keeps every
/// call site monomorphic and lets `KeyManager`/`TokenVerifier` stay generic
/// over `StoreT` without boxing.
pub enum AnyStore {
    Memory(MemoryStore),
    Postgres(PostgresStore),
}

#[async_trait]
impl StoreT for AnyStore {
    async fn create_player(&self, username: &str) -> Result<Player> {
        match self {
            AnyStore::Memory(s) => s.create_player(username).await,
            AnyStore::Postgres(s) => s.create_player(username).await,
        }
    }

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>> {
        match self {
            AnyStore::Memory(s) => s.get_player_by_id(id).await,
            AnyStore::Postgres(s) => s.get_player_by_id(id).await,
        }
    }

    async fn get_player_by_username(
        &self,
        username: &str,
        number_suffix: u32,
    ) -> Result<Option<Player>> {
        match self {
            AnyStore::Memory(s) => s.get_player_by_username(username, number_suffix).await,
            AnyStore::Postgres(s) => s.get_player_by_username(username, number_suffix).await,
        }
    }

    async fn put_signing_key(&self, key: &SigningKeyRecord) -> Result<()> {
        match self {
            AnyStore::Memory(s) => s.put_signing_key(key).await,
            AnyStore::Postgres(s) => s.put_signing_key(key).await,
        }
    }

    async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>> {
        match self {
            AnyStore::Memory(s) => s.latest_signing_key().await,
            AnyStore::Postgres(s) => s.latest_signing_key().await,
        }
    }

    async fn signing_key_by_id(&self, key_id: i64) -> Result<Option<SigningKeyRecord>> {
        match self {
            AnyStore::Memory(s) => s.signing_key_by_id(key_id).await,
            AnyStore::Postgres(s) => s.signing_key_by_id(key_id).await,
        }
    }

    async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>> {
        match self {
            AnyStore::Memory(s) => s.all_public_keys().await,
            AnyStore::Postgres(s) => s.all_public_keys().await,
        }
    }
}
