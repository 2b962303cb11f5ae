//! Collaborator traits implemented by the `chess-store`, `chess-crypto` and
//! `chess-game` crates and consumed by the `identity` and `gameplane`
//! binaries. Mirrors the teacher's `StorageT`/`EncryptorT` split: one trait
//! per concern, `async_trait` at the seams, `core::Result` everywhere.

use async_trait::async_trait;

use crate::types::{
    ChessRules, ChessState, FollowerRegistration, Game, GameMetadata, Player, PublicKeyView,
    SigningKeyRecord, Vote,
};
use crate::Result;

/// The Persistent Store: players, username reservations and signing keys.
/// Implementations: an in-memory store for tests and single-node demos, a
/// Postgres-backed store for production, per the spec's persisted-state
/// section.
#[async_trait]
pub trait StoreT: Send + Sync {
    async fn create_player(&self, username: &str) -> Result<Player>;
    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>>;
    async fn get_player_by_username(
        &self,
        username: &str,
        number_suffix: u32,
    ) -> Result<Option<Player>>;

    /// Persist a freshly generated signing key. `key_id` must be strictly
    /// greater than any previously stored key-id.
    async fn put_signing_key(&self, key: &SigningKeyRecord) -> Result<()>;
    async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>>;
    async fn signing_key_by_id(&self, key_id: i64) -> Result<Option<SigningKeyRecord>>;
    async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>>;
}

/// The Key Manager: owns the active signing key and exposes the public
/// view verifiers refresh against. Grounded on the original's `keys`
/// struct (`sync.RWMutex` guarding a `timedPrivateKey`), reworked onto
/// `tokio::sync::RwLock` by the implementation.
#[async_trait]
pub trait KeyManagerT: Send + Sync {
    /// The key currently used to sign new tokens, minting one if none is
    /// valid (i.e. on first boot, or once the active key has expired).
    async fn signing_key(&self) -> Result<SigningKeyRecord>;
    async fn public_keys(&self) -> Result<Vec<PublicKeyView>>;
    /// Force-rotate regardless of the active key's remaining validity.
    async fn rotate(&self) -> Result<SigningKeyRecord>;
}

/// The Token Issuer: mints signed `PlayerToken`s for a validated player id.
#[async_trait]
pub trait TokenIssuerT: Send + Sync {
    async fn issue(&self, player_id: &str) -> Result<String>;
}

/// The Token Verifier: validates an inbound token and yields the player id
/// to set on `x-player-validated-id`. Grounded on the original's
/// `playerAuthIngress`: a cached key set refreshed on a ticker and
/// on-demand when an unknown key-id is seen.
#[async_trait]
pub trait TokenVerifierT: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String>;
    async fn refresh(&self) -> Result<()>;
}

/// The chess Game Logic Module: state transitions behind the game/teams/move
/// lock ordering described in the spec's concurrency model. Implementations
/// own their own interior mutability; the trait is deliberately `&self`, not
/// `&mut self`.
#[async_trait]
pub trait GameLogicT: Send + Sync {
    async fn initialize(&self, metadata: GameMetadata, rules: ChessRules) -> Result<()>;
    async fn snapshot(&self) -> Result<ChessState>;

    /// The full `Game` projection (metadata + rules + state) `AddSlave`
    /// hands a joining Follower to seed from, and the `Game(detailed)`
    /// player-facing read returns.
    async fn full_game(&self) -> Result<Game>;

    async fn add_players(&self, white: Vec<String>, black: Vec<String>) -> Result<ChessState>;
    async fn remove_players(&self, players: Vec<String>) -> Result<ChessState>;

    async fn post_vote(&self, player_id: &str, round_index: u64, mv: &str) -> Result<Vote>;
    async fn votes(&self, round_index: u64) -> Result<Vec<Vote>>;
    async fn tally_round(&self) -> Result<ChessState>;

    /// Toggles whether `post_vote` accepts new votes, independent of the
    /// terminal `stop`: unlike `stop`, this can be flipped back on.
    async fn change_accepting_votes(&self, accepting: bool) -> Result<ChessState>;

    async fn stop(&self) -> Result<()>;

    async fn register_follower(&self, follower: FollowerRegistration) -> Result<ChessState>;

    /// Overwrites local state wholesale from a Leader-provided snapshot.
    /// Used only by a Follower seeding from `AddSlave`'s response or
    /// applying a broadcast; never called on a Leader's own `ChessGame`.
    async fn seed_from_snapshot(&self, state: ChessState) -> Result<()>;
}
