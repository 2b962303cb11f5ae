//! Key Manager, Token Issuer and Token Verifier for the community chess
//! player-auth tokens: RSA keypair lifecycle, RS256-signed `PlayerToken`
//! minting, and cached signature verification with background refresh.
//!
//! Grounded on the original Go `playertoken/keys.go` (key rotation under a
//! `sync.RWMutex`) and `grpcplayertokens.go` (`playerAuthIngress`'s ticker
//! driven public-key cache), reworked onto `tokio::sync::RwLock` and
//! `jsonwebtoken`/`rsa` in place of Go's `crypto/rsa` + hand-rolled JWT.

pub mod issuer;
pub mod manager;
pub mod verifier;

pub use issuer::TokenIssuer;
pub use manager::KeyManager;
pub use verifier::TokenVerifier;
