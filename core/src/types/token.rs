use serde::{Deserialize, Serialize};

/// Default token lifetime: 30 minutes, per the spec's `PlayerToken` invariant.
pub const DEFAULT_TOKEN_TTL_SECONDS: i64 = 30 * 60;

/// Metadata key carrying the signed token, outbound from clients.
pub const PLAYER_TOKEN_HEADER: &str = "x-player-token";

/// Metadata key the Token Verifier sets on success. Handlers must never
/// read the player id from anywhere else, to preclude confused-deputy bugs.
pub const PLAYER_VALIDATED_ID_HEADER: &str = "x-player-validated-id";

/// Standard JWT-style claims signed by the Token Issuer and checked by the
/// Token Verifier. `iss` is the signing key's key-id, rendered as a decimal
/// string (mirroring the original's `strconv.ParseInt(c.Issuer, 10, 64)`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn new(key_id: i64, player_id: String, now: i64, ttl_seconds: i64) -> Self {
        Self {
            iss: key_id.to_string(),
            sub: player_id,
            iat: now,
            nbf: now,
            exp: now + ttl_seconds,
        }
    }

    pub fn is_temporally_valid(&self, now: i64) -> bool {
        now >= self.nbf && now <= self.exp
    }
}
