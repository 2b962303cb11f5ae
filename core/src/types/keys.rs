use serde::{Deserialize, Serialize};

/// A signing keypair persisted by the Store. `key_id` is a globally
/// monotonic integer; the private key is PKCS#1-DER-encoded and base64'd
/// for storage, matching the `playertoken_keys.key_pem` column described
/// in the spec's persisted-state section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKeyRecord {
    pub key_id: i64,
    pub issued_at: i64,
    pub valid_seconds: i64,
    /// PKCS#1 DER bytes of the RSA private key, base64-encoded.
    pub private_key_pem: String,
}

impl SigningKeyRecord {
    pub fn is_valid_at(&self, now: i64) -> bool {
        now - self.issued_at < self.valid_seconds
    }

    pub fn expires_at(&self) -> i64 {
        self.issued_at + self.valid_seconds
    }
}

/// Projection of a `SigningKeyRecord` exposing only what verifiers need.
/// Every verifier observes the same ordered set for a given Reload().
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeyView {
    pub key_id: i64,
    pub issued_at: i64,
    pub valid_seconds: i64,
    /// PKCS#1 DER bytes of the RSA public key, base64-encoded.
    pub public_key_pem: String,
}

impl PublicKeyView {
    pub fn is_valid_at(&self, now: i64) -> bool {
        now - self.issued_at < self.valid_seconds
    }
}
