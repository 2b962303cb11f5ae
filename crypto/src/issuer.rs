use std::sync::Arc;

use async_trait::async_trait;
use chess_core::traits::{KeyManagerT, StoreT, TokenIssuerT};
use chess_core::types::TokenClaims;
use chess_core::{Error, Result};
use jsonwebtoken::{encode, EncodingKey, Header};

use crate::manager::KeyManager;

/// Mints RS256-signed `PlayerToken`s. The JWT `kid` header and `iss` claim
/// both carry the signing key-id, so the Token Verifier can pick the right
/// public key without re-parsing the whole token twice.
pub struct TokenIssuer<S: StoreT> {
    key_manager: Arc<KeyManager<S>>,
    ttl_seconds: i64,
}

impl<S: StoreT> TokenIssuer<S> {
    pub fn new(key_manager: Arc<KeyManager<S>>, ttl_seconds: i64) -> Self {
        Self {
            key_manager,
            ttl_seconds,
        }
    }
}

#[async_trait]
impl<S: StoreT> TokenIssuerT for TokenIssuer<S> {
    async fn issue(&self, player_id: &str) -> Result<String> {
        let (key_id, private_key) = self.key_manager.active_private_key().await?;
        let now = chrono::Utc::now().timestamp();
        let claims = TokenClaims::new(key_id, player_id.to_string(), now, self.ttl_seconds);

        let pem_private = encode_private_key_pem(&private_key)?;

        let mut header = Header::new(jsonwebtoken::Algorithm::RS256);
        header.kid = Some(key_id.to_string());

        let encoding_key = EncodingKey::from_rsa_pem(pem_private.as_bytes())
            .map_err(|e| Error::Internal(format!("jwt encoding key load failed: {e}")))?;

        encode(&header, &claims, &encoding_key)
            .map_err(|e| Error::Internal(format!("jwt signing failed: {e}")))
    }
}

/// `jsonwebtoken`'s RSA key loaders expect PKCS#1 or PKCS#8 PEM; our stored
/// keys are PKCS#1, which `from_rsa_pem` accepts directly, so this is a thin
/// passthrough kept for the one call site that needs the PEM text.
fn encode_private_key_pem(private_key: &rsa::RsaPrivateKey) -> Result<String> {
    use rsa::pkcs1::EncodeRsaPrivateKey;
    private_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| Error::Internal(format!("pkcs1 encode failed: {e}")))
}
