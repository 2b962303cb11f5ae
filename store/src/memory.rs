use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chess_core::traits::StoreT;
use chess_core::types::{Player, PublicKeyView, SigningKeyRecord, MAX_USERNAME_SUFFIX};
use chess_core::{Error, Result};
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    players_by_id: HashMap<String, Player>,
    max_suffix_by_username: HashMap<String, u32>,
    keys: Vec<SigningKeyRecord>,
}

/// In-memory `StoreT`, used by unit tests and single-process demos. Holds
/// no durability guarantees at all, matching the spec's explicit Non-goal
/// on persistent history/crash recovery for anything beyond the real
/// Postgres-backed store.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StoreT for MemoryStore {
    async fn create_player(&self, username: &str) -> Result<Player> {
        let mut inner = self.inner.lock().unwrap();
        let next_suffix = inner
            .max_suffix_by_username
            .get(username)
            .copied()
            .unwrap_or(0)
            + 1;
        if next_suffix > MAX_USERNAME_SUFFIX {
            return Err(Error::ResourceExhausted(format!(
                "username {username} has no remaining suffixes"
            )));
        }
        let player = Player::new(
            Uuid::new_v4().to_string(),
            username.to_string(),
            next_suffix,
            chrono::Utc::now().timestamp(),
        );
        inner
            .max_suffix_by_username
            .insert(username.to_string(), next_suffix);
        inner
            .players_by_id
            .insert(player.id.clone(), player.clone());
        Ok(player)
    }

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>> {
        Ok(self.inner.lock().unwrap().players_by_id.get(id).cloned())
    }

    async fn get_player_by_username(
        &self,
        username: &str,
        number_suffix: u32,
    ) -> Result<Option<Player>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .players_by_id
            .values()
            .find(|p| p.username == username && p.number_suffix == number_suffix)
            .cloned())
    }

    async fn put_signing_key(&self, key: &SigningKeyRecord) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.keys.iter().any(|k| k.key_id == key.key_id) {
            return Err(Error::InvalidArgument(format!(
                "key id {} already exists",
                key.key_id
            )));
        }
        inner.keys.push(key.clone());
        Ok(())
    }

    async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .max_by_key(|k| k.key_id)
            .cloned())
    }

    async fn signing_key_by_id(&self, key_id: i64) -> Result<Option<SigningKeyRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .keys
            .iter()
            .find(|k| k.key_id == key_id)
            .cloned())
    }

    async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>> {
        let now = chrono::Utc::now().timestamp();
        let inner = self.inner.lock().unwrap();
        inner
            .keys
            .iter()
            .filter(|k| k.is_valid_at(now))
            .map(|k| {
                let private_key = chess_crypto_private_key(&k.private_key_pem)?;
                Ok(PublicKeyView {
                    key_id: k.key_id,
                    issued_at: k.issued_at,
                    valid_seconds: k.valid_seconds,
                    public_key_pem: chess_crypto_public_pem(&private_key)?,
                })
            })
            .collect()
    }
}

// `chess-store` intentionally does not depend on `chess-crypto` (that would
// invert the dependency direction the binaries use); PEM handling for the
// in-memory store's `all_public_keys` view is therefore reimplemented here
// against the same `rsa`/`base64` primitives rather than imported.
fn chess_crypto_private_key(stored: &str) -> Result<rsa::RsaPrivateKey> {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use rsa::pkcs1::DecodeRsaPrivateKey;
    let pem_bytes = STANDARD
        .decode(stored)
        .map_err(|e| Error::Internal(format!("base64 decode failed: {e}")))?;
    let pem = String::from_utf8(pem_bytes)
        .map_err(|e| Error::Internal(format!("pem was not utf8: {e}")))?;
    rsa::RsaPrivateKey::from_pkcs1_pem(&pem)
        .map_err(|e| Error::Internal(format!("pkcs1 decode failed: {e}")))
}

fn chess_crypto_public_pem(private_key: &rsa::RsaPrivateKey) -> Result<String> {
    use rsa::pkcs1::EncodeRsaPublicKey;
    let public_key = rsa::RsaPublicKey::from(private_key);
    public_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| Error::Internal(format!("pkcs1 public encode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn assigns_increasing_suffixes_per_username() {
        let store = MemoryStore::new();
        let a = store.create_player("alice").await.unwrap();
        let b = store.create_player("alice").await.unwrap();
        assert_eq!(a.number_suffix, 1);
        assert_eq!(b.number_suffix, 2);
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn looks_up_by_id_and_by_username_suffix() {
        let store = MemoryStore::new();
        let player = store.create_player("bob").await.unwrap();
        assert_eq!(
            store.get_player_by_id(&player.id).await.unwrap(),
            Some(player.clone())
        );
        assert_eq!(
            store
                .get_player_by_username("bob", player.number_suffix)
                .await
                .unwrap(),
            Some(player)
        );
    }

    #[tokio::test]
    async fn rejects_duplicate_key_ids() {
        let store = MemoryStore::new();
        let key = SigningKeyRecord {
            key_id: 1,
            issued_at: 0,
            valid_seconds: 60,
            private_key_pem: String::new(),
        };
        store.put_signing_key(&key).await.unwrap();
        assert!(store.put_signing_key(&key).await.is_err());
    }
}
