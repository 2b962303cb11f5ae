use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chess_core::traits::{KeyManagerT, StoreT};
use chess_core::types::{PublicKeyView, SigningKeyRecord, DEFAULT_TOKEN_TTL_SECONDS};
use chess_core::{Error, Result};
use rsa::pkcs1::{DecodeRsaPrivateKey, EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use tokio::sync::RwLock;
use tracing::info;

const RSA_KEY_BITS: usize = 2048;

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// In-memory cache of the currently active signing key, re-derived from the
/// store's PEM on load so the manager never holds two sources of truth.
struct Active {
    record: SigningKeyRecord,
    private_key: RsaPrivateKey,
}

/// Owns the active signing key. Mirrors the original `keys` struct's
/// `sync.RWMutex`-guarded `timedPrivateKey`, but on `tokio::sync::RwLock`
/// and backed by the Persistent Store rather than held purely in memory.
pub struct KeyManager<S: StoreT> {
    store: Arc<S>,
    active: RwLock<Option<Active>>,
    valid_seconds: i64,
}

impl<S: StoreT> KeyManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            active: RwLock::new(None),
            valid_seconds: DEFAULT_TOKEN_TTL_SECONDS * 3,
        }
    }

    pub fn with_validity(store: Arc<S>, valid_seconds: i64) -> Self {
        Self {
            store,
            active: RwLock::new(None),
            valid_seconds,
        }
    }

    async fn generate_and_store(&self) -> Result<Active> {
        let mut rng = rand::rngs::OsRng;
        let private_key = RsaPrivateKey::new(&mut rng, RSA_KEY_BITS)
            .map_err(|e| Error::Internal(format!("rsa keygen failed: {e}")))?;
        let pem = private_key
            .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
            .map_err(|e| Error::Internal(format!("pkcs1 encode failed: {e}")))?;

        let latest = self.store.latest_signing_key().await?;
        let key_id = latest.map(|k| k.key_id + 1).unwrap_or(1);

        let record = SigningKeyRecord {
            key_id,
            issued_at: now(),
            valid_seconds: self.valid_seconds,
            private_key_pem: STANDARD.encode(pem.as_bytes()),
        };
        self.store.put_signing_key(&record).await?;
        info!(key_id, "rotated signing key");
        Ok(Active { record, private_key })
    }
}

#[async_trait]
impl<S: StoreT> KeyManagerT for KeyManager<S> {
    async fn signing_key(&self) -> Result<SigningKeyRecord> {
        {
            let guard = self.active.read().await;
            if let Some(active) = guard.as_ref() {
                if active.record.is_valid_at(now()) {
                    return Ok(active.record.clone());
                }
            }
        }
        let mut guard = self.active.write().await;
        if let Some(active) = guard.as_ref() {
            if active.record.is_valid_at(now()) {
                return Ok(active.record.clone());
            }
        }
        let fresh = self.generate_and_store().await?;
        let record = fresh.record.clone();
        *guard = Some(fresh);
        Ok(record)
    }

    async fn public_keys(&self) -> Result<Vec<PublicKeyView>> {
        self.store.all_public_keys().await
    }

    async fn rotate(&self) -> Result<SigningKeyRecord> {
        let fresh = self.generate_and_store().await?;
        let record = fresh.record.clone();
        let mut guard = self.active.write().await;
        *guard = Some(fresh);
        Ok(record)
    }
}

impl<S: StoreT> KeyManager<S> {
    /// Parsed private key for the active signing key, used by the
    /// `TokenIssuer` to avoid re-parsing PEM on every issue call.
    pub async fn active_private_key(&self) -> Result<(i64, RsaPrivateKey)> {
        let record = self.signing_key().await?;
        let guard = self.active.read().await;
        let active = guard
            .as_ref()
            .filter(|a| a.record.key_id == record.key_id)
            .ok_or_else(|| Error::Internal("active key vanished between reads".into()))?;
        Ok((active.record.key_id, active.private_key.clone()))
    }
}

pub fn decode_private_key_pem(stored: &str) -> Result<RsaPrivateKey> {
    let pem_bytes = STANDARD
        .decode(stored)
        .map_err(|e| Error::Internal(format!("base64 decode failed: {e}")))?;
    let pem = String::from_utf8(pem_bytes)
        .map_err(|e| Error::Internal(format!("pem was not utf8: {e}")))?;
    RsaPrivateKey::from_pkcs1_pem(&pem)
        .map_err(|e| Error::Internal(format!("pkcs1 decode failed: {e}")))
}

pub fn public_pem_from_private(private_key: &RsaPrivateKey) -> Result<String> {
    let public_key = RsaPublicKey::from(private_key);
    public_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| Error::Internal(format!("pkcs1 public encode failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::types::Player;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    #[derive(Default)]
    struct MemStore {
        keys: StdMutex<Vec<SigningKeyRecord>>,
    }

    #[async_trait]
    impl StoreT for MemStore {
        async fn create_player(&self, _username: &str) -> Result<Player> {
            unimplemented!()
        }
        async fn get_player_by_id(&self, _id: &str) -> Result<Option<Player>> {
            unimplemented!()
        }
        async fn get_player_by_username(
            &self,
            _username: &str,
            _number_suffix: u32,
        ) -> Result<Option<Player>> {
            unimplemented!()
        }
        async fn put_signing_key(&self, key: &SigningKeyRecord) -> Result<()> {
            self.keys.lock().unwrap().push(key.clone());
            Ok(())
        }
        async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>> {
            Ok(self.keys.lock().unwrap().last().cloned())
        }
        async fn signing_key_by_id(&self, key_id: i64) -> Result<Option<SigningKeyRecord>> {
            Ok(self
                .keys
                .lock()
                .unwrap()
                .iter()
                .find(|k| k.key_id == key_id)
                .cloned())
        }
        async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>> {
            Ok(self
                .keys
                .lock()
                .unwrap()
                .iter()
                .map(|k| {
                    let private_key = decode_private_key_pem(&k.private_key_pem).unwrap();
                    PublicKeyView {
                        key_id: k.key_id,
                        issued_at: k.issued_at,
                        valid_seconds: k.valid_seconds,
                        public_key_pem: public_pem_from_private(&private_key).unwrap(),
                    }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn mints_a_key_on_first_use_and_reuses_it() {
        let manager = KeyManager::new(Arc::new(MemStore::default()));
        let first = manager.signing_key().await.unwrap();
        let second = manager.signing_key().await.unwrap();
        assert_eq!(first.key_id, second.key_id);
    }

    #[tokio::test]
    async fn rotate_produces_a_strictly_increasing_key_id() {
        let manager = KeyManager::new(Arc::new(MemStore::default()));
        let first = manager.signing_key().await.unwrap();
        let second = manager.rotate().await.unwrap();
        assert!(second.key_id > first.key_id);
    }
}
