use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::traits::{StoreT, TokenVerifierT};
use chess_core::types::PublicKeyView;
use chess_core::{Error, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Default cadence the background refresh ticker runs at, mirroring the
/// original's `defaultRefreshDuration` of one hour.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(3600);

/// Floor below which a caller-supplied refresh interval is rejected,
/// mirroring the original's `minRefreshDuration` of five seconds.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    iss: String,
    sub: String,
    iat: i64,
    nbf: i64,
    exp: i64,
}

/// Validates inbound `x-player-token` values against a cached set of public
/// keys, refreshed on a background ticker and on-demand whenever a token
/// names a key-id newer than anything cached. Grounded directly on the
/// original `playerAuthIngress`'s `refreshPublicKeys`/`keyForID` pair.
pub struct TokenVerifier<S: StoreT> {
    store: Arc<S>,
    cache: RwLock<HashMap<i64, PublicKeyView>>,
}

impl<S: StoreT + 'static> TokenVerifier<S> {
    pub fn new(store: Arc<S>) -> Arc<Self> {
        let verifier = Arc::new(Self {
            store,
            cache: RwLock::new(HashMap::new()),
        });
        verifier
    }

    /// Spawns the background refresh loop. Matches the original's ticker
    /// pattern: refresh immediately, then on every tick thereafter.
    pub fn spawn_refresh_loop(self: &Arc<Self>, interval: Duration) {
        let interval = interval.max(MIN_REFRESH_INTERVAL);
        let verifier = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                if let Err(e) = verifier.refresh().await {
                    warn!(error = %e, "background public key refresh failed");
                }
            }
        });
    }

    fn largest_cached_key_id(cache: &HashMap<i64, PublicKeyView>) -> i64 {
        cache.keys().copied().max().unwrap_or(0)
    }
}

#[async_trait]
impl<S: StoreT + 'static> TokenVerifierT for TokenVerifier<S> {
    async fn verify(&self, token: &str) -> Result<String> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| Error::Unauthenticated(format!("malformed token header: {e}")))?;
        let kid = header
            .kid
            .ok_or_else(|| Error::Unauthenticated("token missing kid".into()))?;
        let key_id: i64 = kid
            .parse()
            .map_err(|_| Error::Unauthenticated("token kid was not numeric".into()))?;

        let needs_refresh = {
            let cache = self.cache.read().await;
            key_id > Self::largest_cached_key_id(&cache) || !cache.contains_key(&key_id)
        };
        if needs_refresh {
            debug!(key_id, "unknown key id on inbound token, refreshing cache");
            self.refresh().await?;
        }

        let view = {
            let cache = self.cache.read().await;
            cache
                .get(&key_id)
                .cloned()
                .ok_or_else(|| Error::Unauthenticated(format!("unknown signing key id {key_id}")))?
        };

        if !view.is_valid_at(chrono::Utc::now().timestamp()) {
            return Err(Error::Unauthenticated(format!(
                "signing key {key_id} has expired"
            )));
        }

        let decoding_key = DecodingKey::from_rsa_pem(view.public_key_pem.as_bytes())
            .map_err(|e| Error::Internal(format!("jwt decoding key load failed: {e}")))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_required_spec_claims(&["exp", "nbf"]);

        let data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| Error::Unauthenticated(format!("token signature invalid: {e}")))?;

        if data.claims.iss != kid {
            return Err(Error::Unauthenticated("iss/kid mismatch".into()));
        }

        Ok(data.claims.sub)
    }

    async fn refresh(&self) -> Result<()> {
        let keys = self.store.all_public_keys().await?;
        let mut cache = self.cache.write().await;
        cache.clear();
        for key in keys {
            cache.insert(key.key_id, key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::types::{Player, SigningKeyRecord};
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
                    let private_key = crate::manager::decode_private_key_pem(&k.private_key_pem)
                        .unwrap();
                    PublicKeyView {
                        key_id: k.key_id,
                        issued_at: k.issued_at,
                        valid_seconds: k.valid_seconds,
                        public_key_pem: crate::manager::public_pem_from_private(&private_key)
                            .unwrap(),
                    }
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn round_trips_a_token_through_issue_and_verify() {
        let store = Arc::new(MemStore::default());
        let manager = Arc::new(crate::manager::KeyManager::new(Arc::clone(&store)));
        manager.signing_key().await.unwrap();

        let issuer = crate::issuer::TokenIssuer::new(Arc::clone(&manager), 1800);
        let token = issuer.issue("player-123").await.unwrap();

        let verifier = TokenVerifier::new(Arc::clone(&store));
        verifier.refresh().await.unwrap();
        let player_id = verifier.verify(&token).await.unwrap();
        assert_eq!(player_id, "player-123");
    }

    #[tokio::test]
    async fn rejects_a_malformed_token() {
        let store = Arc::new(MemStore::default());
        let verifier = TokenVerifier::new(Arc::clone(&store));
        let err = verifier.verify("not.a.jwt").await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated(_)));
    }
}
