use std::sync::Arc;

use anyhow::{anyhow, Context as _};
use chess_core::traits::TokenVerifierT;
use chess_crypto::manager::KeyManager;
use chess_crypto::{TokenIssuer, TokenVerifier};
use chess_store::{AnyStore, MemoryStore, PostgresStore};
use tracing::info;

use crate::config::{Config, StoreKind};

/// Runtime context for the identity service: the Persistent Store, the Key
/// Manager, Token Issuer and Token Verifier, and the flags governing this
/// node's role (`keyer`, `add_key_on_empty_db`).
pub struct IdentityContext {
    pub config: Config,
    pub store: Arc<AnyStore>,
    pub key_manager: Arc<KeyManager<AnyStore>>,
    pub token_issuer: Arc<TokenIssuer<AnyStore>>,
    pub token_verifier: Arc<TokenVerifier<AnyStore>>,
}

impl IdentityContext {
    pub async fn try_new(config: Config) -> anyhow::Result<Self> {
        info!("initializing identity context");

        let store = Arc::new(match config.store {
            StoreKind::Memory => AnyStore::Memory(MemoryStore::new()),
            StoreKind::Postgres => {
                let url = config
                    .database_url
                    .as_ref()
                    .context("postgres store selected but database_url is not set")?;
                AnyStore::Postgres(PostgresStore::connect(url).await?)
            }
        });

        let key_manager = Arc::new(KeyManager::with_validity(
            Arc::clone(&store),
            config.token_ttl_seconds * 3,
        ));

        if config.keyer && config.add_key_on_empty_db {
            use chess_core::traits::StoreT;
            if store.latest_signing_key().await?.is_none() {
                info!("store is empty and add_key_on_empty_db is set, minting bootstrap key");
                key_manager.signing_key().await?;
            }
        }

        let token_issuer = Arc::new(TokenIssuer::new(
            Arc::clone(&key_manager),
            config.token_ttl_seconds,
        ));

        let token_verifier = TokenVerifier::new(Arc::clone(&store));
        token_verifier
            .refresh()
            .await
            .map_err(|e| anyhow!("initial public key refresh failed: {e}"))?;
        token_verifier.spawn_refresh_loop(std::time::Duration::from_secs(3600));

        Ok(Self {
            config,
            store,
            key_manager,
            token_issuer,
            token_verifier,
        })
    }

    /// Mints a fresh signing key. Callers must check `config.keyer` first;
    /// this does not re-check it so the RPC layer's rejection message can
    /// name the specific operation.
    pub async fn rotate_signing_key(&self) -> anyhow::Result<()> {
        use chess_core::traits::KeyManagerT;
        self.key_manager.rotate().await?;
        Ok(())
    }
}
