use std::sync::Arc;

use chess_core::traits::KeyManagerT;
use chess_crypto::manager::KeyManager;
use chess_crypto::{TokenIssuer, TokenVerifier};
use chess_store::MemoryStore;

use crate::constants::TEST_TOKEN_TTL_SECONDS;

/// A Key Manager, Token Issuer and Token Verifier wired to the same
/// in-memory store, with a signing key already minted. Saves every
/// identity-service test from repeating this four-call setup.
pub struct TestTokenStack {
    pub store: Arc<MemoryStore>,
    pub key_manager: Arc<KeyManager<MemoryStore>>,
    pub issuer: TokenIssuer<MemoryStore>,
    pub verifier: Arc<TokenVerifier<MemoryStore>>,
}

pub async fn test_token_stack() -> TestTokenStack {
    let store = Arc::new(MemoryStore::new());
    let key_manager = Arc::new(KeyManager::new(Arc::clone(&store)));
    key_manager
        .signing_key()
        .await
        .expect("minting the first signing key never fails");

    let issuer = TokenIssuer::new(Arc::clone(&key_manager), TEST_TOKEN_TTL_SECONDS);
    let verifier = TokenVerifier::new(Arc::clone(&store));
    verifier
        .refresh()
        .await
        .expect("refreshing from a store that already holds a key never fails");

    TestTokenStack {
        store,
        key_manager,
        issuer,
        verifier,
    }
}
