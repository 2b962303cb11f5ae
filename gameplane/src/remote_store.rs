//! Adapts the Identity Service's `token_public_keys` RPC into a `StoreT`
//! so a game node can run a `chess_crypto::TokenVerifier` without its own
//! copy of player/key storage. Only `all_public_keys` is meaningful here;
//! the player and signing-key write paths belong to the identity service
//! alone and are never reached from this side.

use async_trait::async_trait;
use chess_core::traits::StoreT;
use chess_core::types::{Player, PublicKeyView, SigningKeyRecord};
use chess_core::{Error, Result};
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;

pub struct RemoteKeyStore {
    client: HttpClient,
}

impl RemoteKeyStore {
    pub fn connect(identity_url: &str) -> Result<Self> {
        let client = HttpClientBuilder::default()
            .build(identity_url)
            .map_err(|e| Error::Internal(format!("failed to build identity rpc client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl StoreT for RemoteKeyStore {
    async fn create_player(&self, _username: &str) -> Result<Player> {
        Err(Error::Internal(
            "RemoteKeyStore does not serve player registration".into(),
        ))
    }

    async fn get_player_by_id(&self, _id: &str) -> Result<Option<Player>> {
        Err(Error::Internal(
            "RemoteKeyStore does not serve player lookups".into(),
        ))
    }

    async fn get_player_by_username(
        &self,
        _username: &str,
        _number_suffix: u32,
    ) -> Result<Option<Player>> {
        Err(Error::Internal(
            "RemoteKeyStore does not serve player lookups".into(),
        ))
    }

    async fn put_signing_key(&self, _key: &SigningKeyRecord) -> Result<()> {
        Err(Error::Internal(
            "RemoteKeyStore is read-only, signing keys are minted by the identity service".into(),
        ))
    }

    async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>> {
        Err(Error::Internal(
            "RemoteKeyStore never holds private key material".into(),
        ))
    }

    async fn signing_key_by_id(&self, _key_id: i64) -> Result<Option<SigningKeyRecord>> {
        Err(Error::Internal(
            "RemoteKeyStore never holds private key material".into(),
        ))
    }

    async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>> {
        self.client
            .request("token_public_keys", rpc_params![])
            .await
            .map_err(|e| Error::Unavailable(format!("identity service unreachable: {e}")))
    }
}
