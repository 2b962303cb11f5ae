use async_trait::async_trait;
use chess_core::traits::StoreT;
use chess_core::types::{Player, PublicKeyView, SigningKeyRecord, MAX_USERNAME_SUFFIX};
use chess_core::{Error, Result};
use sqlx::PgPool;
use tracing::info;

/// Postgres-backed `StoreT`. Table layout:
///
/// ```sql
/// CREATE TABLE players (
///   id TEXT PRIMARY KEY,
///   username TEXT NOT NULL,
///   number_suffix INTEGER NOT NULL,
///   created_at BIGINT NOT NULL,
///   UNIQUE (username, number_suffix)
/// );
/// CREATE TABLE playertoken_keys (
///   key_id BIGINT PRIMARY KEY,
///   issued_at BIGINT NOT NULL,
///   valid_seconds BIGINT NOT NULL,
///   key_pem TEXT NOT NULL
/// );
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| Error::Unavailable(format!("postgres connect failed: {e}")))?;
        info!("connected to postgres store");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_sqlx_err(e: sqlx::Error) -> Error {
    Error::Internal(format!("postgres query failed: {e}"))
}

#[async_trait]
impl StoreT for PostgresStore {
    async fn create_player(&self, username: &str) -> Result<Player> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_err)?;

        let max_suffix: Option<i32> = sqlx::query_scalar(
            "SELECT MAX(number_suffix) FROM players WHERE username = $1 FOR UPDATE",
        )
        .bind(username)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let next_suffix = max_suffix.unwrap_or(0) as u32 + 1;
        if next_suffix > MAX_USERNAME_SUFFIX {
            return Err(Error::ResourceExhausted(format!(
                "username {username} has no remaining suffixes"
            )));
        }

        let player = Player::new(
            uuid::Uuid::new_v4().to_string(),
            username.to_string(),
            next_suffix,
            chrono::Utc::now().timestamp(),
        );

        sqlx::query(
            "INSERT INTO players (id, username, number_suffix, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&player.id)
        .bind(&player.username)
        .bind(player.number_suffix as i32)
        .bind(player.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;
        Ok(player)
    }

    async fn get_player_by_id(&self, id: &str) -> Result<Option<Player>> {
        let row: Option<(String, String, i32, i64)> = sqlx::query_as(
            "SELECT id, username, number_suffix, created_at FROM players WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(|(id, username, suffix, created_at)| {
            Player::new(id, username, suffix as u32, created_at)
        }))
    }

    async fn get_player_by_username(
        &self,
        username: &str,
        number_suffix: u32,
    ) -> Result<Option<Player>> {
        let row: Option<(String, String, i32, i64)> = sqlx::query_as(
            "SELECT id, username, number_suffix, created_at FROM players WHERE username = $1 AND number_suffix = $2",
        )
        .bind(username)
        .bind(number_suffix as i32)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(|(id, username, suffix, created_at)| {
            Player::new(id, username, suffix as u32, created_at)
        }))
    }

    async fn put_signing_key(&self, key: &SigningKeyRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO playertoken_keys (key_id, issued_at, valid_seconds, key_pem) VALUES ($1, $2, $3, $4)",
        )
        .bind(key.key_id)
        .bind(key.issued_at)
        .bind(key.valid_seconds)
        .bind(&key.private_key_pem)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }

    async fn latest_signing_key(&self) -> Result<Option<SigningKeyRecord>> {
        let row: Option<(i64, i64, i64, String)> = sqlx::query_as(
            "SELECT key_id, issued_at, valid_seconds, key_pem FROM playertoken_keys ORDER BY key_id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(|(key_id, issued_at, valid_seconds, private_key_pem)| SigningKeyRecord {
            key_id,
            issued_at,
            valid_seconds,
            private_key_pem,
        }))
    }

    async fn signing_key_by_id(&self, key_id: i64) -> Result<Option<SigningKeyRecord>> {
        let row: Option<(i64, i64, i64, String)> = sqlx::query_as(
            "SELECT key_id, issued_at, valid_seconds, key_pem FROM playertoken_keys WHERE key_id = $1",
        )
        .bind(key_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Ok(row.map(|(key_id, issued_at, valid_seconds, private_key_pem)| SigningKeyRecord {
            key_id,
            issued_at,
            valid_seconds,
            private_key_pem,
        }))
    }

    async fn all_public_keys(&self) -> Result<Vec<PublicKeyView>> {
        let rows: Vec<(i64, i64, i64, String)> = sqlx::query_as(
            "SELECT key_id, issued_at, valid_seconds, key_pem FROM playertoken_keys ORDER BY key_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        let now = chrono::Utc::now().timestamp();
        rows.into_iter()
            .filter(|(_, issued_at, valid_seconds, _)| now - issued_at < *valid_seconds)
            .map(|(key_id, issued_at, valid_seconds, private_key_pem)| {
                let private_key = decode_private_key(&private_key_pem)?;
                Ok(PublicKeyView {
                    key_id,
                    issued_at,
                    valid_seconds,
                    public_key_pem: encode_public_key(&private_key)?,
                })
            })
            .collect()
    }
}

fn decode_private_key(stored: &str) -> Result<rsa::RsaPrivateKey> {
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

fn encode_public_key(private_key: &rsa::RsaPrivateKey) -> Result<String> {
    use rsa::pkcs1::EncodeRsaPublicKey;
    let public_key = rsa::RsaPublicKey::from(private_key);
    public_key
        .to_pkcs1_pem(rsa::pkcs1::LineEnding::LF)
        .map(|pem| pem.to_string())
        .map_err(|e| Error::Internal(format!("pkcs1 public encode failed: {e}")))
}
