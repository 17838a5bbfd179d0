//! Token revocation list
//!
//! Logout records a fingerprint of the token until its natural expiry.
//! Tokens are never stored verbatim.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::store::{bounded, StoreError};

/// SHA-256 of the raw token, hex encoded
pub fn token_fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
pub trait RevocationStore: Send + Sync + Debug {
    /// Record a revoked token until `expires_at`. Revoking twice is a no-op.
    async fn revoke(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn is_revoked(&self, fingerprint: &str) -> Result<bool, StoreError>;

    /// Drop entries whose token would have expired anyway
    async fn purge_expired(&self) -> Result<u64, StoreError>;
}

// =========================================================================
// In-memory
// =========================================================================

#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: RwLock<HashMap<String, DateTime<Utc>>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .entry(fingerprint.to_string())
            .or_insert(expires_at);
        Ok(())
    }

    async fn is_revoked(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.entries.read().await.contains_key(fingerprint))
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}

// =========================================================================
// Postgres
// =========================================================================

#[derive(Debug, Clone)]
pub struct PgRevocationStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgRevocationStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl RevocationStore for PgRevocationStore {
    async fn revoke(&self, fingerprint: &str, expires_at: DateTime<Utc>) -> Result<(), StoreError> {
        bounded(
            self.timeout,
            "revoke_token",
            sqlx::query(
                r#"
                INSERT INTO revoked_tokens (fingerprint, expires_at)
                VALUES ($1, $2)
                ON CONFLICT (fingerprint) DO NOTHING
                "#,
            )
            .bind(fingerprint)
            .bind(expires_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn is_revoked(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let row: Option<(i32,)> = bounded(
            self.timeout,
            "is_revoked",
            sqlx::query_as("SELECT 1 FROM revoked_tokens WHERE fingerprint = $1")
                .bind(fingerprint)
                .fetch_optional(&self.pool),
        )
        .await?;
        Ok(row.is_some())
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let result = bounded(
            self.timeout,
            "purge_revocations",
            sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= NOW()")
                .execute(&self.pool),
        )
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[test]
    fn test_fingerprint_is_stable_hex() {
        let a = token_fingerprint("abc.def.ghi");
        let b = token_fingerprint("abc.def.ghi");

        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_ne!(a, token_fingerprint("abc.def.ghj"));
    }

    #[tokio::test]
    async fn test_revoke_and_check() {
        let store = InMemoryRevocationStore::new();
        let fp = token_fingerprint("token");

        assert!(!store.is_revoked(&fp).await.unwrap());
        store
            .revoke(&fp, Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap();
        assert!(store.is_revoked(&fp).await.unwrap());

        // Second revoke keeps a single entry
        store
            .revoke(&fp, Utc::now() + ChronoDuration::hours(2))
            .await
            .unwrap();
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_only_removes_expired() {
        let store = InMemoryRevocationStore::new();
        store
            .revoke("old", Utc::now() - ChronoDuration::minutes(1))
            .await
            .unwrap();
        store
            .revoke("live", Utc::now() + ChronoDuration::hours(1))
            .await
            .unwrap();

        let purged = store.purge_expired().await.unwrap();

        assert_eq!(purged, 1);
        assert!(!store.is_revoked("old").await.unwrap());
        assert!(store.is_revoked("live").await.unwrap());
    }
}
