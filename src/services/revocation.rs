use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

/// Where revoked token IDs are remembered until their natural expiry.
/// Logout writes here; every authenticated request checks it.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Remember `jti` as revoked for the next `ttl`.
    async fn add(&self, jti: &str, ttl: Duration);

    /// Whether `jti` is currently revoked. An ID past its ttl counts as
    /// not revoked; the token carrying it has already expired by then.
    async fn contains(&self, jti: &str) -> bool;
}

/// Process-local revocation store. A restart forgets revocations, which is
/// tolerable while access tokens stay short-lived.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    revoked: DashMap<String, Instant>,
}

impl InMemoryRevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn add(&self, jti: &str, ttl: Duration) {
        self.revoked.insert(jti.to_string(), Instant::now() + ttl);
    }

    async fn contains(&self, jti: &str) -> bool {
        let expired = match self.revoked.get(jti) {
            None => return false,
            Some(deadline) => *deadline <= Instant::now(),
        };

        // The read guard is gone by here, so the shard can be mutated.
        if expired {
            self.revoked.remove(jti);
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_added_id_is_revoked() {
        let store = InMemoryRevocationStore::new();
        store.add("some-jti", Duration::from_secs(60)).await;

        assert!(store.contains("some-jti").await);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_revoked() {
        let store = InMemoryRevocationStore::new();

        assert!(!store.contains("never-seen").await);
    }

    #[tokio::test]
    async fn test_expired_id_is_forgotten() {
        let store = InMemoryRevocationStore::new();
        store.add("stale-jti", Duration::ZERO).await;

        assert!(!store.contains("stale-jti").await);
        // The lazy prune also dropped the entry itself.
        assert!(store.revoked.get("stale-jti").is_none());
    }
}
