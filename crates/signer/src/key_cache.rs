//! Decrypt-on-first-use cache of live key pairs
//!
//! Maps a normalized G1 public-key hex to its decrypted [`KeyPair`]. Cache
//! population is single-flight: per key there is at most one concurrent
//! backend retrieve, and late arrivals wait for the winner's result instead
//! of issuing their own. A failed retrieve leaves the slot empty so the next
//! request can try again (with, say, a corrected password).
//!
//! Entries are never evicted; a cached pair lives until process exit. The
//! pair is immutable once inserted, so readers share it without locking.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use cerberus_crypto::KeyPair;
use cerberus_store::StoreError;
use parking_lot::Mutex;
use tokio::sync::OnceCell;

use crate::error::SignerResult;

type Entry = Arc<OnceCell<Arc<KeyPair>>>;

/// Shared, concurrency-safe key cache.
#[derive(Default)]
pub struct KeyCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fast-path lookup without touching the backend.
    pub fn get(&self, pub_key: &str) -> Option<Arc<KeyPair>> {
        self.entries.lock().get(pub_key)?.get().cloned()
    }

    /// Return the cached pair, or run `retrieve` to populate the slot.
    ///
    /// If the initiating caller is cancelled mid-retrieve, one of the
    /// waiters takes over initialization; the slot is only filled by a
    /// successful retrieve.
    pub async fn get_or_retrieve<F, Fut>(
        &self,
        pub_key: &str,
        retrieve: F,
    ) -> SignerResult<Arc<KeyPair>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<KeyPair, StoreError>>,
    {
        let entry = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(pub_key.to_string()).or_default())
        };

        let key_pair = entry
            .get_or_try_init(|| async { retrieve().await.map(Arc::new) })
            .await?;

        Ok(Arc::clone(key_pair))
    }

    /// Number of live entries (populated or pending).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn key_pair() -> KeyPair {
        KeyPair::generate(&mut rand::thread_rng())
    }

    #[tokio::test]
    async fn test_populates_on_miss_then_hits() {
        let cache = KeyCache::new();
        let kp = key_pair();
        let pub_key = kp.pub_key_hex();

        assert!(cache.get(&pub_key).is_none());

        let cached = cache
            .get_or_retrieve(&pub_key, || async { Ok(kp) })
            .await
            .unwrap();
        assert_eq!(cached.pub_key_hex(), pub_key);

        assert!(cache.get(&pub_key).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_single_flight_under_contention() {
        let cache = Arc::new(KeyCache::new());
        let kp = Arc::new(key_pair());
        let pub_key = kp.pub_key_hex();
        let retrieves = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            let retrieves = Arc::clone(&retrieves);
            let kp = Arc::clone(&kp);
            let pub_key = pub_key.clone();

            tasks.push(tokio::spawn(async move {
                cache
                    .get_or_retrieve(&pub_key, || async move {
                        retrieves.fetch_add(1, Ordering::SeqCst);
                        // Hold the slot long enough for every task to queue up.
                        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                        Ok(KeyPair::from_secret_bytes(&kp.private_key().to_be_bytes()).unwrap())
                    })
                    .await
                    .unwrap()
            }));
        }

        for task in tasks {
            let cached = task.await.unwrap();
            assert_eq!(cached.pub_key_hex(), pub_key);
        }

        assert_eq!(retrieves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_retrieve_leaves_slot_retryable() {
        let cache = KeyCache::new();
        let kp = key_pair();
        let pub_key = kp.pub_key_hex();

        let failed = cache
            .get_or_retrieve(&pub_key, || async {
                Err(StoreError::InvalidPassword)
            })
            .await;
        assert!(failed.is_err());
        assert!(cache.get(&pub_key).is_none());

        // A later request with the right password succeeds.
        let cached = cache
            .get_or_retrieve(&pub_key, || async { Ok(kp) })
            .await
            .unwrap();
        assert_eq!(cached.pub_key_hex(), pub_key);
    }
}
