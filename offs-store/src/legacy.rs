use offs_crypto::Checksum;

use crate::error::Error;
use crate::pool::{PooledBlockStore, DEFAULT_POOL};

/// The single-pool façade (§4.3.2): every call delegates to the pooled
/// store with `pool = "default"`, for callers that never needed namespaces.
pub struct LegacyBlockStore<S: PooledBlockStore> {
    store: S,
}

impl<S: PooledBlockStore> LegacyBlockStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn has(&self, hex: &str, now: u64) -> Result<bool, Error> {
        self.store.has_in_pool(DEFAULT_POOL, hex, now).await
    }

    pub async fn get(&self, hex: &str) -> Result<Vec<u8>, Error> {
        self.store.get_from_pool(DEFAULT_POOL, hex).await
    }

    pub async fn put(&self, data: Vec<u8>, now: u64) -> Result<String, Error> {
        self.store.put_in_pool(DEFAULT_POOL, data, now).await
    }

    pub async fn delete(&self, hex: &str) -> Result<(), Error> {
        self.store.delete_from_pool(DEFAULT_POOL, hex).await
    }

    pub async fn get_random_blocks(&self, n: usize) -> Result<Vec<Checksum>, Error> {
        self.store.get_random_blocks_from_pool(DEFAULT_POOL, n).await
    }

    pub fn into_inner(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::InMemoryPooledBlockStore;

    #[tokio::test]
    async fn delegates_to_the_default_pool() {
        let legacy = LegacyBlockStore::new(InMemoryPooledBlockStore::new());
        let hex = legacy.put(vec![1, 2, 3], 0).await.unwrap();
        assert!(legacy.has(&hex, 0).await.unwrap());
        assert_eq!(legacy.get(&hex).await.unwrap(), vec![1, 2, 3]);
        legacy.delete(&hex).await.unwrap();
        assert!(!legacy.has(&hex, 0).await.unwrap());
    }
}
