use std::sync::Arc;

use offs_crypto::{Checksum, RandomizerSource};
use tracing::trace;

use crate::block::BlockSize;
use crate::error::Error;
use crate::pool::PooledBlockStore;

/// One whitener handed back by [`WhitenerSourcer::gather`]: either sampled
/// from the pool (must survive rollback) or freshly generated and persisted
/// (must be deleted on rollback) — §4.5.
#[derive(Debug, Clone)]
pub enum Whitener {
    Cached { checksum: Checksum, data: Vec<u8> },
    Fresh { checksum: Checksum, data: Vec<u8> },
}

impl Whitener {
    pub fn checksum(&self) -> Checksum {
        match self {
            Whitener::Cached { checksum, .. } | Whitener::Fresh { checksum, .. } => *checksum,
        }
    }

    pub fn data(&self) -> &[u8] {
        match self {
            Whitener::Cached { data, .. } | Whitener::Fresh { data, .. } => data,
        }
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, Whitener::Cached { .. })
    }
}

/// Gathers whitener blocks for a tuple: a configured fraction sampled from
/// the pool, the remainder generated fresh via the CSPRNG and inserted.
pub struct WhitenerSourcer<'a, S: PooledBlockStore> {
    store: &'a S,
    pool: String,
    cache_fraction: f64,
    randomizer: Arc<dyn RandomizerSource>,
}

impl<'a, S: PooledBlockStore> WhitenerSourcer<'a, S> {
    pub fn new(store: &'a S, pool: impl Into<String>, cache_fraction: f64, randomizer: Arc<dyn RandomizerSource>) -> Self {
        Self {
            store,
            pool: pool.into(),
            cache_fraction,
            randomizer,
        }
    }

    pub async fn gather(&self, size: BlockSize, n: usize, date_created: u64) -> Result<Vec<Whitener>, Error> {
        let cache_quota = (n as f64 * self.cache_fraction).floor() as usize;
        let cached_checksums = self
            .store
            .get_random_blocks_from_pool(&self.pool, cache_quota)
            .await?;

        let mut out = Vec::with_capacity(n);
        for checksum in cached_checksums {
            let hex = checksum.to_hex();
            let data = self.store.get_from_pool(&self.pool, &hex).await?;
            out.push(Whitener::Cached { checksum, data });
        }

        while out.len() < n {
            let data = self.randomizer.generate(size.bytes() as usize);
            let hex = self.store.put_in_pool(&self.pool, data.clone(), date_created).await?;
            let checksum = Checksum::from_hex(&hex).expect("put_in_pool returns a valid hex checksum");
            trace!(pool = %self.pool, hex = %checksum.to_hex(), "generated fresh whitener");
            out.push(Whitener::Fresh { checksum, data });
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::InMemoryPooledBlockStore;

    #[tokio::test]
    async fn gathers_exactly_n_whiteners() {
        let store = InMemoryPooledBlockStore::new();
        let sourcer = WhitenerSourcer::new(&store, "whiteners", 0.5, Arc::new(offs_crypto::OsRandomizer));
        let whiteners = sourcer.gather(BlockSize::Message, 3, 0).await.unwrap();
        assert_eq!(whiteners.len(), 3);
        for w in &whiteners {
            assert_eq!(w.data().len(), BlockSize::Message.bytes() as usize);
        }
    }

    #[tokio::test]
    async fn draws_from_cache_before_generating_fresh() {
        let store = InMemoryPooledBlockStore::new();
        store
            .bootstrap_pool("whiteners", BlockSize::Message, 4, &offs_crypto::OsRandomizer, 0)
            .await
            .unwrap();

        let sourcer = WhitenerSourcer::new(&store, "whiteners", 1.0, Arc::new(offs_crypto::OsRandomizer));
        let whiteners = sourcer.gather(BlockSize::Message, 2, 0).await.unwrap();
        assert!(whiteners.iter().all(|w| w.is_cached()));
    }
}
