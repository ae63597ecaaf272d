use std::collections::{BTreeMap, HashMap};
use std::pin::Pin;
use std::sync::Arc;

use async_stream::try_stream;
use async_trait::async_trait;
use futures_core::stream::Stream;
use offs_codec::{is_encrypted, CblRecord, StructuredType, MAGIC_PREFIX};
use offs_crypto::{Checksum, RandomizerSource};
use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{debug, trace, warn};

use crate::block::BlockSize;
use crate::error::Error;

/// `"default"` is reserved for the legacy, non-namespaced façade (§3).
pub const DEFAULT_POOL: &str = "default";

pub fn validate_pool_id(pool: &str) -> Result<(), Error> {
    let ok = !pool.is_empty()
        && pool.len() <= 64
        && pool
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(Error::InvalidPoolId(pool.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolStats {
    pub pool_id: String,
    pub block_count: u64,
    pub total_bytes: u64,
    pub created_at: u64,
    pub last_accessed_at: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationStatus {
    Pending,
    Replicated,
    UnderReplicated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMetadataRecord {
    pub block_id: String,
    pub size_bytes: u64,
    pub pool_id: String,
    pub created_at: u64,
    pub expires_at: Option<u64>,
    pub last_accessed_at: u64,
    pub access_count: u64,
    pub replication_status: ReplicationStatus,
    pub target_replication_factor: u32,
    pub replica_node_ids: Vec<String>,
    pub parity_block_ids: Vec<String>,
}

impl BlockMetadataRecord {
    fn new(block_id: String, size_bytes: u64, pool_id: String, created_at: u64) -> Self {
        Self {
            block_id,
            size_bytes,
            pool_id,
            created_at,
            expires_at: None,
            last_accessed_at: created_at,
            access_count: 0,
            replication_status: ReplicationStatus::Pending,
            target_replication_factor: 1,
            replica_node_ids: Vec::new(),
            parity_block_ids: Vec::new(),
        }
    }
}

/// Result of `validatePoolDeletion` (§4.3.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyAnalysis {
    pub safe: bool,
    pub dependent_pools: Vec<String>,
    pub referenced_blocks: Vec<String>,
}

struct Inner {
    blocks: BTreeMap<(String, String), Vec<u8>>,
    pool_stats: HashMap<String, PoolStats>,
    metadata: HashMap<String, BlockMetadataRecord>,
}

impl Inner {
    fn new() -> Self {
        Self {
            blocks: BTreeMap::new(),
            pool_stats: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    fn remove_pool_entries(&mut self, pool: &str) {
        let keys: Vec<(String, String)> = self
            .blocks
            .range((pool.to_owned(), String::new())..)
            .take_while(|((p, _), _)| p == pool)
            .map(|(k, _)| k.clone())
            .collect();
        for key in keys {
            self.blocks.remove(&key);
        }
        self.pool_stats.remove(pool);
    }
}

/// In-memory realization of the namespaced, pooled block store (§4.3). The
/// on-disk backend in [`crate::disk`] provides the same contracts realized
/// as files under a two-nibble directory tree.
#[derive(Clone)]
pub struct InMemoryPooledBlockStore {
    inner: Arc<RwLock<Inner>>,
}

impl Default for InMemoryPooledBlockStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPooledBlockStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new())),
        }
    }

    async fn force_delete_pool_inner(&self, pool: &str) {
        let mut inner = self.inner.write().await;
        inner.remove_pool_entries(pool);
    }
}

#[async_trait]
pub trait PooledBlockStore: Send + Sync {
    async fn has_in_pool(&self, pool: &str, hex: &str, now: u64) -> Result<bool, Error>;
    async fn get_from_pool(&self, pool: &str, hex: &str) -> Result<Vec<u8>, Error>;
    async fn put_in_pool(&self, pool: &str, data: Vec<u8>, now: u64) -> Result<String, Error>;
    async fn delete_from_pool(&self, pool: &str, hex: &str) -> Result<(), Error>;
    async fn list_pools(&self) -> Result<Vec<String>, Error>;

    fn list_blocks_in_pool(
        &self,
        pool: &str,
        limit: Option<usize>,
        cursor: Option<String>,
    ) -> Pin<Box<dyn Stream<Item = Result<String, Error>> + Send + '_>>;

    async fn get_pool_stats(&self, pool: &str) -> Result<PoolStats, Error>;
    async fn validate_pool_deletion(&self, pool: &str) -> Result<DependencyAnalysis, Error>;
    async fn delete_pool(&self, pool: &str) -> Result<(), Error>;
    async fn force_delete_pool(&self, pool: &str) -> Result<(), Error>;
    async fn get_random_blocks_from_pool(&self, pool: &str, n: usize) -> Result<Vec<Checksum>, Error>;

    async fn bootstrap_pool(
        &self,
        pool: &str,
        size: BlockSize,
        n: usize,
        randomizer: &(dyn RandomizerSource + Sync),
        now: u64,
    ) -> Result<(), Error>;
}

#[async_trait]
impl PooledBlockStore for InMemoryPooledBlockStore {
    async fn has_in_pool(&self, pool: &str, hex: &str, now: u64) -> Result<bool, Error> {
        validate_pool_id(pool)?;
        let mut inner = self.inner.write().await;
        let found = inner.blocks.contains_key(&(pool.to_owned(), hex.to_owned()));
        if let Some(stats) = inner.pool_stats.get_mut(pool) {
            stats.last_accessed_at = now;
        }
        Ok(found)
    }

    async fn get_from_pool(&self, pool: &str, hex: &str) -> Result<Vec<u8>, Error> {
        validate_pool_id(pool)?;
        let inner = self.inner.read().await;
        inner
            .blocks
            .get(&(pool.to_owned(), hex.to_owned()))
            .cloned()
            .ok_or_else(|| Error::KeyNotFound {
                pool: pool.to_owned(),
                hex: hex.to_owned(),
            })
    }

    async fn put_in_pool(&self, pool: &str, data: Vec<u8>, now: u64) -> Result<String, Error> {
        validate_pool_id(pool)?;
        let checksum = Checksum::compute(&data);
        let hex = checksum.to_hex();
        let key = (pool.to_owned(), hex.clone());
        let len = data.len() as u64;

        let mut inner = self.inner.write().await;
        let first_insertion = !inner.blocks.contains_key(&key);

        if first_insertion {
            inner.blocks.insert(key, data);

            let stats = inner
                .pool_stats
                .entry(pool.to_owned())
                .or_insert_with(|| PoolStats {
                    pool_id: pool.to_owned(),
                    block_count: 0,
                    total_bytes: 0,
                    created_at: now,
                    last_accessed_at: now,
                });
            stats.block_count += 1;
            stats.total_bytes += len;
            stats.last_accessed_at = now;

            trace!(pool, hex = %hex, "inserted new block into pool");
        }

        inner
            .metadata
            .entry(hex.clone())
            .and_modify(|record| record.pool_id = pool.to_owned())
            .or_insert_with(|| BlockMetadataRecord::new(hex.clone(), len, pool.to_owned(), now));

        Ok(hex)
    }

    async fn delete_from_pool(&self, pool: &str, hex: &str) -> Result<(), Error> {
        validate_pool_id(pool)?;
        let mut inner = self.inner.write().await;
        let key = (pool.to_owned(), hex.to_owned());
        if let Some(data) = inner.blocks.remove(&key) {
            if let Some(stats) = inner.pool_stats.get_mut(pool) {
                stats.block_count = stats.block_count.saturating_sub(1);
                stats.total_bytes = stats.total_bytes.saturating_sub(data.len() as u64);
            }
            debug!(pool, hex, "deleted block from pool");
        }
        Ok(())
    }

    async fn list_pools(&self) -> Result<Vec<String>, Error> {
        let inner = self.inner.read().await;
        let mut pools: Vec<String> = inner
            .pool_stats
            .values()
            .filter(|s| s.block_count > 0)
            .map(|s| s.pool_id.clone())
            .collect();
        pools.sort();
        Ok(pools)
    }

    fn list_blocks_in_pool(
        &self,
        pool: &str,
        limit: Option<usize>,
        cursor: Option<String>,
    ) -> Pin<Box<dyn Stream<Item = Result<String, Error>> + Send + '_>> {
        let pool = pool.to_owned();
        Box::pin(try_stream! {
            validate_pool_id(&pool)?;
            let hexes: Vec<String> = {
                let inner = self.inner.read().await;
                inner
                    .blocks
                    .range((pool.clone(), String::new())..)
                    .take_while(|((p, _), _)| *p == pool)
                    .map(|((_, h), _)| h.clone())
                    .collect()
            };

            let start = match &cursor {
                Some(c) => hexes.iter().position(|h| h == c).map(|i| i + 1).unwrap_or(0),
                None => 0,
            };

            let mut yielded = 0usize;
            for hex in hexes.into_iter().skip(start) {
                if let Some(limit) = limit {
                    if yielded >= limit {
                        break;
                    }
                }
                yielded += 1;
                yield hex;
            }
        })
    }

    async fn get_pool_stats(&self, pool: &str) -> Result<PoolStats, Error> {
        validate_pool_id(pool)?;
        let inner = self.inner.read().await;
        inner
            .pool_stats
            .get(pool)
            .cloned()
            .ok_or_else(|| Error::PoolNotFound(pool.to_owned()))
    }

    async fn validate_pool_deletion(&self, pool: &str) -> Result<DependencyAnalysis, Error> {
        validate_pool_id(pool)?;
        let inner = self.inner.read().await;

        let target_hexes: std::collections::HashSet<&str> = inner
            .blocks
            .keys()
            .filter(|(p, _)| p == pool)
            .map(|(_, h)| h.as_str())
            .collect();

        if target_hexes.is_empty() {
            return Ok(DependencyAnalysis {
                safe: true,
                dependent_pools: Vec::new(),
                referenced_blocks: Vec::new(),
            });
        }

        let mut dependent_pools: Vec<String> = Vec::new();
        let mut referenced_blocks: Vec<String> = Vec::new();

        for ((other_pool, _hex), data) in inner.blocks.iter() {
            if other_pool == pool {
                continue;
            }
            if data.first().copied() != Some(MAGIC_PREFIX) {
                continue;
            }
            let Some(&structured_type_byte) = data.get(1) else {
                continue;
            };
            if StructuredType::from_byte(structured_type_byte).is_err() {
                continue;
            }
            if is_encrypted(data) {
                continue;
            }

            // SuperCBL's sub-CBL checksum list uses the same packed address
            // format as a plain CBL's block list, so one decode covers both.
            let Ok(record) = CblRecord::decode(data) else {
                continue;
            };

            for address in &record.addresses {
                let hex = address.to_hex();
                if target_hexes.contains(hex.as_str()) {
                    if !dependent_pools.contains(other_pool) {
                        dependent_pools.push(other_pool.clone());
                    }
                    if !referenced_blocks.contains(&hex) {
                        referenced_blocks.push(hex);
                    }
                }
            }
        }

        dependent_pools.sort();
        referenced_blocks.sort();

        Ok(DependencyAnalysis {
            safe: dependent_pools.is_empty(),
            dependent_pools,
            referenced_blocks,
        })
    }

    async fn delete_pool(&self, pool: &str) -> Result<(), Error> {
        validate_pool_id(pool)?;
        let analysis = self.validate_pool_deletion(pool).await?;
        if !analysis.safe {
            warn!(pool, dependents = ?analysis.dependent_pools, "refusing pool deletion, dependents found");
            return Err(Error::PoolDeletion {
                pool: pool.to_owned(),
                dependent_pools: analysis.dependent_pools,
                referenced_blocks: analysis.referenced_blocks,
            });
        }
        self.force_delete_pool_inner(pool).await;
        debug!(pool, "deleted pool");
        Ok(())
    }

    async fn force_delete_pool(&self, pool: &str) -> Result<(), Error> {
        validate_pool_id(pool)?;
        self.force_delete_pool_inner(pool).await;
        debug!(pool, "force-deleted pool");
        Ok(())
    }

    async fn get_random_blocks_from_pool(&self, pool: &str, n: usize) -> Result<Vec<Checksum>, Error> {
        validate_pool_id(pool)?;
        let inner = self.inner.read().await;
        let mut hexes: Vec<&str> = inner
            .blocks
            .keys()
            .filter(|(p, _)| p == pool)
            .map(|(_, h)| h.as_str())
            .collect();

        let mut rng = rand::thread_rng();
        hexes.shuffle(&mut rng);

        hexes
            .into_iter()
            .take(n)
            .map(Checksum::from_hex)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::PoolNotFound(pool.to_owned()))
    }

    async fn bootstrap_pool(
        &self,
        pool: &str,
        size: BlockSize,
        n: usize,
        randomizer: &(dyn RandomizerSource + Sync),
        now: u64,
    ) -> Result<(), Error> {
        validate_pool_id(pool)?;
        for _ in 0..n {
            let data = randomizer.generate(size.bytes() as usize);
            self.put_in_pool(pool, data, now).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offs_codec::{make_cbl_header, StructuredType as St};

    fn store() -> InMemoryPooledBlockStore {
        InMemoryPooledBlockStore::new()
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let s = store();
        let data = vec![1, 2, 3, 4];
        let hex = s.put_in_pool("A", data.clone(), 0).await.unwrap();
        let got = s.get_from_pool("A", &hex).await.unwrap();
        assert_eq!(got, data);
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let s = store();
        let data = vec![9u8; 8];
        let hex1 = s.put_in_pool("A", data.clone(), 0).await.unwrap();
        let hex2 = s.put_in_pool("A", data, 0).await.unwrap();
        assert_eq!(hex1, hex2);
        assert_eq!(s.get_pool_stats("A").await.unwrap().block_count, 1);
    }

    #[tokio::test]
    async fn pools_are_isolated() {
        let s = store();
        let data = vec![1, 2, 3, 4];
        let hex = s.put_in_pool("A", data, 0).await.unwrap();
        assert!(s.has_in_pool("A", &hex, 0).await.unwrap());
        assert!(!s.has_in_pool("B", &hex, 0).await.unwrap());

        s.delete_from_pool("A", &hex).await.unwrap();
        assert!(!s.has_in_pool("A", &hex, 0).await.unwrap());
        assert!(!s.has_in_pool("B", &hex, 0).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let s = store();
        let hex = s.put_in_pool("A", vec![1], 0).await.unwrap();
        s.delete_from_pool("A", &hex).await.unwrap();
        s.delete_from_pool("A", &hex).await.unwrap();
        assert!(!s.has_in_pool("A", &hex, 0).await.unwrap());
    }

    #[tokio::test]
    async fn list_pools_only_reports_nonempty_pools() {
        let s = store();
        let hex = s.put_in_pool("A", vec![1], 0).await.unwrap();
        assert_eq!(s.list_pools().await.unwrap(), vec!["A".to_owned()]);
        s.delete_from_pool("A", &hex).await.unwrap();
        assert!(s.list_pools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn pagination_visits_everything_once() {
        use futures_util::StreamExt;

        let s = store();
        let mut hexes = Vec::new();
        for i in 0..7u8 {
            hexes.push(s.put_in_pool("P", vec![i; 4], 0).await.unwrap());
        }
        hexes.sort();

        let mut visited = Vec::new();
        let mut cursor = None;
        loop {
            let mut stream = s.list_blocks_in_pool("P", Some(3), cursor.clone());
            let mut page = Vec::new();
            while let Some(item) = stream.next().await {
                page.push(item.unwrap());
            }
            if page.is_empty() {
                break;
            }
            cursor = page.last().cloned();
            visited.extend(page);
        }

        assert_eq!(visited, hexes);
    }

    #[tokio::test]
    async fn pool_stats_consistency() {
        let s = store();
        s.put_in_pool("P", vec![1, 2], 0).await.unwrap();
        s.put_in_pool("P", vec![3, 4, 5], 0).await.unwrap();
        let stats = s.get_pool_stats("P").await.unwrap();
        assert_eq!(stats.block_count, 2);
        assert_eq!(stats.total_bytes, 5);
    }

    #[tokio::test]
    async fn guarded_deletion_blocks_when_referenced() {
        let s = store();
        let h1 = s.put_in_pool("A", vec![1u8; 16], 0).await.unwrap();
        let h2 = s.put_in_pool("A", vec![2u8; 16], 0).await.unwrap();
        let h3 = s.put_in_pool("A", vec![3u8; 16], 0).await.unwrap();

        let addresses = vec![
            Checksum::from_hex(&h1).unwrap(),
            Checksum::from_hex(&h2).unwrap(),
            Checksum::from_hex(&h3).unwrap(),
        ];
        let mut cbl = make_cbl_header(
            [0u8; offs_codec::CREATOR_ID_BYTES],
            0,
            3,
            3,
            1,
            Checksum::compute(b"x"),
            St::Cbl,
            None,
        )
        .unwrap();
        for address in &addresses {
            cbl.extend_from_slice(address.as_bytes());
        }
        s.put_in_pool("B", cbl, 0).await.unwrap();

        let err = s.delete_pool("A").await.unwrap_err();
        match err {
            Error::PoolDeletion {
                dependent_pools,
                referenced_blocks,
                ..
            } => {
                assert_eq!(dependent_pools, vec!["B".to_owned()]);
                assert!(referenced_blocks.contains(&h1));
                assert!(referenced_blocks.contains(&h2));
                assert!(referenced_blocks.contains(&h3));
            }
            other => panic!("expected PoolDeletion, got {other:?}"),
        }
        assert!(s.has_in_pool("A", &h1, 0).await.unwrap());
    }

    #[tokio::test]
    async fn force_deletion_bypasses_the_guard() {
        let s = store();
        let h1 = s.put_in_pool("A", vec![1u8; 16], 0).await.unwrap();
        s.force_delete_pool("A").await.unwrap();
        assert!(!s.has_in_pool("A", &h1, 0).await.unwrap());
        assert!(s.list_pools().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_pool_id_tracks_latest_store() {
        let s = store();
        let data = vec![4u8; 16];
        let hex_a = s.put_in_pool("A", data.clone(), 0).await.unwrap();
        let hex_b = s.put_in_pool("B", data, 1).await.unwrap();
        assert_eq!(hex_a, hex_b);

        let inner = s.inner.read().await;
        assert_eq!(inner.metadata.get(&hex_a).unwrap().pool_id, "B");
    }
}
