use std::pin::Pin;

use futures_core::Stream;
use offs_codec::CREATOR_ID_BYTES;
use offs_engine::{EciesDecryptor, EciesEncryptor, IngestOptions, SignatureVerifier, Source};
use offs_store::{
    BlockSize, DependencyAnalysis, InMemoryPooledBlockStore, PoolStats, PooledBlockStore, StoreConfig,
};

use crate::error::Error;

/// The facade's handle onto a running OFFS core (§6): one configured pooled
/// store plus the engine pipelines that sit on top of it. Generic over the
/// store implementation so callers can substitute a disk-backed store
/// without touching call sites; defaults to the in-memory pool.
pub struct Core<S: PooledBlockStore = InMemoryPooledBlockStore> {
    store: S,
    config: StoreConfig,
}

impl Core<InMemoryPooledBlockStore> {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            store: InMemoryPooledBlockStore::new(),
            config,
        }
    }
}

impl<S: PooledBlockStore> Core<S> {
    pub fn with_store(store: S, config: StoreConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// `IngestFile` (§4.8/§6).
    #[allow(clippy::too_many_arguments)]
    pub async fn ingest_file(
        &self,
        pool: &str,
        source: &Source,
        options: IngestOptions,
        encryptor: Option<&dyn EciesEncryptor>,
        now: u64,
    ) -> Result<Vec<u8>, Error> {
        let cbl = offs_engine::ingest_file(
            &self.store,
            pool,
            source,
            options,
            self.config.randomizer.clone(),
            self.config.offs_cache_fraction,
            self.config.tuple_size,
            encryptor,
            now,
        )
        .await?;
        Ok(cbl)
    }

    /// `ReconstructFile` (§4.9/§6).
    pub async fn reconstruct_file(&self, pool: &str, cbl_bytes: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(offs_engine::reconstruct_file(&self.store, pool, cbl_bytes).await?)
    }

    /// Same as [`Core::reconstruct_file`] but plumbs through the encryption
    /// and signature-verification collaborators for an encrypted or signed
    /// CBL.
    pub async fn reconstruct_file_with(
        &self,
        pool: &str,
        cbl_bytes: &[u8],
        decryptor: Option<&dyn EciesDecryptor>,
        verifier: Option<&dyn SignatureVerifier>,
    ) -> Result<Vec<u8>, Error> {
        Ok(offs_engine::reconstruct_file_with(&self.store, pool, cbl_bytes, decryptor, verifier).await?)
    }

    /// `CreateCBL` (§4.7/§6): assembles a CBL directly from already-stored,
    /// same-size blocks.
    #[allow(clippy::too_many_arguments)]
    pub fn create_cbl(
        &self,
        blocks: &[offs_store::Block],
        creator: [u8; CREATOR_ID_BYTES],
        original_data_length: u64,
        original_data_checksum: offs_crypto::Checksum,
        structured_type: offs_codec::StructuredType,
        extended: Option<offs_codec::ExtendedHeader>,
    ) -> Result<Vec<u8>, Error> {
        Ok(offs_engine::create_cbl(
            blocks,
            creator,
            self.config.tuple_size,
            original_data_length,
            original_data_checksum,
            None,
            structured_type,
            extended,
        )?)
    }

    pub fn block_size(&self) -> BlockSize {
        self.config.block_size
    }

    // --- PoolOps (§6) ---

    pub async fn list_pools(&self) -> Result<Vec<String>, Error> {
        Ok(self.store.list_pools().await?)
    }

    pub fn list_blocks_in_pool(
        &self,
        pool: &str,
        limit: Option<usize>,
        cursor: Option<String>,
    ) -> Pin<Box<dyn Stream<Item = Result<String, offs_store::Error>> + Send + '_>> {
        self.store.list_blocks_in_pool(pool, limit, cursor)
    }

    pub async fn get_pool_stats(&self, pool: &str) -> Result<PoolStats, Error> {
        Ok(self.store.get_pool_stats(pool).await?)
    }

    pub async fn validate_pool_deletion(&self, pool: &str) -> Result<DependencyAnalysis, Error> {
        Ok(self.store.validate_pool_deletion(pool).await?)
    }

    pub async fn delete_pool(&self, pool: &str) -> Result<(), Error> {
        Ok(self.store.delete_pool(pool).await?)
    }

    pub async fn force_delete_pool(&self, pool: &str) -> Result<(), Error> {
        Ok(self.store.force_delete_pool(pool).await?)
    }

    pub async fn bootstrap_pool(&self, pool: &str, count: usize, now: u64) -> Result<(), Error> {
        self.store
            .bootstrap_pool(pool, self.config.block_size, count, self.config.randomizer.as_ref(), now)
            .await?;
        Ok(())
    }
}
