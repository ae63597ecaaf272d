use std::path::PathBuf;
use std::sync::Arc;

use offs_crypto::{OsRandomizer, RandomizerSource};

use crate::block::BlockSize;

/// Explicit construction parameters for a store, threaded through ingest
/// and reconstruct rather than read from ambient global state (§9, §10.3).
#[derive(Clone)]
pub struct StoreConfig {
    pub block_size: BlockSize,
    pub store_path: PathBuf,
    pub offs_cache_fraction: f64,
    pub tuple_size: u8,
    pub randomizer: Arc<dyn RandomizerSource>,
}

impl StoreConfig {
    pub fn new(block_size: BlockSize, store_path: impl Into<PathBuf>) -> Self {
        Self {
            block_size,
            store_path: store_path.into(),
            offs_cache_fraction: 0.5,
            tuple_size: 3,
            randomizer: Arc::new(OsRandomizer),
        }
    }

    pub fn with_cache_fraction(mut self, fraction: f64) -> Self {
        assert!((0.0..=1.0).contains(&fraction), "cache fraction must be in 0.0..=1.0");
        self.offs_cache_fraction = fraction;
        self
    }

    pub fn with_tuple_size(mut self, tuple_size: u8) -> Self {
        assert!(tuple_size > 0, "tuple size must be positive");
        self.tuple_size = tuple_size;
        self
    }

    pub fn with_randomizer(mut self, randomizer: Arc<dyn RandomizerSource>) -> Self {
        self.randomizer = randomizer;
        self
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("block_size", &self.block_size)
            .field("store_path", &self.store_path)
            .field("offs_cache_fraction", &self.offs_cache_fraction)
            .field("tuple_size", &self.tuple_size)
            .finish_non_exhaustive()
    }
}
