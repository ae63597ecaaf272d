//! Content-addressed, namespaced block storage: the in-memory pooled store,
//! its on-disk realization, the legacy single-pool façade, and the whitener
//! sourcer that feeds the XOR engine.

mod block;
mod config;
mod disk;
mod error;
mod legacy;
mod lifecycle;
mod pool;
mod whitener;

pub use block::{Block, BlockSize, BlockType, BlockValidationError, DataType};
pub use config::StoreConfig;
pub use disk::DiskBlockStore;
pub use error::Error;
pub use legacy::LegacyBlockStore;
pub use lifecycle::PoolLifecycleState;
pub use pool::{
    validate_pool_id, BlockMetadataRecord, DependencyAnalysis, InMemoryPooledBlockStore,
    PoolStats, PooledBlockStore, ReplicationStatus, DEFAULT_POOL,
};
pub use whitener::{Whitener, WhitenerSourcer};
