use thiserror::Error;

/// The closed error taxonomy surfaced by the block store (§6/§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("pool id {0:?} does not match the pool id grammar")]
    InvalidPoolId(String),

    #[error("no block for pool {pool:?}, checksum {hex}")]
    KeyNotFound { pool: String, hex: String },

    #[error("pool {0:?} has never held blocks")]
    PoolNotFound(String),

    #[error("deleting pool {pool:?} would orphan blocks referenced from {dependent_pools:?}")]
    PoolDeletion {
        pool: String,
        dependent_pools: Vec<String>,
        referenced_blocks: Vec<String>,
    },

    #[error("block data does not match store size {store_size}: got {got}")]
    BlockSizeMismatch { store_size: u32, got: u32 },

    #[error("block path already exists for checksum {0}")]
    BlockPathAlreadyExists(String),

    #[error("on-disk block file size mismatch for checksum {hex}: expected {expected}, found {found}")]
    BlockFileSizeMismatch {
        hex: String,
        expected: u32,
        found: u64,
    },

    #[error("block validation failed: {0}")]
    BlockValidationFailed(#[from] crate::block::BlockValidationError),

    #[error("failed to create block directory tree at {path}: {source}")]
    BlockDirectoryCreationFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to delete block {hex}: {source}")]
    BlockDeletionFailed {
        hex: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no blocks provided to XOR")]
    NoBlocksProvided,

    #[error("store used before initialization")]
    Uninitialized,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
