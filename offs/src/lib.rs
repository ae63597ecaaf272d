//! Public facade over the OFFS core: configure a store, ingest files into
//! CBLs, reconstruct them, and administer pools — without reaching into
//! the subsystem crates directly.

mod core;
mod error;

pub use crate::core::Core;
pub use error::Error;

pub use offs_codec::{
    is_encrypted, is_super_cbl, make_cbl_header, parse_header, CblExtendedHeader, CblHeader, CblRecord, ExtendedHeader,
    HeaderError, Magnet, MagnetError, StructuredType, ADDRESS_BYTES, CREATOR_ID_BYTES, HEADER_VERSION,
};
pub use offs_crypto::{Checksum, ChecksumError, OsRandomizer, RandomizerSource, CHECKSUM_BYTES};
pub use offs_engine::{
    create_cbl, process_file_in_chunks, reconstruct_file, reconstruct_file_with, xor_block_with_whiteners,
    xor_blocks_with_whiteners_round_robin, EciesDecryptor, EciesEncryptor, IngestOptions, SignatureSigner,
    SignatureVerifier, Source,
};
pub use offs_store::{
    validate_pool_id, Block, BlockSize, BlockType, BlockValidationError, DataType, DependencyAnalysis,
    InMemoryPooledBlockStore, LegacyBlockStore, PoolLifecycleState, PoolStats, PooledBlockStore, ReplicationStatus,
    StoreConfig, DEFAULT_POOL,
};
