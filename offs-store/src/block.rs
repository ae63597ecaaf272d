use offs_crypto::Checksum;
use thiserror::Error;

/// The canonical block sizes the store recognizes (§3). `Unknown` carries
/// whatever size a caller actually used, so round-tripping a block never
/// loses its real length even if it doesn't land on a named tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockSize {
    Message,
    Tiny,
    Small,
    Medium,
    Large,
    Huge,
    Unknown(u32),
}

impl BlockSize {
    pub const MESSAGE_BYTES: u32 = 512;
    pub const TINY_BYTES: u32 = 1024;
    pub const SMALL_BYTES: u32 = 4096;
    pub const MEDIUM_BYTES: u32 = 1 << 16;
    pub const LARGE_BYTES: u32 = 1 << 20;
    pub const HUGE_BYTES: u32 = 1 << 24;

    pub fn bytes(self) -> u32 {
        match self {
            BlockSize::Message => Self::MESSAGE_BYTES,
            BlockSize::Tiny => Self::TINY_BYTES,
            BlockSize::Small => Self::SMALL_BYTES,
            BlockSize::Medium => Self::MEDIUM_BYTES,
            BlockSize::Large => Self::LARGE_BYTES,
            BlockSize::Huge => Self::HUGE_BYTES,
            BlockSize::Unknown(n) => n,
        }
    }

    /// The smallest canonical size tier that can hold `len` bytes, per
    /// `processFileInChunks`'s `nextSizeAbove` (§4.6). Fails once `len`
    /// would require `Huge` or more.
    pub fn next_size_above(len: u64) -> Result<Self, BlockValidationError> {
        for tier in [
            BlockSize::Message,
            BlockSize::Tiny,
            BlockSize::Small,
            BlockSize::Medium,
            BlockSize::Large,
        ] {
            if len <= tier.bytes() as u64 {
                return Ok(tier);
            }
        }
        Err(BlockValidationError::CannotDetermineBlockSize { len })
    }

    /// The zero-padded 8-hex-digit directory tag used by the disk backend
    /// (§4.4).
    pub fn size_tag(self) -> String {
        format!("{:08x}", self.bytes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    RawData,
    EphemeralOwnedData,
    Cbl,
    ExtendedCbl,
    EncryptedSingle,
    EncryptedMulti,
    MessageCbl,
    SuperCbl,
    VaultCbl,
    Handle,
}

impl BlockType {
    pub fn is_cbl_like(self) -> bool {
        matches!(
            self,
            BlockType::Cbl
                | BlockType::ExtendedCbl
                | BlockType::MessageCbl
                | BlockType::SuperCbl
                | BlockType::VaultCbl
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Raw,
    EphemeralStructured,
    PublicMemberData,
    EncryptedData,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockValidationError {
    #[error("block data cannot be empty")]
    DataCannotBeEmpty,

    #[error("block data length {got} exceeds capacity {capacity}")]
    DataLengthExceedsCapacity { got: usize, capacity: u32 },

    #[error("block data length {got} does not match declared size {declared}")]
    SizeMismatch { got: usize, declared: u32 },

    #[error("CBL block does not start with the magic prefix or fails to parse as a header")]
    MalformedCbl,

    #[error("no block size tier fits a payload of {len} bytes")]
    CannotDetermineBlockSize { len: u64 },
}

/// An immutable, content-addressed byte buffer (§3/§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    size: BlockSize,
    block_type: BlockType,
    data_type: DataType,
    data: Vec<u8>,
    checksum: Checksum,
    created: u64,
}

impl Block {
    /// Builds a block, computing its checksum once. `created` is millis
    /// since the epoch.
    pub fn new(
        size: BlockSize,
        block_type: BlockType,
        data_type: DataType,
        data: Vec<u8>,
        created: u64,
    ) -> Result<Self, BlockValidationError> {
        if data.is_empty() {
            return Err(BlockValidationError::DataCannotBeEmpty);
        }
        if data.len() as u64 > size.bytes() as u64 {
            return Err(BlockValidationError::DataLengthExceedsCapacity {
                got: data.len(),
                capacity: size.bytes(),
            });
        }
        if data.len() as u32 != size.bytes() {
            return Err(BlockValidationError::SizeMismatch {
                got: data.len(),
                declared: size.bytes(),
            });
        }
        if block_type.is_cbl_like() && offs_codec::parse_header(&data).is_err() {
            return Err(BlockValidationError::MalformedCbl);
        }

        let checksum = Checksum::compute(&data);
        Ok(Self {
            size,
            block_type,
            data_type,
            data,
            checksum,
            created,
        })
    }

    /// Recomputes the checksum over `data` and compares it to the one
    /// computed at construction time.
    pub fn validate(&self) -> bool {
        Checksum::compute(&self.data) == self.checksum
    }

    pub fn size(&self) -> BlockSize {
        self.size
    }

    pub fn block_type(&self) -> BlockType {
        self.block_type
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn checksum(&self) -> Checksum {
        self.checksum
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
