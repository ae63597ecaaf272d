use thiserror::Error;

/// The closed error taxonomy surfaced by the OFFS engine and its pipelines
/// (§6/§7).
#[derive(Debug, Error)]
pub enum Error {
    #[error("no whiteners provided to XOR against a payload")]
    NoWhitenersProvided,

    #[error("could not determine the source's length")]
    CannotDetermineLength,

    #[error("no block size tier fits a payload this large")]
    CannotDetermineBlockSize,

    #[error("cannot build a CBL from an empty block list")]
    EmptyBlocksArray,

    #[error("blocks passed to CreateCBL are not all the same size")]
    BlockSizeMismatch,

    #[error("a recipient is required when encrypt=true")]
    RecipientRequiredForEncryption,

    #[error("could not determine the file's mime type for an extended CBL")]
    CannotDetermineMimeType,

    #[error("could not determine the file's name for an extended CBL")]
    CannotDetermineFileName,

    #[error("integrity check failed: expected {expected}, found {actual}")]
    IntegrityViolation { expected: String, actual: String },

    #[error("CBL payload is malformed: {0}")]
    MalformedCbl(#[from] offs_codec::HeaderError),

    #[error(transparent)]
    Store(#[from] offs_store::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
