use thiserror::Error;

/// Composed error surface for the facade (§6): every subsystem's error
/// taxonomy folds into this one without losing its variant.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] offs_store::Error),

    #[error(transparent)]
    Engine(#[from] offs_engine::Error),

    #[error("malformed CBL: {0}")]
    Cbl(#[from] offs_codec::HeaderError),

    #[error("malformed magnet link: {0}")]
    Magnet(#[from] offs_codec::MagnetError),
}
